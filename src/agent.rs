//! Resolution of a job's agent UUID to something displayable.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// What the agent registry knows about an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub uuid: String,
    pub hostname: String,
}

/// Looks agents up by UUID. Implemented by whatever registry the caller has.
pub trait AgentResolver {
    fn resolve(&self, uuid: &str) -> Option<AgentInfo>;
}

/// In-memory registry keyed by UUID.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: HashMap<String, AgentInfo>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, agent: AgentInfo) {
        self.agents.insert(agent.uuid.clone(), agent);
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl FromIterator<AgentInfo> for AgentRegistry {
    fn from_iter<I: IntoIterator<Item = AgentInfo>>(iter: I) -> Self {
        let mut registry = Self::new();
        for agent in iter {
            registry.insert(agent);
        }
        registry
    }
}

impl AgentResolver for AgentRegistry {
    fn resolve(&self, uuid: &str) -> Option<AgentInfo> {
        self.agents.get(uuid).cloned()
    }
}

/// Display label for a job's agent column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentLabel {
    /// The job has no agent yet.
    Unassigned,
    /// The job names an agent the registry does not know.
    Unresolved { uuid: String },
    Resolved(AgentInfo),
}

impl AgentLabel {
    pub fn for_job(agent_uuid: Option<&str>, resolver: &impl AgentResolver) -> Self {
        match agent_uuid {
            None => AgentLabel::Unassigned,
            Some(uuid) => match resolver.resolve(uuid) {
                Some(info) => AgentLabel::Resolved(info),
                None => AgentLabel::Unresolved {
                    uuid: uuid.to_string(),
                },
            },
        }
    }

    /// Link to the agent's job run history. Only resolved agents link anywhere.
    pub fn href(&self, route_prefix: &str) -> Option<String> {
        match self {
            AgentLabel::Resolved(info) => Some(format!(
                "{}/{}/job_run_history",
                route_prefix.trim_end_matches('/'),
                info.uuid
            )),
            _ => None,
        }
    }
}

impl fmt::Display for AgentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentLabel::Unassigned => write!(f, "unassigned"),
            AgentLabel::Unresolved { uuid } => write!(f, "{uuid}"),
            AgentLabel::Resolved(info) => write!(f, "{}", info.hostname),
        }
    }
}
