//! Wire shapes of the stage, job, and agent JSON consumed from the server
//! API, and their conversion into the progress model.
//!
//! Conversion never fails on content: an unknown state string or an
//! unrepresentable timestamp drops that transition with a warning, and an
//! unknown job state falls back to what the transition log says.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::agent::{AgentInfo, AgentRegistry};
use crate::error::ProgressError;
use crate::stage::Stage;
use crate::state_machine::{Job, JobResult, JobState, JobStateTransition, TransitionLog};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionPayload {
    pub state: String,
    /// Milliseconds since the Unix epoch.
    pub state_change_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPayload {
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub scheduled_date: Option<i64>,
    #[serde(default)]
    pub rerun: bool,
    #[serde(default)]
    pub original_job_id: Option<i64>,
    #[serde(default)]
    pub agent_uuid: Option<String>,
    #[serde(default)]
    pub job_state_transitions: Vec<TransitionPayload>,
}

/// Stage counters arrive as either numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Counter {
    Number(u64),
    Text(String),
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Counter::Number(n) => write!(f, "{n}"),
            Counter::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePayload {
    pub name: String,
    #[serde(default)]
    pub counter: Option<Counter>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub jobs: Vec<JobPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPayload {
    pub uuid: String,
    pub hostname: String,
}

impl TransitionPayload {
    fn into_transition(self, job: &str) -> Option<JobStateTransition> {
        let state = match self.state.parse::<JobState>() {
            Ok(state) => state,
            Err(err) => {
                warn!(job, %err, "skipping transition with unknown state");
                return None;
            }
        };
        let Some(timestamp) = DateTime::<Utc>::from_timestamp_millis(self.state_change_time)
        else {
            warn!(job, millis = self.state_change_time, "skipping transition with invalid time");
            return None;
        };
        Some(JobStateTransition::new(state, timestamp))
    }
}

impl JobPayload {
    /// Converts to a [`Job`], keeping whatever transitions can be read.
    pub fn into_job(self) -> Job {
        let name = self.name;
        let mut transitions: TransitionLog = self
            .job_state_transitions
            .into_iter()
            .filter_map(|t| t.into_transition(&name))
            .collect();

        if !transitions.contains(JobState::Scheduled) {
            if let Some(scheduled) = self.scheduled_date.and_then(DateTime::from_timestamp_millis) {
                debug!(job = %name, "no Scheduled transition, using scheduled_date");
                let mut entries = vec![JobStateTransition::new(JobState::Scheduled, scheduled)];
                entries.extend_from_slice(transitions.entries());
                transitions = entries.into_iter().collect();
            }
        }

        let state = match self.state.parse::<JobState>() {
            Ok(state) => state,
            Err(err) => {
                let fallback = transitions.furthest_state().unwrap_or(JobState::Scheduled);
                warn!(job = %name, %err, %fallback, "unknown job state, using transition log");
                fallback
            }
        };

        let result = match self.result.as_deref().map(str::parse::<JobResult>) {
            None => JobResult::Unknown,
            Some(Ok(result)) => result,
            Some(Err(err)) => {
                warn!(job = %name, %err, "unknown job result");
                JobResult::Unknown
            }
        };

        Job {
            name,
            state,
            result,
            agent_uuid: self.agent_uuid.filter(|uuid| !uuid.trim().is_empty()),
            transitions,
            rerun: self.rerun,
            original_job_id: self.original_job_id,
        }
    }
}

impl StagePayload {
    pub fn into_stage(self) -> Stage {
        Stage {
            name: self.name,
            counter: self.counter.map(|c| c.to_string()),
            approved_by: self.approved_by,
            result: self.result,
            jobs: self.jobs.into_iter().map(JobPayload::into_job).collect(),
        }
    }
}

/// Parses a stage document as served by the server API.
pub fn parse_stage(json: &str) -> Result<Stage, ProgressError> {
    let payload: StagePayload = serde_json::from_str(json)?;
    Ok(payload.into_stage())
}

/// Reads and parses a stage document from disk.
pub fn load_stage(path: &Path) -> Result<Stage, ProgressError> {
    let contents = std::fs::read_to_string(path)?;
    let stage = parse_stage(&contents)?;
    debug!(path = %path.display(), stage = %stage.name, jobs = stage.jobs.len(), "loaded stage");
    Ok(stage)
}

/// Parses a JSON array of `{uuid, hostname}` agents.
pub fn parse_agents(json: &str) -> Result<AgentRegistry, ProgressError> {
    let agents: Vec<AgentPayload> = serde_json::from_str(json)?;
    Ok(agents
        .into_iter()
        .map(|a| AgentInfo {
            uuid: a.uuid,
            hostname: a.hostname,
        })
        .collect())
}

pub fn load_agents(path: &Path) -> Result<AgentRegistry, ProgressError> {
    let contents = std::fs::read_to_string(path)?;
    let registry = parse_agents(&contents)?;
    debug!(path = %path.display(), agents = registry.len(), "loaded agents");
    Ok(registry)
}
