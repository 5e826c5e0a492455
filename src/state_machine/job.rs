use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{JobResult, JobState};

/// A single recorded state change. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStateTransition {
    /// The state entered.
    pub state: JobState,
    /// When it was entered.
    pub timestamp: DateTime<Utc>,
}

impl JobStateTransition {
    pub fn new(state: JobState, timestamp: DateTime<Utc>) -> Self {
        Self { state, timestamp }
    }
}

/// Append-only log of a job's transitions, in the order they were recorded.
///
/// Lookups are keyed by [`JobState`] rather than by position, so a skipped
/// or reordered state never shifts the meaning of the others. If a state was
/// recorded more than once, its first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionLog {
    entries: Vec<JobStateTransition>,
}

impl TransitionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a transition at the end of the log.
    pub fn push(&mut self, transition: JobStateTransition) {
        self.entries.push(transition);
    }

    /// All transitions, in recorded order.
    pub fn entries(&self) -> &[JobStateTransition] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// When `state` was entered, if it was recorded at all.
    pub fn timestamp(&self, state: JobState) -> Option<DateTime<Utc>> {
        self.entries
            .iter()
            .find(|t| t.state == state)
            .map(|t| t.timestamp)
    }

    /// Whether `state` was ever recorded.
    pub fn contains(&self, state: JobState) -> bool {
        self.timestamp(state).is_some()
    }

    /// The furthest state reached, by lifecycle order rather than log order.
    pub fn furthest_state(&self) -> Option<JobState> {
        self.entries.iter().map(|t| t.state).max()
    }

    /// The transition that entered the furthest state.
    pub fn furthest(&self) -> Option<JobStateTransition> {
        let state = self.furthest_state()?;
        self.entries.iter().find(|t| t.state == state).copied()
    }

    /// The earliest recorded timestamp, regardless of state.
    pub fn earliest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.entries.iter().map(|t| t.timestamp).min()
    }
}

impl FromIterator<JobStateTransition> for TransitionLog {
    fn from_iter<I: IntoIterator<Item = JobStateTransition>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A job within a stage run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Job name, unique within its stage.
    pub name: String,
    /// Furthest state the job has reached.
    pub state: JobState,
    /// Outcome; `Unknown` until the job completes.
    pub result: JobResult,
    /// Agent the job was assigned to, if any.
    pub agent_uuid: Option<String>,
    /// Every recorded state change.
    pub transitions: TransitionLog,
    /// Whether this job was explicitly re-run within the stage.
    #[serde(default)]
    pub rerun: bool,
    /// Set when the job was copied from an earlier run of the stage.
    #[serde(default)]
    pub original_job_id: Option<i64>,
}

impl Job {
    /// Creates a job from its first `Scheduled` transition.
    pub fn scheduled(name: impl Into<String>, at: DateTime<Utc>) -> Self {
        let mut transitions = TransitionLog::new();
        transitions.push(JobStateTransition::new(JobState::Scheduled, at));
        Self {
            name: name.into(),
            state: JobState::Scheduled,
            result: JobResult::Unknown,
            agent_uuid: None,
            transitions,
            rerun: false,
            original_job_id: None,
        }
    }

    /// Appends a transition. The job's state follows the furthest state
    /// reached, so an out-of-order entry never moves it backward.
    pub fn record(&mut self, state: JobState, at: DateTime<Utc>) {
        self.transitions.push(JobStateTransition::new(state, at));
        if state > self.state {
            self.state = state;
        }
    }

    /// Builder form of [`Job::record`].
    pub fn with_transition(mut self, state: JobState, at: DateTime<Utc>) -> Self {
        self.record(state, at);
        self
    }

    /// Builder setter for the job's result.
    pub fn with_result(mut self, result: JobResult) -> Self {
        self.result = result;
        self
    }

    /// Builder setter for the assigned agent.
    pub fn with_agent(mut self, uuid: impl Into<String>) -> Self {
        self.agent_uuid = Some(uuid.into());
        self
    }

    /// Terminal once either the state or the log says `Completed`.
    pub fn is_completed(&self) -> bool {
        self.state.is_terminal() || self.transitions.contains(JobState::Completed)
    }
}
