use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The six states a job moves through, in the order they are recorded.
///
/// Scheduled → Assigned → Preparing → Building → Completing → Completed
///
/// The derived ordering follows that sequence, so `a < b` means `a` happens
/// before `b` in a job's life. Forward skips are legal; moving backward is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JobState {
    Scheduled,
    Assigned,
    Preparing,
    Building,
    Completing,
    Completed,
}

impl JobState {
    pub const ALL: [JobState; 6] = [
        JobState::Scheduled,
        JobState::Assigned,
        JobState::Preparing,
        JobState::Building,
        JobState::Completing,
        JobState::Completed,
    ];

    /// `Completed` is the only terminal state.
    pub fn is_terminal(self) -> bool {
        self == JobState::Completed
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Scheduled => write!(f, "Scheduled"),
            JobState::Assigned => write!(f, "Assigned"),
            JobState::Preparing => write!(f, "Preparing"),
            JobState::Building => write!(f, "Building"),
            JobState::Completing => write!(f, "Completing"),
            JobState::Completed => write!(f, "Completed"),
        }
    }
}

/// Returned when a wire string names no known state or result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognised value: {}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for JobState {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobState::ALL
            .into_iter()
            .find(|state| state.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Outcome of a job. Only meaningful once the job is `Completed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobResult {
    #[default]
    Unknown,
    Passed,
    Failed,
    Cancelled,
}

impl fmt::Display for JobResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobResult::Unknown => write!(f, "Unknown"),
            JobResult::Passed => write!(f, "Passed"),
            JobResult::Failed => write!(f, "Failed"),
            JobResult::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for JobResult {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            JobResult::Unknown,
            JobResult::Passed,
            JobResult::Failed,
            JobResult::Cancelled,
        ]
        .into_iter()
        .find(|result| result.to_string().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// A contiguous interval between two adjacent job-state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    Waiting,
    Preparing,
    Building,
    UploadingArtifacts,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Waiting,
        Phase::Preparing,
        Phase::Building,
        Phase::UploadingArtifacts,
    ];

    /// The transition that opens this phase.
    pub fn start_state(self) -> JobState {
        match self {
            Phase::Waiting => JobState::Scheduled,
            Phase::Preparing => JobState::Preparing,
            Phase::Building => JobState::Building,
            Phase::UploadingArtifacts => JobState::Completing,
        }
    }

    /// The transition that closes this phase.
    pub fn end_state(self) -> JobState {
        match self {
            Phase::Waiting => JobState::Assigned,
            Phase::Preparing => JobState::Building,
            Phase::Building => JobState::Completing,
            Phase::UploadingArtifacts => JobState::Completed,
        }
    }

    /// Human label used in the tooltip.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Waiting => "Waiting for an Agent",
            Phase::Preparing => "Checking out Materials",
            Phase::Building => "Building Job",
            Phase::UploadingArtifacts => "Uploading Artifacts",
        }
    }

    /// Style class of the bar segment.
    pub fn css_class(self) -> &'static str {
        match self {
            Phase::Waiting => "waiting",
            Phase::Preparing => "preparing",
            Phase::Building => "building",
            Phase::UploadingArtifacts => "uploading-artifacts",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
