//! Job progress and stage execution-state model.
//!
//! A job's transition log (Scheduled → Assigned → Preparing → Building →
//! Completing → Completed) is turned into a per-phase [`JobDuration`], then
//! into a segmented progress bar and tooltip. A stage's jobs are aggregated
//! into building/passed/failed counts that gate the rerun actions.
//!
//! Everything in [`state_machine`], [`duration`], [`progress`], [`stage`]
//! and [`agent`] is pure and infallible; errors only arise while reading
//! payloads or configuration.

pub mod agent;
pub mod cli;
pub mod config;
pub mod duration;
pub mod error;
pub mod overview;
pub mod payload;
pub mod progress;
pub mod stage;
pub mod state_machine;
pub mod ui;

pub use agent::{AgentInfo, AgentLabel, AgentRegistry, AgentResolver};
pub use duration::{JobDuration, JobDurationCalculator, PhaseStatus};
pub use error::ProgressError;
pub use overview::{OverviewOptions, StageOverview};
pub use progress::{HoverState, JobProgressPresenter, ProgressSegments, Segment, Tooltip};
pub use stage::{JobFilter, RerunActions, Stage, StageJobAggregator, StageSummary};
pub use state_machine::{Job, JobResult, JobState, JobStateTransition, Phase, TransitionLog};
