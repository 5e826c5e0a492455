mod job;
mod state;

pub use job::{Job, JobStateTransition, TransitionLog};
pub use state::{JobResult, JobState, Phase, UnknownVariant};
