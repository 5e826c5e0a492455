//! Per-phase elapsed time derived from a job's transition log.
//!
//! Phase boundaries are looked up by state:
//!
//! - Waiting = Assigned − Scheduled
//! - Preparing = Building − Preparing
//! - Building = Completing − Building
//! - Uploading Artifacts = Completed − Completing
//!
//! A phase whose closing state (or any later state) has been recorded is
//! complete, even when it took zero seconds or its opening state was never
//! recorded. Only the first incomplete phase of an in-flight job is measured
//! against `now`; every later phase reports zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::state_machine::{Job, JobState, Phase};

/// Where a phase stands relative to the job's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseStatus {
    Completed,
    InProgress,
    NotStarted,
}

/// Time spent in each phase, in whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDuration {
    /// Scheduled until Assigned.
    pub waiting: u64,
    /// Preparing until Building.
    pub preparing: u64,
    /// Building until Completing.
    pub building: u64,
    /// Completing until Completed.
    pub uploading_artifacts: u64,
    /// Scheduled until Completed, or until `now` while the job is running.
    pub total: u64,
    /// Furthest state the job has reached.
    pub state: JobState,
    /// Status of each phase, indexed in [`Phase::ALL`] order.
    pub statuses: [PhaseStatus; 4],
    /// When the job was scheduled, if any transition was recorded.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// When the job completed. `None` while running.
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobDuration {
    /// Seconds spent in `phase`.
    pub fn phase(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Waiting => self.waiting,
            Phase::Preparing => self.preparing,
            Phase::Building => self.building,
            Phase::UploadingArtifacts => self.uploading_artifacts,
        }
    }

    /// Whether `phase` is done, running or still ahead.
    pub fn status(&self, phase: Phase) -> PhaseStatus {
        self.statuses[phase.index()]
    }

    /// True once the job reached `Completed`.
    pub fn is_completed(&self) -> bool {
        self.state.is_terminal()
    }

    /// The phase currently being measured against `now`, if any.
    pub fn active_phase(&self) -> Option<Phase> {
        Phase::ALL
            .into_iter()
            .find(|p| self.status(*p) == PhaseStatus::InProgress)
    }

    /// Sum of the four phases. Equals `total` when the log is contiguous.
    pub fn phase_sum(&self) -> u64 {
        Phase::ALL.into_iter().map(|p| self.phase(p)).sum()
    }
}

/// Computes [`JobDuration`]s. Stateless; every call is a pure function of
/// its inputs.
pub struct JobDurationCalculator;

impl JobDurationCalculator {
    /// Derives the breakdown for `job`. `now` only matters while it runs.
    pub fn compute(job: &Job, now: DateTime<Utc>) -> JobDuration {
        let log = &job.transitions;
        let completed = job.is_completed();

        let reached = match log.furthest_state() {
            Some(logged) => logged.max(job.state),
            None => job.state,
        };
        let reached = if completed { JobState::Completed } else { reached };

        let mut statuses = [PhaseStatus::NotStarted; 4];
        let mut seconds = [0u64; 4];
        let mut active_found = false;

        for phase in Phase::ALL {
            let idx = phase.index();
            if reached >= phase.end_state() {
                statuses[idx] = PhaseStatus::Completed;
                seconds[idx] = match (
                    log.timestamp(phase.start_state()),
                    log.timestamp(phase.end_state()),
                ) {
                    (Some(start), Some(end)) => elapsed(job, phase, start, end),
                    _ => 0,
                };
            } else if !active_found {
                active_found = true;
                statuses[idx] = PhaseStatus::InProgress;
                let start = log
                    .timestamp(phase.start_state())
                    .or_else(|| log.furthest().map(|t| t.timestamp));
                seconds[idx] = start.map_or(0, |start| elapsed(job, phase, start, now));
            }
        }

        let scheduled_at = log
            .timestamp(JobState::Scheduled)
            .or_else(|| log.earliest_timestamp());
        let completed_at = if completed {
            log.timestamp(JobState::Completed)
        } else {
            None
        };
        let end = if completed {
            completed_at.or_else(|| log.entries().iter().map(|t| t.timestamp).max())
        } else {
            Some(now)
        };
        let total = match (scheduled_at, end) {
            (Some(start), Some(end)) => non_negative_seconds(start, end),
            _ => 0,
        };

        JobDuration {
            waiting: seconds[Phase::Waiting.index()],
            preparing: seconds[Phase::Preparing.index()],
            building: seconds[Phase::Building.index()],
            uploading_artifacts: seconds[Phase::UploadingArtifacts.index()],
            total,
            state: reached,
            statuses,
            scheduled_at,
            completed_at,
        }
    }
}

/// Shorthand for [`JobDurationCalculator::compute`].
pub fn compute(job: &Job, now: DateTime<Utc>) -> JobDuration {
    JobDurationCalculator::compute(job, now)
}

fn elapsed(job: &Job, phase: Phase, start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    if end < start {
        trace!(job = %job.name, ?phase, "phase ends before it starts, treating as zero");
    }
    non_negative_seconds(start, end)
}

fn non_negative_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    (end - start).num_seconds().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn full_job() -> Job {
        Job::scheduled("compile", at(0))
            .with_transition(JobState::Assigned, at(180))
            .with_transition(JobState::Preparing, at(200))
            .with_transition(JobState::Building, at(230))
            .with_transition(JobState::Completing, at(410))
            .with_transition(JobState::Completed, at(430))
    }

    #[test]
    fn completed_job_breakdown() {
        let d = compute(&full_job(), at(10_000));
        assert_eq!(d.waiting, 180);
        assert_eq!(d.preparing, 30);
        assert_eq!(d.building, 180);
        assert_eq!(d.uploading_artifacts, 20);
        assert_eq!(d.total, 430);
        assert_eq!(d.state, JobState::Completed);
        assert!(d.statuses.iter().all(|s| *s == PhaseStatus::Completed));
        assert_eq!(d.scheduled_at, Some(at(0)));
        assert_eq!(d.completed_at, Some(at(430)));
        assert_eq!(d.active_phase(), None);
    }

    #[test]
    fn completed_job_ignores_now() {
        assert_eq!(compute(&full_job(), at(500)), compute(&full_job(), at(99_999)));
    }

    #[test]
    fn in_flight_job_measures_only_current_phase() {
        let job = Job::scheduled("compile", at(0))
            .with_transition(JobState::Assigned, at(60))
            .with_transition(JobState::Preparing, at(60))
            .with_transition(JobState::Building, at(90));
        let d = compute(&job, at(150));
        assert_eq!(d.waiting, 60);
        assert_eq!(d.preparing, 30);
        assert_eq!(d.building, 60);
        assert_eq!(d.uploading_artifacts, 0);
        assert_eq!(d.total, 150);
        assert_eq!(d.status(Phase::Building), PhaseStatus::InProgress);
        assert_eq!(d.status(Phase::UploadingArtifacts), PhaseStatus::NotStarted);
        assert_eq!(d.completed_at, None);
        assert!(!d.is_completed());
    }

    #[test]
    fn zero_second_phase_is_completed_not_unknown() {
        let job = Job::scheduled("compile", at(0))
            .with_transition(JobState::Assigned, at(10))
            .with_transition(JobState::Preparing, at(10))
            .with_transition(JobState::Building, at(10));
        let d = compute(&job, at(40));
        assert_eq!(d.preparing, 0);
        assert_eq!(d.status(Phase::Preparing), PhaseStatus::Completed);
        assert_eq!(d.active_phase(), Some(Phase::Building));
    }

    #[test]
    fn missing_preparing_transition_counts_as_completed_zero() {
        let job = Job::scheduled("compile", at(0))
            .with_transition(JobState::Assigned, at(10))
            .with_transition(JobState::Building, at(20));
        let d = compute(&job, at(50));
        assert_eq!(d.preparing, 0);
        assert_eq!(d.status(Phase::Preparing), PhaseStatus::Completed);
        assert_eq!(d.building, 30);
    }

    #[test]
    fn forward_skip_over_building() {
        let job = Job::scheduled("compile", at(0))
            .with_transition(JobState::Assigned, at(5))
            .with_transition(JobState::Preparing, at(5))
            .with_transition(JobState::Completing, at(25));
        let d = compute(&job, at(40));
        assert_eq!(d.status(Phase::Preparing), PhaseStatus::Completed);
        assert_eq!(d.preparing, 0);
        assert_eq!(d.status(Phase::Building), PhaseStatus::Completed);
        assert_eq!(d.building, 0);
        assert_eq!(d.status(Phase::UploadingArtifacts), PhaseStatus::InProgress);
        assert_eq!(d.uploading_artifacts, 15);
    }

    #[test]
    fn assigned_but_not_preparing_measures_from_assignment() {
        let job = Job::scheduled("compile", at(0)).with_transition(JobState::Assigned, at(30));
        let d = compute(&job, at(45));
        assert_eq!(d.waiting, 30);
        assert_eq!(d.status(Phase::Preparing), PhaseStatus::InProgress);
        assert_eq!(d.preparing, 15);
    }

    #[test]
    fn freshly_scheduled_job_is_waiting() {
        let d = compute(&Job::scheduled("compile", at(0)), at(12));
        assert_eq!(d.waiting, 12);
        assert_eq!(d.total, 12);
        assert_eq!(d.active_phase(), Some(Phase::Waiting));
    }

    #[test]
    fn empty_log_is_all_zero() {
        let mut job = Job::scheduled("compile", at(0));
        job.transitions = Default::default();
        let d = compute(&job, at(100));
        assert_eq!(d.total, 0);
        assert_eq!(d.phase_sum(), 0);
        assert_eq!(d.scheduled_at, None);
    }

    #[test]
    fn out_of_order_timestamps_degrade_to_zero() {
        let job = Job::scheduled("compile", at(100))
            .with_transition(JobState::Assigned, at(50))
            .with_transition(JobState::Preparing, at(60))
            .with_transition(JobState::Building, at(70))
            .with_transition(JobState::Completing, at(65))
            .with_transition(JobState::Completed, at(80));
        let d = compute(&job, at(1_000));
        assert_eq!(d.waiting, 0);
        assert_eq!(d.building, 0);
        assert_eq!(d.uploading_artifacts, 15);
        assert_eq!(d.total, 0);
    }

    #[test]
    fn now_before_schedule_is_zero() {
        let d = compute(&Job::scheduled("compile", at(100)), at(0));
        assert_eq!(d.total, 0);
        assert_eq!(d.waiting, 0);
    }

    #[test]
    fn completed_state_without_completed_transition_uses_last_entry() {
        let mut job = Job::scheduled("compile", at(0)).with_transition(JobState::Completing, at(70));
        job.state = JobState::Completed;
        let d = compute(&job, at(5_000));
        assert_eq!(d.total, 70);
        assert_eq!(d.completed_at, None);
        assert!(d.statuses.iter().all(|s| *s == PhaseStatus::Completed));
    }

    proptest! {
        #[test]
        fn contiguous_log_phases_sum_to_total(
            gaps in proptest::collection::vec(0i64..20_000, 4),
            now_offset in 0i64..50_000,
        ) {
            let mut t = 0;
            let mut job = Job::scheduled("compile", at(t));
            t += gaps[0];
            job.record(JobState::Assigned, at(t));
            job.record(JobState::Preparing, at(t));
            t += gaps[1];
            job.record(JobState::Building, at(t));
            t += gaps[2];
            job.record(JobState::Completing, at(t));
            t += gaps[3];
            job.record(JobState::Completed, at(t));

            let d = compute(&job, at(t + now_offset));
            prop_assert_eq!(d.phase_sum(), d.total);
            prop_assert_eq!(d.total, t as u64);
        }

        #[test]
        fn compute_is_idempotent(
            gaps in proptest::collection::vec(0i64..5_000, 3),
            now_offset in 0i64..5_000,
        ) {
            let job = Job::scheduled("compile", at(0))
                .with_transition(JobState::Assigned, at(gaps[0]))
                .with_transition(JobState::Building, at(gaps[0] + gaps[1]));
            let now = at(gaps.iter().sum::<i64>() + now_offset);
            prop_assert_eq!(compute(&job, now), compute(&job, now));
        }
    }
}
