//! Stage-level aggregation over a stage's jobs.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::duration::JobDuration;
use crate::state_machine::{Job, JobResult, UnknownVariant};

/// A stage run and its jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    /// Run number of the stage within its pipeline.
    pub counter: Option<String>,
    /// Who or what triggered the run.
    pub approved_by: Option<String>,
    /// Stage result as reported by the server; not used for counting.
    pub result: Option<String>,
    pub jobs: Vec<Job>,
}

impl Stage {
    /// Counts of this stage's jobs.
    pub fn summary(&self) -> StageSummary {
        StageJobAggregator::aggregate(&self.jobs)
    }
}

/// The single bucket a job is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobBucket {
    Building,
    Passed,
    Failed,
    /// Completed with a `Cancelled` or `Unknown` result.
    Cancelled,
}

impl JobBucket {
    /// Unfinished jobs are building whatever their result says.
    pub fn of(job: &Job) -> Self {
        if !job.is_completed() {
            return JobBucket::Building;
        }
        match job.result {
            JobResult::Passed => JobBucket::Passed,
            JobResult::Failed => JobBucket::Failed,
            JobResult::Cancelled | JobResult::Unknown => JobBucket::Cancelled,
        }
    }
}

/// Counts of jobs per bucket. The four counts always sum to the number of
/// jobs aggregated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSummary {
    /// Jobs not yet completed.
    pub building_count: usize,
    /// Completed jobs that passed.
    pub passed_count: usize,
    /// Completed jobs that failed.
    pub failed_count: usize,
    /// Completed jobs that were cancelled or have no result.
    pub cancelled_count: usize,
    /// Names of the jobs "Rerun Failed" would re-execute.
    pub failed_jobs: Vec<String>,
}

impl StageSummary {
    /// Sum of all four buckets.
    pub fn total(&self) -> usize {
        self.building_count + self.passed_count + self.failed_count + self.cancelled_count
    }

    /// "Rerun Failed" is enabled while any job failed.
    pub fn can_rerun_failed(&self) -> bool {
        self.failed_count > 0
    }

    /// Button gating for the two rerun actions.
    ///
    /// The selection is whatever the user ticked; its meaning is up to the
    /// caller. Names not present in the stage are reported back but still
    /// count toward enabling "Rerun Selected".
    pub fn actions(&self, jobs: &[Job], selection: &BTreeSet<String>) -> RerunActions {
        let unknown_selected = selection
            .iter()
            .filter(|name| !jobs.iter().any(|job| &job.name == *name))
            .cloned()
            .collect();
        RerunActions {
            rerun_failed: self.can_rerun_failed(),
            rerun_selected: !selection.is_empty(),
            unknown_selected,
        }
    }
}

/// Enablement of the two rerun buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerunActions {
    pub rerun_failed: bool,
    pub rerun_selected: bool,
    /// Selected names with no matching job in the stage.
    pub unknown_selected: Vec<String>,
}

/// Scans a stage's jobs. Stateless.
pub struct StageJobAggregator;

impl StageJobAggregator {
    /// Puts every job in exactly one bucket.
    pub fn aggregate(jobs: &[Job]) -> StageSummary {
        let mut summary = StageSummary::default();
        for job in jobs {
            match JobBucket::of(job) {
                JobBucket::Building => summary.building_count += 1,
                JobBucket::Passed => summary.passed_count += 1,
                JobBucket::Failed => {
                    summary.failed_count += 1;
                    summary.failed_jobs.push(job.name.clone());
                }
                JobBucket::Cancelled => summary.cancelled_count += 1,
            }
        }
        summary
    }
}

/// Shorthand for [`StageJobAggregator::aggregate`].
pub fn aggregate(jobs: &[Job]) -> StageSummary {
    StageJobAggregator::aggregate(jobs)
}

/// The largest total across a set of durations, used to scale bars.
pub fn longest_total<'a>(durations: impl IntoIterator<Item = &'a JobDuration>) -> u64 {
    durations.into_iter().map(|d| d.total).max().unwrap_or(0)
}

/// Narrows the jobs shown in an overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobFilter {
    #[default]
    All,
    Only(JobBucket),
}

impl JobFilter {
    /// Whether `job` is shown under this filter.
    pub fn matches(self, job: &Job) -> bool {
        match self {
            JobFilter::All => true,
            JobFilter::Only(bucket) => JobBucket::of(job) == bucket,
        }
    }
}

impl fmt::Display for JobFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobFilter::All => write!(f, "all"),
            JobFilter::Only(JobBucket::Building) => write!(f, "building"),
            JobFilter::Only(JobBucket::Passed) => write!(f, "passed"),
            JobFilter::Only(JobBucket::Failed) => write!(f, "failed"),
            JobFilter::Only(JobBucket::Cancelled) => write!(f, "cancelled"),
        }
    }
}

impl FromStr for JobFilter {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(JobFilter::All),
            "building" => Ok(JobFilter::Only(JobBucket::Building)),
            "passed" => Ok(JobFilter::Only(JobBucket::Passed)),
            "failed" => Ok(JobFilter::Only(JobBucket::Failed)),
            "cancelled" => Ok(JobFilter::Only(JobBucket::Cancelled)),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}
