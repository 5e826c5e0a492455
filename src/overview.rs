//! Per-stage view model: every job's bar, tooltip and agent label, plus the
//! stage summary and rerun gating.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::agent::{AgentLabel, AgentResolver};
use crate::duration::{JobDuration, JobDurationCalculator};
use crate::progress::{JobProgressPresenter, ProgressSegments, Tooltip};
use crate::stage::{JobBucket, JobFilter, RerunActions, Stage, StageSummary, longest_total};
use crate::state_machine::JobResult;

/// Everything needed to draw one job.
#[derive(Debug, Clone, Serialize)]
pub struct JobRow {
    pub name: String,
    pub bucket: JobBucket,
    pub result: JobResult,
    pub rerun: bool,
    /// Ticked for "Rerun Selected".
    pub selected: bool,
    pub agent: AgentLabel,
    /// Link to the agent's job history; `None` while unassigned.
    pub agent_href: Option<String>,
    pub duration: JobDuration,
    pub progress: ProgressSegments,
    pub tooltip: Tooltip,
}

/// A stage ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct StageOverview {
    pub stage: String,
    pub counter: Option<String>,
    /// Jobs passing the filter, in stage order.
    pub rows: Vec<JobRow>,
    /// Counts over every job, filtered or not.
    pub summary: StageSummary,
    pub actions: RerunActions,
}

#[derive(Debug, Clone)]
pub struct OverviewOptions {
    /// Clock used for in-flight jobs.
    pub now: DateTime<Utc>,
    pub filter: JobFilter,
    pub selection: BTreeSet<String>,
    pub agent_route_prefix: String,
}

impl OverviewOptions {
    /// Defaults: every job shown, nothing selected, agents under `/agents`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            filter: JobFilter::All,
            selection: BTreeSet::new(),
            agent_route_prefix: "/agents".to_string(),
        }
    }
}

impl StageOverview {
    /// Computes every job once. Bars are scaled against the longest job in
    /// the whole stage, so filtering never changes a bar's width.
    pub fn build(stage: &Stage, resolver: &impl AgentResolver, options: &OverviewOptions) -> Self {
        let durations: Vec<JobDuration> = stage
            .jobs
            .iter()
            .map(|job| JobDurationCalculator::compute(job, options.now))
            .collect();
        let longest = longest_total(&durations);

        let rows = stage
            .jobs
            .iter()
            .zip(durations)
            .filter(|(job, _)| options.filter.matches(job))
            .map(|(job, duration)| {
                let agent = AgentLabel::for_job(job.agent_uuid.as_deref(), resolver);
                JobRow {
                    name: job.name.clone(),
                    bucket: JobBucket::of(job),
                    result: job.result,
                    rerun: job.rerun,
                    selected: options.selection.contains(&job.name),
                    agent_href: agent.href(&options.agent_route_prefix),
                    agent,
                    progress: JobProgressPresenter::present(&duration, longest),
                    tooltip: JobProgressPresenter::tooltip(&duration),
                    duration,
                }
            })
            .collect::<Vec<_>>();

        let summary = stage.summary();
        let actions = summary.actions(&stage.jobs, &options.selection);
        debug!(
            stage = %stage.name,
            shown = rows.len(),
            longest,
            building = summary.building_count,
            failed = summary.failed_count,
            "built stage overview"
        );

        Self {
            stage: stage.name.clone(),
            counter: stage.counter.clone(),
            rows,
            summary,
            actions,
        }
    }

    pub fn row(&self, name: &str) -> Option<&JobRow> {
        self.rows.iter().find(|r| r.name == name)
    }
}
