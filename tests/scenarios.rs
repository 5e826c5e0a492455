use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use stage_progress::payload::{parse_agents, parse_stage};
use stage_progress::progress::{JobProgressPresenter, SegmentKind, format_duration};
use stage_progress::{
    AgentLabel, JobDurationCalculator, JobState, OverviewOptions, PhaseStatus, StageOverview,
    StageSummary, Phase,
};

const T0: i64 = 1_760_000_000_000;

fn now(offset_secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(T0 + offset_secs * 1_000).unwrap()
}

fn transition(state: &str, offset_secs: i64) -> String {
    format!(
        r#"{{"state": "{state}", "state_change_time": {}}}"#,
        T0 + offset_secs * 1_000
    )
}

fn job(name: &str, state: &str, result: &str, agent: Option<&str>, transitions: &[(&str, i64)]) -> String {
    let transitions: Vec<String> = transitions.iter().map(|(s, t)| transition(s, *t)).collect();
    let agent = agent.map_or("null".to_string(), |a| format!("\"{a}\""));
    format!(
        r#"{{"name": "{name}", "state": "{state}", "result": "{result}", "scheduled_date": {T0},
            "rerun": false, "original_job_id": null, "agent_uuid": {agent},
            "job_state_transitions": [{}]}}"#,
        transitions.join(",")
    )
}

fn stage(jobs: &[String]) -> String {
    format!(
        r#"{{"name": "build", "counter": 1, "approved_by": "changes", "result": "Unknown", "jobs": [{}]}}"#,
        jobs.join(",")
    )
}

const FULL_LOG: &[(&str, i64)] = &[
    ("Scheduled", 0),
    ("Assigned", 180),
    ("Preparing", 200),
    ("Building", 230),
    ("Completing", 410),
    ("Completed", 430),
];

#[test]
fn completed_job_breakdown_and_tooltip() {
    let stage = parse_stage(&stage(&[job("compile", "Completed", "Passed", None, FULL_LOG)])).unwrap();
    let duration = JobDurationCalculator::compute(&stage.jobs[0], now(5_000));

    assert_eq!(duration.waiting, 180);
    assert_eq!(format_duration(duration.waiting), "03m 00s");
    assert_eq!(duration.preparing, 30);
    assert_eq!(duration.building, 180);
    assert_eq!(format_duration(duration.building), "03m 00s");
    assert_eq!(duration.uploading_artifacts, 20);
    assert_eq!(duration.total, 430);
    assert_eq!(format_duration(duration.total), "07m 10s");

    let tooltip = JobProgressPresenter::tooltip(&duration);
    assert_eq!(tooltip.get("Waiting for an Agent"), Some("03m 00s"));
    assert_eq!(tooltip.get("Building Job"), Some("03m 00s"));
    assert_eq!(tooltip.get("Uploading Artifacts"), Some("00m 20s"));
    assert_eq!(tooltip.get("Total Time"), Some("07m 10s"));
}

#[test]
fn unknown_agent_uuid_is_shown_verbatim() {
    let stage = parse_stage(&stage(&[job("compile", "Building", "Unknown", Some("XYZ"), &FULL_LOG[..4])])).unwrap();
    let agents = parse_agents(r#"[{"uuid": "abc", "hostname": "host-a"}]"#).unwrap();
    let overview = StageOverview::build(&stage, &agents, &OverviewOptions::at(now(300)));

    let row = overview.row("compile").unwrap();
    assert_eq!(row.agent.to_string(), "XYZ");
    assert!(row.agent_href.is_none());
}

#[test]
fn missing_agent_uuid_is_unassigned() {
    let stage = parse_stage(&stage(&[job("compile", "Scheduled", "Unknown", None, &FULL_LOG[..1])])).unwrap();
    let overview = StageOverview::build(&stage, &parse_agents("[]").unwrap(), &OverviewOptions::at(now(10)));

    let row = overview.row("compile").unwrap();
    assert_eq!(row.agent, AgentLabel::Unassigned);
    assert_eq!(row.agent.to_string(), "unassigned");
}

#[test]
fn mixed_stage_enables_rerun_failed() {
    let stage = parse_stage(&stage(&[
        job("compile", "Building", "Unknown", None, &FULL_LOG[..4]),
        job("unit", "Completed", "Passed", None, FULL_LOG),
        job("lint", "Completed", "Failed", None, FULL_LOG),
    ]))
    .unwrap();
    let overview = StageOverview::build(&stage, &parse_agents("[]").unwrap(), &OverviewOptions::at(now(500)));

    assert_eq!(overview.summary.building_count, 1);
    assert_eq!(overview.summary.passed_count, 1);
    assert_eq!(overview.summary.failed_count, 1);
    assert_eq!(overview.summary.total(), 3);
    assert!(overview.actions.rerun_failed);
    assert!(!overview.actions.rerun_selected);
}

#[test]
fn passing_stage_gates_rerun_on_selection() {
    let stage = parse_stage(&stage(&[
        job("unit", "Completed", "Passed", None, FULL_LOG),
        job("lint", "Completed", "Passed", None, FULL_LOG),
    ]))
    .unwrap();
    let summary: StageSummary = stage.summary();
    assert_eq!(summary.failed_count, 0);

    let nothing = summary.actions(&stage.jobs, &BTreeSet::new());
    assert!(!nothing.rerun_failed);
    assert!(!nothing.rerun_selected);

    let selected: BTreeSet<String> = ["lint".to_string()].into_iter().collect();
    let some = summary.actions(&stage.jobs, &selected);
    assert!(!some.rerun_failed);
    assert!(some.rerun_selected);
}

#[test]
fn zero_second_preparing_is_completed_on_the_bar() {
    let log = [("Scheduled", 0), ("Assigned", 30), ("Preparing", 30), ("Building", 30)];
    let stage = parse_stage(&stage(&[
        job("compile", "Building", "Unknown", None, &log),
        job("unit", "Completed", "Passed", None, FULL_LOG),
    ]))
    .unwrap();
    let overview = StageOverview::build(&stage, &parse_agents("[]").unwrap(), &OverviewOptions::at(now(90)));

    let row = overview.row("compile").unwrap();
    assert_eq!(row.duration.state, JobState::Building);
    assert_eq!(row.duration.status(Phase::Preparing), PhaseStatus::Completed);
    assert_eq!(row.progress.steps[1].status, PhaseStatus::Completed);
    assert_eq!(row.progress.steps[2].status, PhaseStatus::InProgress);
    assert!(
        !row.progress
            .segments
            .iter()
            .any(|s| s.kind == SegmentKind::Phase(Phase::Preparing))
    );
    assert!(row.progress.has_unknown());
}

#[test]
fn rendering_twice_is_identical() {
    let stage = parse_stage(&stage(&[
        job("compile", "Building", "Unknown", None, &FULL_LOG[..4]),
        job("unit", "Completed", "Passed", None, FULL_LOG),
    ]))
    .unwrap();
    let agents = parse_agents("[]").unwrap();
    let options = OverviewOptions::at(now(300));
    let first = serde_json::to_string(&StageOverview::build(&stage, &agents, &options)).unwrap();
    let second = serde_json::to_string(&StageOverview::build(&stage, &agents, &options)).unwrap();
    assert_eq!(first, second);
}
