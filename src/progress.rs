//! Segmented progress bar and tooltip for a single job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::duration::{JobDuration, PhaseStatus};
use crate::state_machine::Phase;

/// What a bar segment stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    Phase(Phase),
    /// Time the job has not yet used, relative to the longest job in the stage.
    Unknown,
}

/// One coloured stretch of a job's bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// The phase drawn, or the unknown tail.
    pub kind: SegmentKind,
    /// Share of the bar, in whole percent.
    pub width_percent: u32,
    /// Phase class, with ` in-progress` appended for the active phase.
    pub style_class: String,
}

/// One transition circle under the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseStep {
    pub phase: Phase,
    /// Filled, half-filled or empty circle.
    pub status: PhaseStatus,
}

/// Everything needed to draw one job's bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSegments {
    /// Width of the whole bar relative to the longest job in the stage.
    pub bar_width_percent: u32,
    /// Ordered segments; widths sum to 100 whenever the list is non-empty.
    pub segments: Vec<Segment>,
    /// One step per phase, in lifecycle order, drawn or not.
    pub steps: Vec<PhaseStep>,
}

impl ProgressSegments {
    /// Whether the bar ends in an unknown tail.
    pub fn has_unknown(&self) -> bool {
        self.segments.iter().any(|s| s.kind == SegmentKind::Unknown)
    }
}

/// A `label: value` line of the tooltip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TooltipEntry {
    /// Phase label, or one of "Scheduled At", "Completed At", "Total Time".
    pub label: String,
    /// Formatted duration or timestamp, or `"unknown"`.
    pub value: String,
}

/// Hover details of a job: the four phases, then the timestamps and total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tooltip {
    pub entries: Vec<TooltipEntry>,
}

impl Tooltip {
    /// Value of the entry with this label.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.value.as_str())
    }
}

/// Whether the tooltip of a bar is showing. Driven only by pointer events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoverState {
    hovered: bool,
}

impl HoverState {
    /// The pointer moved onto the bar.
    pub fn pointer_enter(&mut self) {
        self.hovered = true;
    }

    /// The pointer left the bar.
    pub fn pointer_leave(&mut self) {
        self.hovered = false;
    }

    pub fn is_visible(&self) -> bool {
        self.hovered
    }

    /// The tooltip while hovered, otherwise nothing.
    pub fn visible_tooltip<'a>(&self, tooltip: &'a Tooltip) -> Option<&'a Tooltip> {
        self.hovered.then_some(tooltip)
    }
}

/// Placeholder for values not known yet, also the unknown segment's class.
pub const UNKNOWN: &str = "unknown";

/// Maps durations to bar segments and tooltip text.
pub struct JobProgressPresenter;

impl JobProgressPresenter {
    /// Builds the bar for one job.
    ///
    /// `longest_total` is the largest total across the jobs drawn together.
    /// A completed job's segments are proportional to the time its phases
    /// account for; an in-flight job is drawn against the longest job, with
    /// the time not yet used shown as a trailing unknown segment. Time that
    /// falls between phases (Assigned until Preparing) is never drawn.
    pub fn present(duration: &JobDuration, longest_total: u64) -> ProgressSegments {
        let reference = longest_total.max(duration.total);
        let steps = Self::steps(duration);

        let shown: Vec<(Phase, u64, PhaseStatus)> = Phase::ALL
            .into_iter()
            .map(|p| (p, duration.phase(p), duration.status(p)))
            .filter(|(_, secs, status)| match status {
                PhaseStatus::Completed => *secs > 0,
                PhaseStatus::InProgress => true,
                PhaseStatus::NotStarted => false,
            })
            .collect();

        if duration.is_completed() {
            let bar_width_percent = if reference == 0 {
                0
            } else {
                percent_floor(duration.total, reference)
            };
            let denominator = match duration.phase_sum() {
                0 => duration.total,
                sum => sum,
            };
            let segments = proportional(&shown, denominator, false);
            return ProgressSegments {
                bar_width_percent,
                segments,
                steps,
            };
        }

        let between_phases = duration.total.saturating_sub(duration.phase_sum());
        let denominator = reference
            .saturating_sub(between_phases)
            .max(duration.phase_sum());
        let with_unknown = reference > duration.total;
        ProgressSegments {
            bar_width_percent: 100,
            segments: proportional(&shown, denominator, with_unknown),
            steps,
        }
    }

    /// The transition circles under the bar.
    pub fn steps(duration: &JobDuration) -> Vec<PhaseStep> {
        Phase::ALL
            .into_iter()
            .map(|phase| PhaseStep {
                phase,
                status: duration.status(phase),
            })
            .collect()
    }

    /// Tooltip text. Phases not started yet read `"unknown"`.
    pub fn tooltip(duration: &JobDuration) -> Tooltip {
        let mut entries: Vec<TooltipEntry> = Phase::ALL
            .into_iter()
            .map(|phase| TooltipEntry {
                label: phase.label().to_string(),
                value: match duration.status(phase) {
                    PhaseStatus::NotStarted => UNKNOWN.to_string(),
                    _ => format_duration(duration.phase(phase)),
                },
            })
            .collect();

        entries.push(TooltipEntry {
            label: "Scheduled At".to_string(),
            value: duration
                .scheduled_at
                .map_or_else(|| UNKNOWN.to_string(), format_timestamp),
        });
        entries.push(TooltipEntry {
            label: "Completed At".to_string(),
            value: duration
                .completed_at
                .map_or_else(|| UNKNOWN.to_string(), format_timestamp),
        });
        entries.push(TooltipEntry {
            label: "Total Time".to_string(),
            value: format_duration(duration.total),
        });

        Tooltip { entries }
    }
}

/// Shorthand for [`JobProgressPresenter::present`].
pub fn present(duration: &JobDuration, longest_total: u64) -> ProgressSegments {
    JobProgressPresenter::present(duration, longest_total)
}

/// Formats seconds as `"MMm SSs"`, e.g. `"03m 00s"`.
pub fn format_duration(seconds: u64) -> String {
    format!("{:02}m {:02}s", seconds / 60, seconds % 60)
}

/// Formats a timestamp as `"14 Nov, 2023 at 22:13:20"` (UTC).
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%d %b, %Y at %H:%M:%S").to_string()
}

fn percent_floor(part: u64, whole: u64) -> u32 {
    (part.saturating_mul(100) / whole).min(100) as u32
}

// Floors every segment and hands the rounding remainder either to a trailing
// unknown segment or to the last shown segment, so widths always total 100.
fn proportional(
    shown: &[(Phase, u64, PhaseStatus)],
    denominator: u64,
    with_unknown: bool,
) -> Vec<Segment> {
    let mut segments: Vec<Segment> = shown
        .iter()
        .map(|(phase, secs, status)| Segment {
            kind: SegmentKind::Phase(*phase),
            width_percent: if denominator == 0 {
                0
            } else {
                percent_floor(*secs, denominator)
            },
            style_class: match status {
                PhaseStatus::InProgress => format!("{} in-progress", phase.css_class()),
                _ => phase.css_class().to_string(),
            },
        })
        .collect();

    let used: u32 = segments.iter().map(|s| s.width_percent).sum();
    let remainder = 100u32.saturating_sub(used);

    if with_unknown && remainder > 0 {
        segments.push(Segment {
            kind: SegmentKind::Unknown,
            width_percent: remainder,
            style_class: UNKNOWN.to_string(),
        });
    } else if let Some(last) = segments.last_mut() {
        last.width_percent += remainder;
    }

    segments
}
