//! Terminal rendering of a stage overview with `console` styles.
//!
//! [`StageRenderer`] draws one line per job (status, name, agent, segmented
//! bar, transition circles, total time), the hovered job's tooltip, and the
//! stage summary with the state of both rerun buttons.

use console::{Style, measure_text_width};

use crate::config::{MAX_BAR_WIDTH, ProgressConfig};
use crate::duration::PhaseStatus;
use crate::overview::{JobRow, StageOverview};
use crate::progress::{HoverState, ProgressSegments, SegmentKind, Tooltip, format_duration};
use crate::stage::JobBucket;
use crate::state_machine::Phase;

pub struct StageRenderer {
    bar_width: usize,
    show_tooltips: bool,
    color: bool,
    green: Style,
    red: Style,
    yellow: Style,
    cyan: Style,
    dim: Style,
}

impl StageRenderer {
    pub fn new(config: &ProgressConfig) -> Self {
        Self {
            bar_width: config.bar_width.clamp(1, MAX_BAR_WIDTH),
            show_tooltips: config.show_tooltips,
            color: config.color,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            cyan: Style::new().cyan(),
            dim: Style::new().dim(),
        }
    }

    fn paint(&self, style: &Style, text: &str) -> String {
        if self.color {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Renders the whole overview. `hovered` names the job whose bar the
    /// pointer is over, if any.
    pub fn render(&self, overview: &StageOverview, hovered: Option<&str>) -> String {
        let mut out = String::new();
        let counter = overview
            .counter
            .as_deref()
            .map(|c| format!(" #{c}"))
            .unwrap_or_default();
        out.push_str(&format!(
            "{}\n",
            self.paint(&self.cyan, &format!("Stage {}{counter}", overview.stage))
        ));

        let name_width = overview
            .rows
            .iter()
            .map(|r| measure_text_width(&r.name))
            .max()
            .unwrap_or(0)
            .max(4);
        let agent_width = overview
            .rows
            .iter()
            .map(|r| measure_text_width(&r.agent.to_string()))
            .max()
            .unwrap_or(0)
            .max(5);

        for row in &overview.rows {
            let mut hover = HoverState::default();
            if hovered == Some(row.name.as_str()) {
                hover.pointer_enter();
            }
            out.push_str(&self.row_line(row, name_width, agent_width));
            out.push('\n');
            let tooltip = if self.show_tooltips {
                Some(&row.tooltip)
            } else {
                hover.visible_tooltip(&row.tooltip)
            };
            if let Some(tooltip) = tooltip {
                out.push_str(&self.tooltip(tooltip));
            }
        }

        out.push('\n');
        out.push_str(&self.summary(overview));
        out
    }

    fn row_line(&self, row: &JobRow, name_width: usize, agent_width: usize) -> String {
        let (symbol, style) = match row.bucket {
            JobBucket::Building => ("◐", &self.yellow),
            JobBucket::Passed => ("✓", &self.green),
            JobBucket::Failed => ("✗", &self.red),
            JobBucket::Cancelled => ("⊘", &self.dim),
        };
        let rerun = if row.rerun { " (rerun)" } else { "" };
        let selected = if row.selected { "[x]" } else { "[ ]" };
        format!(
            "{selected} {} {} {} {} {} {}{rerun}",
            self.paint(style, symbol),
            pad(&row.name, name_width),
            pad(&row.agent.to_string(), agent_width),
            self.bar(&row.progress),
            self.steps(&row.progress),
            format_duration(row.duration.total),
        )
    }

    /// Draws the bar in `bar_width` columns scaled by the bar's own width.
    pub fn bar(&self, progress: &ProgressSegments) -> String {
        let columns = self
            .bar_width
            .saturating_mul(progress.bar_width_percent.min(100) as usize)
            / 100;
        let columns = if columns == 0 && !progress.segments.is_empty() {
            1
        } else {
            columns
        };

        let mut drawn = 0;
        let mut out = String::new();
        for (i, segment) in progress.segments.iter().enumerate() {
            let cells = if i + 1 == progress.segments.len() {
                columns.saturating_sub(drawn)
            } else {
                columns.saturating_mul(segment.width_percent as usize) / 100
            };
            drawn += cells;
            let (glyph, style) = match segment.kind {
                SegmentKind::Phase(Phase::Waiting) => ("▒", &self.dim),
                SegmentKind::Phase(Phase::Preparing) => ("▓", &self.cyan),
                SegmentKind::Phase(Phase::Building) => ("█", &self.yellow),
                SegmentKind::Phase(Phase::UploadingArtifacts) => ("█", &self.green),
                SegmentKind::Unknown => ("░", &self.dim),
            };
            out.push_str(&self.paint(style, &glyph.repeat(cells)));
        }
        let padding = self.bar_width.saturating_sub(drawn);
        format!("|{out}{}|", " ".repeat(padding))
    }

    fn steps(&self, progress: &ProgressSegments) -> String {
        progress
            .steps
            .iter()
            .map(|step| match step.status {
                PhaseStatus::Completed => self.paint(&self.green, "●"),
                PhaseStatus::InProgress => self.paint(&self.yellow, "◐"),
                PhaseStatus::NotStarted => self.paint(&self.dim, "○"),
            })
            .collect()
    }

    fn tooltip(&self, tooltip: &Tooltip) -> String {
        let width = tooltip
            .entries
            .iter()
            .map(|e| measure_text_width(&e.label))
            .max()
            .unwrap_or(0);
        tooltip
            .entries
            .iter()
            .map(|e| format!("      {}  {}\n", pad(&e.label, width), e.value))
            .collect()
    }

    pub fn summary(&self, overview: &StageOverview) -> String {
        let s = &overview.summary;
        let mut out = format!(
            "Building: {}  Passed: {}  Failed: {}  Cancelled: {}\n",
            self.paint(&self.yellow, &s.building_count.to_string()),
            self.paint(&self.green, &s.passed_count.to_string()),
            self.paint(&self.red, &s.failed_count.to_string()),
            s.cancelled_count,
        );
        out.push_str(&format!(
            "[Rerun Failed: {}] [Rerun Selected: {}]\n",
            self.enabled(overview.actions.rerun_failed),
            self.enabled(overview.actions.rerun_selected),
        ));
        if !overview.actions.unknown_selected.is_empty() {
            let warning = format!(
                "Selected jobs not in this stage: {}",
                overview.actions.unknown_selected.join(", ")
            );
            out.push_str(&format!("{}\n", self.paint(&self.yellow, &warning)));
        }
        out
    }

    fn enabled(&self, on: bool) -> String {
        if on {
            self.paint(&self.green, "enabled")
        } else {
            self.paint(&self.dim, "disabled")
        }
    }
}

/// Left-aligns `text` to `width` terminal columns. Unlike `{:<width$}` this
/// counts display columns, so wide characters and escape codes line up.
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(measure_text_width(text));
    format!("{text}{}", " ".repeat(fill))
}
