//! Configuration loaded from `stage-progress.toml`.
//!
//! Every key is optional and falls back to a default. A non-empty `NO_COLOR`
//! environment variable turns colour off regardless of the file.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::ProgressError;

pub const DEFAULT_CONFIG_FILE: &str = "stage-progress.toml";

/// Widest bar the terminal renderer accepts.
pub const MAX_BAR_WIDTH: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressConfig {
    /// Terminal columns used by the longest job's bar.
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,

    #[serde(default = "default_color")]
    pub color: bool,

    /// Print every job's tooltip, not only the hovered one.
    #[serde(default)]
    pub show_tooltips: bool,

    /// Route under which agent job-history pages live.
    #[serde(default = "default_agent_route_prefix")]
    pub agent_route_prefix: String,
}

fn default_bar_width() -> usize {
    40
}

fn default_color() -> bool {
    true
}

fn default_agent_route_prefix() -> String {
    "/agents".to_string()
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            bar_width: default_bar_width(),
            color: default_color(),
            show_tooltips: false,
            agent_route_prefix: default_agent_route_prefix(),
        }
    }
}

impl ProgressConfig {
    /// Loads `stage-progress.toml` from the working directory, or defaults
    /// when it does not exist.
    pub fn load() -> Result<Self, ProgressError> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        let config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.with_env()
    }

    /// Loads an explicitly named file. A missing file is an error here.
    pub fn load_from(path: &Path) -> Result<Self, ProgressError> {
        Self::from_file(path)?.with_env()
    }

    pub fn parse(contents: &str) -> Result<Self, ProgressError> {
        let config: ProgressConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ProgressError> {
        let contents = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "reading config");
        Self::parse(&contents)
    }

    fn validate(&self) -> Result<(), ProgressError> {
        if self.bar_width == 0 {
            return Err(ProgressError::Config("bar_width must be at least 1".into()));
        }
        if self.bar_width > MAX_BAR_WIDTH {
            return Err(ProgressError::Config(format!(
                "bar_width must be at most {MAX_BAR_WIDTH}, got {}",
                self.bar_width
            )));
        }
        Ok(())
    }

    fn with_env(self) -> Result<Self, ProgressError> {
        let no_color = std::env::var("NO_COLOR").ok();
        Ok(self.apply_no_color(no_color.as_deref()))
    }

    fn apply_no_color(mut self, no_color: Option<&str>) -> Self {
        if no_color.is_some_and(|v| !v.is_empty()) {
            self.color = false;
        }
        self
    }
}
