use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stage_progress::agent::AgentRegistry;
use stage_progress::cli::{Cli, Command};
use stage_progress::config::ProgressConfig;
use stage_progress::overview::{OverviewOptions, StageOverview};
use stage_progress::payload::{load_agents, load_stage};
use stage_progress::ui::StageRenderer;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => ProgressConfig::load_from(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ProgressConfig::load().context("failed to load stage-progress.toml")?,
    };

    match cli.command {
        Command::Show {
            stage,
            agents,
            now,
            select,
            hover,
            filter,
            json,
        } => {
            let stage = load_stage(&stage)
                .with_context(|| format!("failed to read stage {}", stage.display()))?;
            let agents = match agents {
                Some(path) => load_agents(&path)
                    .with_context(|| format!("failed to read agents {}", path.display()))?,
                None => AgentRegistry::new(),
            };

            let mut options = OverviewOptions::at(now.unwrap_or_else(Utc::now));
            options.filter = filter;
            options.selection = select.into_iter().collect::<BTreeSet<_>>();
            options.agent_route_prefix = config.agent_route_prefix.clone();

            let overview = StageOverview::build(&stage, &agents, &options);
            if json {
                println!("{}", serde_json::to_string_pretty(&overview)?);
            } else {
                let renderer = StageRenderer::new(&config);
                print!("{}", renderer.render(&overview, hover.as_deref()));
            }
        }
        Command::Summary { stage, select } => {
            let stage = load_stage(&stage)
                .with_context(|| format!("failed to read stage {}", stage.display()))?;
            let mut options = OverviewOptions::at(Utc::now());
            options.selection = select.into_iter().collect();
            let overview = StageOverview::build(&stage, &AgentRegistry::new(), &options);
            print!("{}", StageRenderer::new(&config).summary(&overview));
        }
    }

    Ok(())
}
