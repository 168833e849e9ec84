use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    DashboardOrchestrator, DirectoryReportSink, HttpPrecastService, RequestState, RunOutcome,
    SendOutcome,
};
use shared::domain::{ParameterField, ProcessParameters};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

mod config;
mod render;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(name = "dashboard", about = "Precast curing optimizer dashboard")]
struct Args {
    /// Overrides the configured optimizer base URL.
    #[arg(long)]
    backend_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show parameter domains and defaults.
    Params,
    /// Submit parameters and show the optimized recipe.
    Optimize {
        /// key=value, e.g. --set hold_temperature=70
        #[arg(long = "set", value_parser = parse_assignment)]
        set: Vec<(ParameterField, String)>,
    },
    /// Optimize, then download the executive report.
    Report {
        #[arg(long = "set", value_parser = parse_assignment)]
        set: Vec<(ParameterField, String)>,
    },
    /// Talk to the assistant; an empty line is ignored, /quit exits.
    Chat,
}

fn parse_assignment(raw: &str) -> Result<(ParameterField, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let field = key.parse::<ParameterField>().map_err(|err| err.to_string())?;
    Ok((field, value.to_string()))
}

fn apply_edits(dashboard: &DashboardOrchestrator, edits: &[(ParameterField, String)]) {
    for (field, raw) in edits {
        let stored = dashboard.edit_parameter(*field, raw);
        if raw.trim().parse::<f64>().ok() != Some(stored) {
            eprintln!(
                "{field}: '{raw}' is outside {}..={}; using {stored}",
                field.domain().min,
                field.domain().max
            );
        }
    }
}

async fn run_optimize(dashboard: &DashboardOrchestrator) -> Result<()> {
    println!("Evolving curing recipe...");
    match dashboard.optimize().await {
        RunOutcome::Succeeded => {}
        RunOutcome::Failed | RunOutcome::Superseded => {
            let message = dashboard
                .optimize_controller()
                .error()
                .unwrap_or_else(|| "optimization did not complete".into());
            bail!(message);
        }
    }

    let Some(result) = dashboard.result() else {
        bail!("optimization finished without a result");
    };
    render::render_reveal(dashboard, &result)
        .await
        .context("failed to draw metrics")?;
    render::print_insight(&result);
    render::print_tracker(&result);
    Ok(())
}

async fn run_report(dashboard: &DashboardOrchestrator) -> Result<()> {
    run_optimize(dashboard).await?;
    println!("\nGenerating PDF...");
    if dashboard.download_report().await.is_none() {
        bail!("no optimization result to report on");
    }
    match dashboard.report_controller().state() {
        RequestState::Succeeded(report) => {
            println!(
                "Saved {} ({} bytes)",
                report.path.display(),
                report.size_bytes
            );
            Ok(())
        }
        RequestState::Failed(message) => bail!(message),
        _ => bail!("report download did not complete"),
    }
}

async fn run_chat(dashboard: &DashboardOrchestrator) -> Result<()> {
    println!("Ask about precast optimization, concrete mix, or the dashboard. /quit exits.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if line.trim() == "/quit" {
            break;
        }
        match dashboard.send_chat(&line).await {
            SendOutcome::Ignored | SendOutcome::Busy => continue,
            SendOutcome::Replied | SendOutcome::Recovered => {
                if let Some(reply) = dashboard.chat().snapshot().last_reply() {
                    println!("assistant> {}", reply.content);
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = load_settings()?;
    if let Some(url) = args.backend_url {
        settings.backend_url = url;
    }
    info!(backend_url = %settings.backend_url, report_dir = %settings.report_dir.display(), "dashboard starting");

    let service = HttpPrecastService::new(&settings.backend_url)
        .with_context(|| format!("invalid backend url '{}'", settings.backend_url))?;
    let dashboard = DashboardOrchestrator::new(
        Arc::new(service),
        Arc::new(DirectoryReportSink::new(settings.report_dir.clone())),
        settings.controller,
    );

    match args.command {
        Command::Params => {
            render::print_parameters(&ProcessParameters::default());
            Ok(())
        }
        Command::Optimize { set } => {
            apply_edits(&dashboard, &set);
            run_optimize(&dashboard).await
        }
        Command::Report { set } => {
            apply_edits(&dashboard, &set);
            run_report(&dashboard).await
        }
        Command::Chat => run_chat(&dashboard).await,
    }
}
