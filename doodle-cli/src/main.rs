//! # Doodle CLI
//!
//! Command-line host for drawing classifier sessions.

use anyhow::Context;
use clap::Parser;
use doodle_cli::{load_script, run_script, CliArgs, CliConfig, Command, StepReport};
use doodle_client::{BackendGateway, DrawingSession, HttpGateway};
use doodle_core::{NoopExitGuard, ProjectInfo};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,doodle_client=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    // Use JSON format in production (RUST_LOG_FORMAT=json)
    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = CliConfig::from_args(&args)?;
    tracing::debug!(backend = %config.gateway.base_url, "Starting Doodle CLI");

    let gateway = HttpGateway::new(&config.gateway)?;

    let project = match &args.command {
        Command::CheckName { name } => {
            let exists = gateway.check_project_name(name).await?;
            println!(
                "{name}: {}",
                if exists { "taken" } else { "available" }
            );
            return Ok(());
        }
        Command::New { .. } => {
            let setup = args
                .command
                .project_setup()
                .context("missing project setup")?;
            doodle_client::create_project(&gateway, &setup)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?
        }
        Command::Load { .. } => {
            let load = args
                .command
                .project_load()
                .context("missing project load form")?;
            doodle_client::load_project(&gateway, &load)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?
        }
    };

    print_project(&project);

    let Some(path) = args.command.script() else {
        return Ok(());
    };
    let steps = load_script(path)?;

    let mut session = DrawingSession::open(gateway, project, Box::new(NoopExitGuard), &config.session)
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    let reports = run_script(&mut session, &steps).await;
    for report in &reports {
        print_report(report, config.json)?;
    }

    let state = session.state();
    if !state.is_closed() && !state.has_persisted() {
        tracing::warn!(
            project = %state.project_name(),
            "Exiting with unsaved work; the project was not persisted"
        );
    }

    if reports.iter().any(|r| !r.ok) {
        anyhow::bail!(
            "{} of {} steps failed",
            reports.iter().filter(|r| !r.ok).count(),
            reports.len()
        );
    }
    Ok(())
}

fn print_project(project: &ProjectInfo) {
    println!(
        "Project {} [{}]{}",
        project.name,
        project.classes,
        if project.persisted { "" } else { " (not saved)" }
    );
}

fn print_report(report: &StepReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}
