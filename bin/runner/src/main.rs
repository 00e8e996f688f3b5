//! Command line runner for aiflow workflows.

mod commands;
mod config;
mod error;

use aiflow_core::WorkflowId;
use aiflow_workflow::{DEFAULT_SOURCE_PORT, DEFAULT_TARGET_PORT, NodeId, Position};
use clap::{Parser, Subcommand};
use commands::Runner;
use config::RunnerConfig;
use error::RunnerError;
use rootcause::prelude::Report;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build, inspect and run AI module workflows
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty workflow
    Create {
        #[arg(default_value = "Unnamed Workflow")]
        name: String,
    },
    /// List stored workflows
    List,
    /// Print a workflow document
    Show { workflow_id: WorkflowId },
    /// Print the order nodes run in
    Order { workflow_id: WorkflowId },
    /// Place a catalog module on the canvas
    Add {
        workflow_id: WorkflowId,
        module_id: String,
        #[arg(long, default_value_t = 0.0)]
        x: f64,
        #[arg(long, default_value_t = 0.0)]
        y: f64,
    },
    /// Connect an output port to an input port
    Connect {
        workflow_id: WorkflowId,
        source: String,
        target: String,
        #[arg(long, default_value = DEFAULT_SOURCE_PORT)]
        source_port: String,
        #[arg(long, default_value = DEFAULT_TARGET_PORT)]
        target_port: String,
    },
    /// Delete a node and its connections
    Remove { workflow_id: WorkflowId, node_id: String },
    /// Run a workflow and print each node's output
    Run {
        workflow_id: WorkflowId,
        /// Do not write results back to the store
        #[arg(long)]
        no_save: bool,
    },
    /// List the available modules
    Catalog,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("{report}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<(), Report<RunnerError>> {
    let config = RunnerConfig::load(cli.config.as_deref()).map_err(RunnerError::from)?;
    tracing::debug!(?config, "loaded configuration");
    let runner = Runner::from_config(&config)?;

    match cli.command {
        Command::Create { name } => {
            runner.create(&name).await?;
        }
        Command::List => runner.list().await?,
        Command::Show { workflow_id } => runner.show(workflow_id).await?,
        Command::Order { workflow_id } => {
            runner.order(workflow_id).await?;
        }
        Command::Add {
            workflow_id,
            module_id,
            x,
            y,
        } => {
            runner
                .add(workflow_id, &module_id, Position::new(x, y))
                .await?;
        }
        Command::Connect {
            workflow_id,
            source,
            target,
            source_port,
            target_port,
        } => {
            let source = NodeId::new(source);
            let target = NodeId::new(target);
            runner
                .connect(
                    workflow_id,
                    (&source, source_port.as_str()),
                    (&target, target_port.as_str()),
                )
                .await?;
        }
        Command::Remove {
            workflow_id,
            node_id,
        } => runner.remove(workflow_id, &NodeId::new(node_id)).await?,
        Command::Run {
            workflow_id,
            no_save,
        } => runner.run(workflow_id, !no_save).await?,
        Command::Catalog => runner.catalog(),
    }
    Ok(())
}
