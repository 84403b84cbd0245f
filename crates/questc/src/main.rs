//! questc
//!
//! Compiles quest behavior graphs into Lua scripts.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use quest_compiler::NodeCatalog;
use questc::build::{BuildMode, build_project};
use questc::project::{ProjectLoader, ProjectWatcher};

/// Quest behavior graph compiler
#[derive(Parser, Debug)]
#[command(name = "questc")]
#[command(about = "Compile quest behavior graphs into Lua scripts", long_about = None)]
struct Args {
    /// Path to the project directory
    #[arg(short, long, default_value = ".", global = true)]
    project: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile the project and write the scripts
    Build {
        /// Output directory (defaults to [build] output_dir)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Compile the project and report diagnostics without writing anything
    Check,
    /// Rebuild whenever a project source file changes
    Watch {
        /// Output directory (defaults to [build] output_dir)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// List the node types available to the project
    Nodes,
}

fn main() -> Result<()> {
    // Build and run tokio runtime
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("questc=info,quest_compiler=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse command line arguments
    let args = Args::parse();

    match args.command {
        Command::Build { out } => {
            build_project(&args.project, &BuildMode::Write { out_dir: out }).await?;
        }
        Command::Check => {
            let report = build_project(&args.project, &BuildMode::Check).await?;
            let count = report.diagnostic_count();
            if count > 0 {
                bail!("{} diagnostic(s) reported", count);
            }
            info!("No diagnostics");
        }
        Command::Watch { out } => watch(args.project, out).await?,
        Command::Nodes => list_nodes(&args.project).await?,
    }

    Ok(())
}

/// Build once, then rebuild on every source change until interrupted
async fn watch(project: PathBuf, out: Option<PathBuf>) -> Result<()> {
    let mode = BuildMode::Write { out_dir: out };

    if let Err(e) = build_project(&project, &mode).await {
        error!("Build failed: {}", e);
    }

    let mut watcher = ProjectWatcher::new(&project)?;
    info!("Waiting for changes (Ctrl+C to stop)");

    loop {
        tokio::select! {
            change = watcher.next_change() => {
                let Some(change) = change else { break };
                info!("Rebuilding after {:?}", change);
                if let Err(e) = build_project(&project, &mode).await {
                    error!("Build failed: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping watch");
                break;
            }
        }
    }

    Ok(())
}

/// Print the catalog: the project's when one is found, the built-ins otherwise
async fn list_nodes(project: &Path) -> Result<()> {
    let catalog = match ProjectLoader::load(project).await {
        Ok(project) => project.catalog,
        Err(e) => {
            info!("Listing built-in nodes only ({})", e);
            NodeCatalog::builtin()?
        }
    };

    for category in catalog.categories() {
        println!("{}:", category);
        for def in catalog.nodes_in_category(category) {
            let outputs = def.outputs.join(", ");
            let queued = if def.queued { " [queued]" } else { "" };
            println!("  {:<20} -> {}{}", def.id, outputs, queued);
        }
    }

    Ok(())
}
