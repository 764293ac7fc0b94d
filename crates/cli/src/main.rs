//! mindloop CLI: inspect skills and workspaces without running a model.
//!
//! Commands:
//! - `skills`: load and validate a skill directory
//! - `render`: render a workspace the way the model sees it
//! - `config`: print the default or effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "mindloop",
    about = "mindloop: skill-driven reflect-then-act agent runtime",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a skill directory and report skills, warnings and errors
    Skills {
        /// Directory of skill documents
        dir: PathBuf,
    },

    /// Build a workspace and print its rendered context and tools
    Render {
        /// Load skills from this directory (defaults to `skills.directory`)
        #[arg(short, long, env = "MINDLOOP_SKILLS_DIR")]
        skills: Option<PathBuf>,

        /// Activate this skill before rendering
        #[arg(short, long)]
        activate: Option<String>,
    },

    /// Print configuration
    Config {
        /// Print the effective config (file + env) instead of the defaults
        #[arg(long)]
        effective: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Skills { dir } => commands::skills::run(&dir)?,
        Commands::Render { skills, activate } => commands::render::run(skills, activate).await?,
        Commands::Config { effective } => commands::config_cmd::run(effective)?,
    }

    Ok(())
}
