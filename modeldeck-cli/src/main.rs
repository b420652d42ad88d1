//! Modeldeck CLI
//!
//! Configure LLM vendor sources and fetch their model lists from the shell.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "modeldeck", version, about = "Configure LLM vendor sources and their models")]
pub struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true, env = "MODELDECK_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage vendor sources
    #[command(subcommand)]
    Sources(SourcesCommand),
    /// Show or edit the setup of a source
    #[command(subcommand)]
    Setup(SetupCommand),
    /// Fetch and list models
    #[command(subcommand)]
    Models(ModelsCommand),
}

#[derive(Debug, Subcommand)]
pub enum SourcesCommand {
    /// Add a source for a vendor
    Add {
        #[arg(long, default_value = "openai")]
        vendor: String,
    },
    /// List configured sources
    List,
}

#[derive(Debug, Subcommand)]
pub enum SetupCommand {
    /// Print the setup of a source
    Show { source: String },
    /// Change setup fields of a source
    Set {
        source: String,
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        api_host: Option<String>,
        #[arg(long = "org")]
        organization_id: Option<String>,
        #[arg(long)]
        proxy_key: Option<String>,
        #[arg(long)]
        temperature: Option<f32>,
        #[arg(long = "max-tokens")]
        max_response_tokens: Option<u32>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ModelsCommand {
    /// Fetch the model list of a source from its vendor
    Fetch { source: String },
    /// List stored models, optionally for one source
    List { source: Option<String> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("modeldeck=debug".parse()?)
                .add_directive("modeldeck_core=debug".parse()?)
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("Starting Modeldeck v{}", modeldeck_core::VERSION);

    commands::run(cli).await
}
