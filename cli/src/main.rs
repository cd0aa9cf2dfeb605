use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use skget_core::{Installer, Locations, Registry, RemoteClient, RepoRef};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod repo;
mod skills;
mod transfer;

#[derive(Parser)]
#[command(name = "sk-get")]
#[command(version)]
#[command(about = "sk-get - Install and manage AI agent skills from GitHub and GitLab repositories", long_about = None)]
struct Cli {
    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show configured repositories and installed skills
    Status,
    /// List the skills available in the active repository
    #[command(alias = "ls")]
    List {
        /// Choose a repository first, then list its skills
        #[arg(short, long)]
        repo: bool,
    },
    /// Install skills (interactive when arguments are missing)
    Add {
        /// Skill names, comma separated
        skills: Option<String>,
        /// Platforms (cursor, claude, vscode), comma separated
        platforms: Option<String>,
        /// Install into the home directory (cursor and claude only)
        #[arg(short, long)]
        global: bool,
        /// Installation method
        #[arg(short, long, value_parser = ["link", "copy"])]
        method: Option<String>,
    },
    /// Remove installed skills (interactive when arguments are missing)
    #[command(alias = "remove")]
    Rm {
        /// Skill names, comma separated
        skills: Option<String>,
        /// Platforms (cursor, claude, vscode), comma separated
        platforms: Option<String>,
        /// Remove from the home directory (cursor and claude only)
        #[arg(short, long)]
        global: bool,
    },
    /// Manage skill repository sources
    #[command(subcommand)]
    Repo(repo::RepoCommands),
    /// Export or import repositories and installed skills
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Clone, Debug)]
enum ConfigCommands {
    /// Write repositories and installed skills to a JSON file
    Export {
        /// Output path (defaults to ./sk-get-config.json)
        path: Option<PathBuf>,
    },
    /// Register repositories and reinstall skills from a JSON file
    Import {
        /// Input path (defaults to ./sk-get-config.json)
        path: Option<PathBuf>,
        /// Install recorded skills without asking
        #[arg(short, long)]
        yes: bool,
    },
}

/// Per-invocation state shared by every command.
pub struct App {
    pub registry: Registry,
    pub locations: Locations,
    pub client: RemoteClient,
}

impl App {
    fn load() -> Result<Self> {
        let registry = Registry::load_default()?;
        let locations =
            Locations::from_env().context("Could not determine working or home directory")?;
        tracing::debug!(
            config = %registry.path().display(),
            cwd = %locations.cwd().display(),
            "Starting sk-get"
        );

        Ok(Self {
            registry,
            locations,
            client: RemoteClient::new().context("Failed to build HTTP client")?,
        })
    }

    pub fn active_repo(&self) -> Result<RepoRef> {
        Ok(RepoRef::parse(self.registry.repo_url()?)?)
    }

    pub fn installer(&self) -> Installer<'_> {
        Installer::new(&self.client, &self.locations)
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command.unwrap_or(Commands::Status)).await {
        eprintln!("{} {:#}", style("✗").red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<()> {
    let mut app = App::load()?;

    match command {
        Commands::Status => skills::status(&app),
        Commands::List { repo } => skills::list(&mut app, repo).await,
        Commands::Add {
            skills,
            platforms,
            global,
            method,
        } => skills::add(&app, skills, platforms, global, method).await,
        Commands::Rm {
            skills,
            platforms,
            global,
        } => skills::remove(&app, skills, platforms, global),
        Commands::Repo(command) => repo::handle_command(command, &mut app.registry),
        Commands::Config(ConfigCommands::Export { path }) => transfer::export(&app, path),
        Commands::Config(ConfigCommands::Import { path, yes }) => {
            transfer::import(&mut app, path, yes).await
        }
    }
}

/// Splits a comma separated argument, dropping blanks and duplicates.
pub fn split_list(value: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !items.iter().any(|existing| existing == item) {
            items.push(item.to_string());
        }
    }
    items
}
