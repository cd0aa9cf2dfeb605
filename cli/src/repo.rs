use anyhow::{Context, Result};
use console::style;
use dialoguer::Select;
use skget_core::{Registry, RepoRef};

use crate::skills::print_repos;

#[derive(clap::Subcommand, Clone, Debug)]
pub enum RepoCommands {
    /// Register a GitHub or GitLab skill repository
    Add {
        /// Repository URL, e.g. https://github.com/owner/repo
        url: String,
    },
    /// Remove a configured repository (interactive when the URL is missing)
    #[command(alias = "remove")]
    Rm { url: Option<String> },
    /// List configured repositories
    #[command(alias = "list")]
    Ls,
    /// Switch the active repository (interactive when the URL is missing)
    Use { url: Option<String> },
}

pub fn handle_command(command: RepoCommands, registry: &mut Registry) -> Result<()> {
    match command {
        RepoCommands::Add { url } => add_repo(&url, registry),
        RepoCommands::Rm { url } => remove_repo(url, registry),
        RepoCommands::Ls => {
            println!("{}", style("Configured repositories").bold());
            print_repos(registry);
            Ok(())
        }
        RepoCommands::Use { url } => use_repo(url, registry),
    }
}

fn add_repo(url: &str, registry: &mut Registry) -> Result<()> {
    let url = RepoRef::normalize_url(url)?;

    if !registry.add_repo(&url) {
        println!("{} Repository already exists: {}", style("!").yellow(), url);
        return Ok(());
    }
    registry.save()?;

    println!("{} Added repository: {}", style("✓").green().bold(), url);
    if registry.active_repo_url() == Some(url.as_str()) {
        println!("  {}", style("Set as the active repository").dim());
    }
    Ok(())
}

fn remove_repo(url: Option<String>, registry: &mut Registry) -> Result<()> {
    let url = match url {
        Some(url) => url,
        None => match pick_repo(registry, "Select a repository to remove")? {
            Some(url) => url,
            None => return Ok(()),
        },
    };

    if !registry.remove_repo(&url) {
        println!("{} Repository not found: {}", style("!").yellow(), url);
        return Ok(());
    }
    registry.save()?;

    println!("{} Removed repository: {}", style("✓").green().bold(), url);
    match registry.active_repo_url() {
        Some(active) => println!("  Active repository: {}", active),
        None => println!("  {}", style("No repositories left").dim()),
    }
    Ok(())
}

fn use_repo(url: Option<String>, registry: &mut Registry) -> Result<()> {
    let url = match url {
        Some(url) => url,
        None => match pick_repo(registry, "Select a repository to activate")? {
            Some(url) => url,
            None => return Ok(()),
        },
    };

    if !registry.contains_repo(&url) {
        anyhow::bail!(
            "Repository not found. Add it first using `sk-get repo add {}`",
            url
        );
    }
    registry.set_active_repo_url(&url);
    registry.save()?;

    println!(
        "{} Active repository switched to: {}",
        style("✓").green().bold(),
        url
    );
    Ok(())
}

/// Prompts for one of the configured repositories. `None` when there are
/// none or the prompt was cancelled.
fn pick_repo(registry: &Registry, prompt: &str) -> Result<Option<String>> {
    if registry.repos().is_empty() {
        println!(
            "{} No repositories configured. Use `sk-get repo add <url>` to add one.",
            style("!").yellow()
        );
        return Ok(None);
    }

    let active = registry.active_repo_url();
    let items: Vec<String> = registry
        .repos()
        .iter()
        .map(|r| {
            if Some(r.url.as_str()) == active {
                format!("{} (active)", r.url)
            } else {
                r.url.clone()
            }
        })
        .collect();

    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact_opt()
        .context("Failed to read repository selection")?;

    Ok(selection.map(|i| registry.repos()[i].url.clone()))
}
