use anyhow::{Context, Result};
use console::style;
use dialoguer::Confirm;
use skget_core::transfer::DEFAULT_EXPORT_FILE;
use skget_core::{ExportDocument, RepoRef, Scanner, replay_installs};
use std::path::PathBuf;

use crate::App;
use crate::skills::print_install_reports;

pub fn export(app: &App, path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| app.locations.cwd().join(DEFAULT_EXPORT_FILE));
    let document = ExportDocument::collect(&app.registry, &Scanner::new(&app.locations))?;
    document.write(&path)?;

    println!(
        "{} Exported {} repositories and {} installed skill(s) to {}",
        style("✓").green().bold(),
        document.repos.len(),
        document.installed_skills.len(),
        path.display()
    );
    Ok(())
}

pub async fn import(app: &mut App, path: Option<PathBuf>, yes: bool) -> Result<()> {
    let path = path.unwrap_or_else(|| app.locations.cwd().join(DEFAULT_EXPORT_FILE));
    if !path.exists() {
        anyhow::bail!("Config file not found at {}", path.display());
    }
    let document = ExportDocument::read(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let added = document.apply_repos(&mut app.registry);
    app.registry.save()?;
    println!(
        "{} Imported {} new repositories",
        style("✓").green().bold(),
        added
    );
    if !document.active_repo_url.is_empty() {
        println!(
            "{} Active repository: {}",
            style("✓").green().bold(),
            document.active_repo_url
        );
    }

    let skills = &document.installed_skills;
    if !skills.is_empty() {
        let install = yes
            || Confirm::new()
                .with_prompt(format!(
                    "Found {} skill(s) in the config. Install them now?",
                    skills.len()
                ))
                .default(true)
                .interact_opt()
                .context("Failed to read confirmation")?
                .unwrap_or(false);

        if install {
            let default_repo = app
                .registry
                .active_repo_url()
                .and_then(|url| RepoRef::parse(url).ok());
            let reports =
                replay_installs(&app.installer(), default_repo.as_ref(), skills).await;
            let failed = print_install_reports(&reports);
            if failed > 0 {
                println!(
                    "{} {} skill(s) could not be installed",
                    style("!").yellow(),
                    failed
                );
            }
        }
    }

    println!(
        "{} Configuration imported from {}",
        style("✓").green().bold(),
        path.display()
    );
    Ok(())
}
