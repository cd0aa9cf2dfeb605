use anyhow::{Context, Result};
use console::style;
use dialoguer::{MultiSelect, Select};
use skget_core::manifest::load_manifest;
use skget_core::remote::list_skills;
use skget_core::{
    InstallMethod, InstallOutcome, InstallReport, InstallRequest, Platform, RemoveOutcome,
    RepoRef, Scanner, detect_platforms, remove as remove_skill,
};

use crate::{App, split_list};

pub async fn add(
    app: &App,
    skills: Option<String>,
    platforms: Option<String>,
    global: bool,
    method: Option<String>,
) -> Result<()> {
    let repo = app.active_repo()?;
    let interactive = skills.is_none();

    let skills = match skills {
        Some(list) => split_list(&list),
        None => {
            println!("{} Fetching available skills from {}", style("→").cyan(), repo.canonical_url());
            let available = list_skills(&app.client, &repo).await?;
            if available.is_empty() {
                println!("{} No skills found in the repository", style("!").yellow());
                return Ok(());
            }
            let Some(chosen) = MultiSelect::new()
                .with_prompt("Select skills to add (space to toggle)")
                .items(&available)
                .interact_opt()
                .context("Failed to read skill selection")?
            else {
                return Ok(());
            };
            chosen.into_iter().map(|i| available[i].clone()).collect()
        }
    };
    if skills.is_empty() {
        println!("{} No skill selected", style("!").yellow());
        return Ok(());
    }

    let platforms = match platforms {
        Some(list) => parse_platforms(&list)?,
        None => {
            let detected: Vec<bool> = detect_platforms(app.locations.home())
                .iter()
                .map(|info| info.is_installed)
                .collect();
            let Some(platforms) = select_platforms("Select target platforms", &detected)? else {
                return Ok(());
            };
            platforms
        }
    };
    if platforms.is_empty() {
        println!("{} No platform selected", style("!").yellow());
        return Ok(());
    }

    let has_dirs = platforms.iter().any(Platform::is_directory_based);
    let global = if interactive && !global && has_dirs {
        let Some(global) = select_scope()? else {
            return Ok(());
        };
        global
    } else {
        global
    };

    let method = match method {
        Some(method) => method.parse::<InstallMethod>()?,
        None if interactive && has_dirs => {
            let Some(method) = select_method()? else {
                return Ok(());
            };
            method
        }
        None => InstallMethod::Link,
    };

    let requests: Vec<InstallRequest> = platforms
        .iter()
        .flat_map(|&platform| {
            skills
                .iter()
                .map(move |skill| InstallRequest::new(skill, platform, global, method))
        })
        .collect();

    println!(
        "{} Adding {} skill(s) from {}",
        style("→").cyan(),
        skills.len(),
        repo.canonical_url()
    );
    let reports = app.installer().install_many(&repo, &requests).await;
    let failed = print_install_reports(&reports);
    if failed > 0 {
        anyhow::bail!("{} of {} installation(s) failed", failed, reports.len());
    }
    Ok(())
}

/// Prints one line per report. Returns how many items failed.
pub fn print_install_reports(reports: &[InstallReport]) -> usize {
    let mut failed = 0;
    for report in reports {
        let label = report.request.platform.location_label(report.request.global);
        match &report.result {
            Ok(InstallOutcome::Installed { path }) => println!(
                "{} Added {} to {} {}",
                style("✓").green().bold(),
                style(&report.request.skill).white().bold(),
                label,
                style(path.display()).dim()
            ),
            Ok(InstallOutcome::AlreadyPresent { path }) => println!(
                "{} {} is already in {}",
                style("!").yellow(),
                report.request.skill,
                path.display()
            ),
            Err(e) => {
                failed += 1;
                println!(
                    "{} Failed to add {} to {}: {}",
                    style("✗").red().bold(),
                    report.request.skill,
                    label,
                    e
                );
            }
        }
    }

    failed
}

pub fn remove(
    app: &App,
    skills: Option<String>,
    platforms: Option<String>,
    global: bool,
) -> Result<()> {
    let platforms = match platforms {
        Some(list) => parse_platforms(&list)?,
        None => {
            let Some(platforms) = select_platforms("Select platforms to remove from", &[])? else {
                return Ok(());
            };
            platforms
        }
    };
    if platforms.is_empty() {
        println!("{} No platform selected", style("!").yellow());
        return Ok(());
    }

    let scanner = Scanner::new(&app.locations);
    let pairs: Vec<(Platform, String)> = match skills {
        Some(list) => {
            let names = split_list(&list);
            platforms
                .iter()
                .flat_map(|&p| names.iter().map(move |n| (p, n.clone())))
                .collect()
        }
        None => {
            let mut installed = Vec::new();
            for &platform in &platforms {
                for name in scanner.scan_location(platform, global)? {
                    installed.push((platform, name));
                }
            }
            if installed.is_empty() {
                println!(
                    "{} No skills found on {} ({})",
                    style("!").yellow(),
                    join_labels(&platforms),
                    if global { "global" } else { "local" }
                );
                return Ok(());
            }

            let items: Vec<String> = installed
                .iter()
                .map(|(platform, name)| format!("{} [{}]", name, platform.location_label(global)))
                .collect();
            let Some(chosen) = MultiSelect::new()
                .with_prompt("Select skills to remove (space to toggle)")
                .items(&items)
                .interact_opt()
                .context("Failed to read skill selection")?
            else {
                return Ok(());
            };
            chosen.into_iter().map(|i| installed[i].clone()).collect()
        }
    };

    let mut failed = 0;
    for (platform, name) in &pairs {
        match remove_skill(&app.locations, name, *platform, global) {
            Ok(RemoveOutcome::Removed { path }) => println!(
                "{} Removed {} from {}",
                style("✓").green().bold(),
                style(name).white().bold(),
                style(path.display()).dim()
            ),
            Ok(RemoveOutcome::RemovedFile { path }) => println!(
                "{} Removed {} and the now empty {}",
                style("✓").green().bold(),
                style(name).white().bold(),
                style(path.display()).dim()
            ),
            Ok(RemoveOutcome::NotInstalled { path }) => println!(
                "{} {} is not installed at {}",
                style("!").yellow(),
                name,
                path.display()
            ),
            Err(e) => {
                failed += 1;
                println!(
                    "{} Failed to remove {} from {}: {}",
                    style("✗").red().bold(),
                    name,
                    platform.location_label(global),
                    e
                );
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} removal(s) failed", failed, pairs.len());
    }
    Ok(())
}

pub async fn list(app: &mut App, choose_repo: bool) -> Result<()> {
    if choose_repo {
        let repos: Vec<String> = app.registry.repos().iter().map(|r| r.url.clone()).collect();
        if repos.is_empty() {
            println!(
                "{} No repositories configured. Use `sk-get repo add <url>` to add one.",
                style("!").yellow()
            );
            return Ok(());
        }
        let active = app.registry.active_repo_url();
        let current = repos
            .iter()
            .position(|url| Some(url.as_str()) == active)
            .unwrap_or(0);
        let Some(index) = Select::new()
            .with_prompt("Select a repository to list skills from")
            .items(&repos)
            .default(current)
            .interact_opt()
            .context("Failed to read repository selection")?
        else {
            return Ok(());
        };
        app.registry.set_active_repo_url(&repos[index]);
        app.registry.save()?;
        println!("{} Switched to repository: {}", style("→").cyan(), repos[index]);
    }

    let Some(url) = app.registry.active_repo_url().map(str::to_string) else {
        println!(
            "{} No active repository set. Use `sk-get repo use <url>` or `sk-get list -r` to select one.",
            style("✗").red().bold()
        );
        return Ok(());
    };

    println!("{} Fetching available skills from {}", style("→").cyan(), url);
    let fetched = match RepoRef::parse(&url) {
        Ok(repo) => list_skills(&app.client, &repo).await,
        Err(e) => Err(e),
    };

    match fetched {
        Ok(skills) if skills.is_empty() => {
            println!("{} No skills found in the repository", style("!").yellow());
        }
        Ok(skills) => {
            app.registry.set_cached_skills(skills.clone());
            app.registry.save()?;
            println!(
                "{} Available skills ({})",
                style("✓").green().bold(),
                skills.len()
            );
            for skill in &skills {
                println!("  - {}", skill);
            }
        }
        Err(e) => {
            let cached = app.registry.cached_skills();
            if cached.is_empty() {
                return Err(e).context("Failed to fetch skills");
            }
            eprintln!("{} {}", style("✗").red().bold(), e);
            println!();
            println!(
                "{} Showing locally cached skills (Last updated: {})",
                style("!").yellow(),
                app.registry.last_updated()
            );
            for skill in cached {
                println!("  - {}", skill);
            }
        }
    }

    Ok(())
}

pub fn status(app: &App) -> Result<()> {
    println!();
    println!("{}", style("sk-get status").bold());
    println!();

    println!("{}", style("Repositories").cyan().bold());
    print_repos(&app.registry);
    println!();

    let scanner = Scanner::new(&app.locations);

    println!("{}", style("Local (current project)").cyan().bold());
    let local = [Platform::Cursor, Platform::Vscode, Platform::Claude];
    if !print_locations(app, &scanner, &local, false)? {
        println!("  {}", style("No local skills detected.").dim());
    }
    println!();

    println!("{}", style("Global").cyan().bold());
    if !print_locations(app, &scanner, &[Platform::Cursor, Platform::Claude], true)? {
        println!("  {}", style("No global skills detected.").dim());
    }
    println!();

    Ok(())
}

pub fn print_repos(registry: &skget_core::Registry) {
    if registry.repos().is_empty() {
        println!(
            "  {}",
            style("No repositories configured. Use `sk-get repo add <url>` to add one.").dim()
        );
        return;
    }
    let active = registry.active_repo_url();
    for repo in registry.repos() {
        if Some(repo.url.as_str()) == active {
            println!("  {} {} {}", style("*").green(), style(&repo.url).green(), style("(active)").dim());
        } else {
            println!("    {}", repo.url);
        }
    }
}

fn print_locations(
    app: &App,
    scanner: &Scanner<'_>,
    platforms: &[Platform],
    global: bool,
) -> Result<bool> {
    let mut any = false;
    for &platform in platforms {
        let names = scanner.scan_location(platform, global)?;
        let dir = app.locations.skills_dir(platform, global);
        for name in names {
            any = true;
            let description = dir
                .as_ref()
                .and_then(|dir| load_manifest(&dir.join(&name)).ok())
                .and_then(|manifest| manifest.description);
            let tag = style(format!("[{}]", platform.location_label(global))).dim();
            match description {
                Some(description) => {
                    println!("  - {} {} {}", style(&name).white().bold(), tag, description)
                }
                None => println!("  - {} {}", style(&name).white().bold(), tag),
            }
        }
    }
    Ok(any)
}

fn parse_platforms(list: &str) -> Result<Vec<Platform>> {
    let mut platforms = Vec::new();
    for item in split_list(list) {
        let platform: Platform = item.parse()?;
        if !platforms.contains(&platform) {
            platforms.push(platform);
        }
    }
    Ok(platforms)
}

fn select_platforms(prompt: &str, defaults: &[bool]) -> Result<Option<Vec<Platform>>> {
    let items: Vec<&str> = Platform::ALL.iter().map(Platform::display_name).collect();
    let chosen = MultiSelect::new()
        .with_prompt(format!("{} (space to toggle)", prompt))
        .items(&items)
        .defaults(defaults)
        .interact_opt()
        .context("Failed to read platform selection")?;
    Ok(chosen.map(|indices| indices.into_iter().map(|i| Platform::ALL[i]).collect()))
}

fn select_scope() -> Result<Option<bool>> {
    let selection = Select::new()
        .with_prompt("Install scope for cursor and claude")
        .items(&["Local (current project)", "Global (home directory)"])
        .default(0)
        .interact_opt()
        .context("Failed to read scope selection")?;
    Ok(selection.map(|i| i == 1))
}

fn select_method() -> Result<Option<InstallMethod>> {
    let selection = Select::new()
        .with_prompt("Installation method")
        .items(&[
            "link - symlink into the shared library, refreshed by running add again",
            "copy - standalone files in the project",
        ])
        .default(0)
        .interact_opt()
        .context("Failed to read method selection")?;
    Ok(selection.map(|i| {
        if i == 0 {
            InstallMethod::Link
        } else {
            InstallMethod::Copy
        }
    }))
}

fn join_labels(platforms: &[Platform]) -> String {
    platforms
        .iter()
        .map(Platform::id)
        .collect::<Vec<_>>()
        .join(", ")
}
