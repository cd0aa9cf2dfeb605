use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SkGetError, fs_err};
use crate::install::remove_existing;
use crate::instructions::remove_section;
use crate::paths::{Locations, is_unsafe_skill_name};
use crate::platform::Platform;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed { path: PathBuf },
    /// The instructions file held nothing else and was deleted.
    RemovedFile { path: PathBuf },
    NotInstalled { path: PathBuf },
}

/// Deletes a skill from one location. Absent skills are reported, not errors.
pub fn remove(
    locations: &Locations,
    name: &str,
    platform: Platform,
    global: bool,
) -> Result<RemoveOutcome> {
    if is_unsafe_skill_name(name) {
        return Err(SkGetError::InvalidSkillName(name.to_string()));
    }

    let outcome = match locations.skills_dir(platform, global) {
        Some(dir) => remove_from_dir(&dir, name)?,
        None => remove_from_instructions(&locations.instructions_path(), name)?,
    };

    tracing::info!(skill = name, platform = %platform, global, outcome = ?outcome, "Skill remove finished");
    Ok(outcome)
}

fn remove_from_dir(skills_dir: &Path, name: &str) -> Result<RemoveOutcome> {
    let target = skills_dir.join(name);
    if fs::symlink_metadata(&target).is_err() {
        return Ok(RemoveOutcome::NotInstalled { path: target });
    }

    remove_existing(&target)?;

    let is_empty = fs::read_dir(skills_dir)
        .map_err(fs_err(skills_dir))?
        .next()
        .is_none();
    if is_empty {
        tracing::debug!(dir = %skills_dir.display(), "Removing empty skills directory");
        fs::remove_dir(skills_dir).map_err(fs_err(skills_dir))?;
    }

    Ok(RemoveOutcome::Removed { path: target })
}

fn remove_from_instructions(path: &Path, name: &str) -> Result<RemoveOutcome> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(RemoveOutcome::NotInstalled {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(fs_err(path)(e)),
    };

    let Some(remaining) = remove_section(&content, name) else {
        return Ok(RemoveOutcome::NotInstalled {
            path: path.to_path_buf(),
        });
    };

    if remaining.is_empty() {
        fs::remove_file(path).map_err(fs_err(path))?;
        return Ok(RemoveOutcome::RemovedFile {
            path: path.to_path_buf(),
        });
    }

    fs::write(path, remaining).map_err(fs_err(path))?;
    Ok(RemoveOutcome::Removed {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::{InstallRequest, Installer};
    use crate::platform::InstallMethod;
    use crate::remote::RepoRef;
    use crate::testing::FakeSource;
    use tempfile::TempDir;

    fn locations(cwd: &TempDir, home: &TempDir) -> Locations {
        Locations::new(cwd.path(), home.path())
    }

    #[test]
    fn missing_skill_is_soft_noop() {
        let (cwd, home) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        let loc = locations(&cwd, &home);

        let outcome = remove(&loc, "ghost", Platform::Cursor, false).unwrap();
        assert!(matches!(outcome, RemoveOutcome::NotInstalled { .. }));
        let outcome = remove(&loc, "ghost", Platform::Vscode, false).unwrap();
        assert!(matches!(outcome, RemoveOutcome::NotInstalled { .. }));
    }

    #[test]
    fn prunes_empty_platform_dir() {
        let (cwd, home) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        let loc = locations(&cwd, &home);
        let dir = loc.global_claude_skills_dir();
        fs::create_dir_all(dir.join("a")).unwrap();
        fs::create_dir_all(dir.join("b")).unwrap();

        remove(&loc, "a", Platform::Claude, true).unwrap();
        assert!(dir.join("b").exists());

        remove(&loc, "b", Platform::Claude, true).unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn deletes_instructions_file_when_last_section_goes() {
        let (cwd, home) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        let loc = locations(&cwd, &home);
        let path = loc.instructions_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "# Skill: a\nAlpha\n\n---\n\n# Skill: b\nBeta").unwrap();

        let outcome = remove(&loc, "b", Platform::Vscode, false).unwrap();
        assert!(matches!(outcome, RemoveOutcome::Removed { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Skill: a\nAlpha");

        let outcome = remove(&loc, "a", Platform::Vscode, true).unwrap();
        assert!(matches!(outcome, RemoveOutcome::RemovedFile { .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn copy_install_then_remove_leaves_library_untouched() {
        let (cwd, home) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        let loc = locations(&cwd, &home);
        let source = FakeSource::new().with_file("skills/git-commit/SKILL.md", "body");
        let repo = RepoRef::parse("https://github.com/acme/skills").unwrap();

        let mirror = loc.library_skill_dir("acme", "skills", "git-commit");
        fs::create_dir_all(&mirror).unwrap();
        fs::write(mirror.join("SKILL.md"), "mirror copy").unwrap();

        Installer::new(&source, &loc)
            .install(
                &repo,
                &InstallRequest::new("git-commit", Platform::Cursor, false, InstallMethod::Copy),
            )
            .await
            .unwrap();
        remove(&loc, "git-commit", Platform::Cursor, false).unwrap();

        let dir = loc.local_cursor_skills_dir();
        assert!(!dir.exists() || !dir.join("git-commit").exists());
        assert_eq!(fs::read_to_string(mirror.join("SKILL.md")).unwrap(), "mirror copy");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn removing_link_install_keeps_mirror() {
        let (cwd, home) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        let loc = locations(&cwd, &home);
        let source = FakeSource::new().with_file("skills/git-commit/SKILL.md", "body");
        let repo = RepoRef::parse("https://github.com/acme/skills").unwrap();

        Installer::new(&source, &loc)
            .install(
                &repo,
                &InstallRequest::new("git-commit", Platform::Claude, false, InstallMethod::Link),
            )
            .await
            .unwrap();
        remove(&loc, "git-commit", Platform::Claude, false).unwrap();

        let mirror = loc.library_skill_dir("acme", "skills", "git-commit");
        assert_eq!(fs::read_to_string(mirror.join("SKILL.md")).unwrap(), "body");
        assert!(!loc.local_claude_skills_dir().exists());
    }
}
