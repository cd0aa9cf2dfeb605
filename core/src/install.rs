use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SkGetError, fs_err};
use crate::instructions::append_section;
use crate::manifest::SKILL_FILE;
use crate::metadata::{SkillMetadata, write_metadata};
use crate::paths::{Locations, is_unsafe_skill_name};
use crate::platform::{InstallMethod, Platform};
use crate::remote::{ContentEntry, ContentSource, EntryKind, RepoRef, skill_path};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub skill: String,
    pub platform: Platform,
    pub global: bool,
    pub method: InstallMethod,
}

impl InstallRequest {
    pub fn new(
        skill: impl Into<String>,
        platform: Platform,
        global: bool,
        method: InstallMethod,
    ) -> Self {
        Self {
            skill: skill.into(),
            platform,
            global,
            method,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed { path: PathBuf },
    /// The instructions file already contains this skill's text.
    AlreadyPresent { path: PathBuf },
}

#[derive(Debug)]
pub struct InstallReport {
    pub request: InstallRequest,
    pub result: Result<InstallOutcome>,
}

/// Fetches skills from a repository and materializes them on disk.
pub struct Installer<'a> {
    source: &'a dyn ContentSource,
    locations: &'a Locations,
}

impl<'a> Installer<'a> {
    pub fn new(source: &'a dyn ContentSource, locations: &'a Locations) -> Self {
        Self { source, locations }
    }

    pub async fn install(&self, repo: &RepoRef, request: &InstallRequest) -> Result<InstallOutcome> {
        let name = request.skill.as_str();
        if is_unsafe_skill_name(name) {
            return Err(SkGetError::InvalidSkillName(name.to_string()));
        }

        let target_root = self.locations.skills_dir(request.platform, request.global);

        let contents = self
            .source
            .list_contents(repo, &skill_path(name))
            .await
            .map_err(|e| match e {
                SkGetError::NotFound(_) => SkGetError::SkillNotFound(name.to_string()),
                other => other,
            })?;

        let outcome = match target_root {
            None => self.append_to_instructions(name, &contents).await?,
            Some(root) => {
                let target = root.join(name);
                match request.method {
                    InstallMethod::Copy => self.install_copy(repo, contents, &target).await?,
                    InstallMethod::Link | InstallMethod::Append => {
                        self.install_link(repo, name, contents, &target).await?
                    }
                }
            }
        };

        tracing::info!(
            skill = name,
            platform = %request.platform,
            global = request.global,
            method = %request.method,
            "Skill install finished"
        );
        Ok(outcome)
    }

    /// Runs each request in order; one failure does not stop the rest.
    pub async fn install_many(&self, repo: &RepoRef, requests: &[InstallRequest]) -> Vec<InstallReport> {
        let mut reports = Vec::with_capacity(requests.len());
        for request in requests {
            let result = self.install(repo, request).await;
            if let Err(e) = &result {
                tracing::warn!(skill = %request.skill, platform = %request.platform, error = %e, "Skill install failed");
            }
            reports.push(InstallReport {
                request: request.clone(),
                result,
            });
        }
        reports
    }

    async fn append_to_instructions(
        &self,
        name: &str,
        contents: &[ContentEntry],
    ) -> Result<InstallOutcome> {
        let path = self.locations.instructions_path();
        let download_url = contents
            .iter()
            .find(|e| e.is_file() && e.name == SKILL_FILE)
            .and_then(|e| e.download_url.as_deref())
            .ok_or_else(|| SkGetError::SkillAssetMissing {
                skill: name.to_string(),
                asset: SKILL_FILE.to_string(),
            })?;

        let skill_content = self.source.download_text(download_url).await?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(fs_err(parent))?;
        }
        let existing = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(fs_err(&path)(e)),
        };

        match append_section(&existing, name, &skill_content) {
            None => Ok(InstallOutcome::AlreadyPresent { path }),
            Some(updated) => {
                fs::write(&path, updated).map_err(fs_err(&path))?;
                Ok(InstallOutcome::Installed { path })
            }
        }
    }

    async fn install_copy(
        &self,
        repo: &RepoRef,
        contents: Vec<ContentEntry>,
        target: &Path,
    ) -> Result<InstallOutcome> {
        remove_existing(target)?;
        let files = self.download_tree(repo, contents, target).await?;
        tracing::debug!(files, target = %target.display(), "Copied skill files");

        if let Err(e) = write_metadata(target, &SkillMetadata::now(repo.canonical_url())) {
            tracing::warn!(target = %target.display(), error = %e, "Could not write skill metadata");
        }

        Ok(InstallOutcome::Installed {
            path: target.to_path_buf(),
        })
    }

    async fn install_link(
        &self,
        repo: &RepoRef,
        name: &str,
        contents: Vec<ContentEntry>,
        target: &Path,
    ) -> Result<InstallOutcome> {
        let mirror = self
            .locations
            .library_skill_dir(&repo.owner, &repo.repo, name);
        let files = self.download_tree(repo, contents, &mirror).await?;
        tracing::debug!(files, mirror = %mirror.display(), "Refreshed library mirror");

        if let Err(e) = write_metadata(&mirror, &SkillMetadata::now(repo.canonical_url())) {
            tracing::warn!(mirror = %mirror.display(), error = %e, "Could not write skill metadata");
        }

        remove_existing(target)?;
        fs::create_dir_all(target).map_err(fs_err(target))?;

        let mut entries: Vec<_> = fs::read_dir(&mirror)
            .map_err(fs_err(&mirror))?
            .collect::<std::io::Result<_>>()
            .map_err(fs_err(&mirror))?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let source = entry.path();
            let link = target.join(entry.file_name());
            let is_dir = fs::metadata(&source).map_err(fs_err(&source))?.is_dir();
            create_symlink(&source, &link, is_dir)?;
        }

        Ok(InstallOutcome::Installed {
            path: target.to_path_buf(),
        })
    }

    /// Mirrors a remote directory under `target`, one listing call per
    /// directory level. Existing files at the same paths are overwritten.
    async fn download_tree(
        &self,
        repo: &RepoRef,
        contents: Vec<ContentEntry>,
        target: &Path,
    ) -> Result<usize> {
        let mut pending = vec![(contents, target.to_path_buf())];
        let mut files = 0;

        while let Some((entries, dir)) = pending.pop() {
            fs::create_dir_all(&dir).map_err(fs_err(&dir))?;

            for entry in entries {
                if is_unsafe_skill_name(&entry.name) {
                    tracing::warn!(path = %entry.path, "Skipping entry with unsafe name");
                    continue;
                }
                let path = dir.join(&entry.name);
                match entry.kind {
                    EntryKind::File => {
                        let Some(url) = entry.download_url.as_deref() else {
                            tracing::debug!(path = %entry.path, "File has no download URL");
                            continue;
                        };
                        let bytes = self.source.download(url).await?;
                        fs::write(&path, bytes).map_err(fs_err(&path))?;
                        files += 1;
                    }
                    EntryKind::Dir => {
                        let sub = self.source.list_contents(repo, &entry.path).await?;
                        pending.push((sub, path));
                    }
                }
            }
        }

        Ok(files)
    }
}

/// Deletes a file, symlink or directory tree if present.
pub(crate) fn remove_existing(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).map_err(fs_err(path)),
        Ok(_) => fs::remove_file(path).map_err(fs_err(path)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(fs_err(path)(e)),
    }
}

#[cfg(unix)]
fn create_symlink(source: &Path, link: &Path, _is_dir: bool) -> Result<()> {
    std::os::unix::fs::symlink(source, link).map_err(fs_err(link))
}

#[cfg(windows)]
fn create_symlink(source: &Path, link: &Path, is_dir: bool) -> Result<()> {
    if is_dir {
        std::os::windows::fs::symlink_dir(source, link).map_err(fs_err(link))
    } else {
        std::os::windows::fs::symlink_file(source, link).map_err(fs_err(link))
    }
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_source: &Path, link: &Path, _is_dir: bool) -> Result<()> {
    Err(SkGetError::LocalFileSystem {
        path: link.to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "symbolic links are not supported on this platform",
        ),
    })
}
