use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{Registry, RepoEntry};
use crate::error::{Result, SkGetError, fs_err};
use crate::install::{InstallRequest, InstallReport, Installer};
use crate::installed::{InstalledSkill, Scanner};
use crate::platform::InstallMethod;
use crate::remote::RepoRef;

pub const DEFAULT_EXPORT_FILE: &str = "sk-get-config.json";

/// Portable snapshot of repositories and installed skills.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportDocument {
    pub repos: Vec<RepoEntry>,
    pub active_repo_url: String,
    pub installed_skills: Vec<InstalledSkill>,
}

impl ExportDocument {
    pub fn collect(registry: &Registry, scanner: &Scanner<'_>) -> Result<Self> {
        Ok(Self {
            repos: registry.repos().to_vec(),
            active_repo_url: registry.active_repo_url().unwrap_or_default().to_string(),
            installed_skills: scanner.scan_detailed()?,
        })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(fs_err(path))
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(fs_err(path))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Registers the document's repositories and active repository. Returns
    /// how many repositories were new. The caller saves the registry.
    pub fn apply_repos(&self, registry: &mut Registry) -> usize {
        let added = self
            .repos
            .iter()
            .filter(|r| registry.add_repo(&r.url))
            .count();
        if !self.active_repo_url.is_empty() {
            registry.set_active_repo_url(&self.active_repo_url);
        }
        added
    }
}

/// Installs recorded skills again. Each skill uses its own recorded origin
/// when present, otherwise `default_repo`.
pub async fn replay_installs(
    installer: &Installer<'_>,
    default_repo: Option<&RepoRef>,
    skills: &[InstalledSkill],
) -> Vec<InstallReport> {
    let mut reports = Vec::with_capacity(skills.len());

    for skill in skills {
        let method = match skill.method {
            InstallMethod::Append => InstallMethod::Link,
            other => other,
        };
        let request = InstallRequest::new(&skill.name, skill.platform, skill.global, method);

        let repo = match skill.repo_url.as_deref() {
            Some(url) => RepoRef::parse(url),
            None => default_repo.cloned().ok_or(SkGetError::Configuration),
        };
        let result = match repo {
            Ok(repo) => installer.install(&repo, &request).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            tracing::warn!(skill = %skill.name, error = %e, "Replaying install failed");
        }
        reports.push(InstallReport { request, result });
    }

    reports
}
