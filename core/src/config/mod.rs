use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SkGetError, fs_err};
use crate::paths::SK_GET_DIR;

const CONFIG_ENV: &str = "SK_GET_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoEntry {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryData {
    pub active_repo_url: String,
    pub cached_skills: Vec<String>,
    pub last_updated: String,
    pub repos: Vec<RepoEntry>,
}

/// Known repositories, the active one, and the last listed skill names.
///
/// Loaded once per invocation; every mutating call is followed by `save`.
#[derive(Debug, Clone)]
pub struct Registry {
    path: PathBuf,
    data: RegistryData,
}

pub fn get_sk_get_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(SK_GET_DIR)
}

pub fn get_config_path() -> PathBuf {
    match std::env::var(CONFIG_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => get_sk_get_dir().join("config.toml"),
    }
}

impl Registry {
    /// Loads the registry at `path`, starting empty if the file is missing.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                SkGetError::Config(format!(
                    "Failed to parse config from {}: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RegistryData::default(),
            Err(e) => return Err(fs_err(&path)(e)),
        };
        tracing::debug!(path = %path.display(), repos = data.repos.len(), "Registry loaded");
        Ok(Self { path, data })
    }

    pub fn load_default() -> Result<Self> {
        Self::load(get_config_path())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(fs_err(parent))?;
        }
        let content = toml::to_string_pretty(&self.data)
            .map_err(|e| SkGetError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&self.path, content).map_err(fs_err(&self.path))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn repos(&self) -> &[RepoEntry] {
        &self.data.repos
    }

    pub fn contains_repo(&self, url: &str) -> bool {
        self.data.repos.iter().any(|r| r.url == url)
    }

    pub fn active_repo_url(&self) -> Option<&str> {
        Some(self.data.active_repo_url.as_str()).filter(|u| !u.is_empty())
    }

    /// Active repository or `Configuration` error when none is set.
    pub fn repo_url(&self) -> Result<&str> {
        self.active_repo_url().ok_or(SkGetError::Configuration)
    }

    pub fn set_active_repo_url(&mut self, url: &str) {
        self.data.active_repo_url = url.to_string();
    }

    /// Adds the repository if unknown and makes it active.
    pub fn set_repo_url(&mut self, url: &str) {
        if !self.contains_repo(url) {
            self.data.repos.push(RepoEntry {
                url: url.to_string(),
            });
        }
        self.set_active_repo_url(url);
    }

    /// Returns `false` when the URL was already registered.
    pub fn add_repo(&mut self, url: &str) -> bool {
        if self.contains_repo(url) {
            return false;
        }
        self.data.repos.push(RepoEntry {
            url: url.to_string(),
        });
        if self.active_repo_url().is_none() {
            self.set_active_repo_url(url);
        }
        true
    }

    /// Returns `false` when nothing matched. Removing the active repository
    /// activates the first remaining one, or none.
    pub fn remove_repo(&mut self, url: &str) -> bool {
        let before = self.data.repos.len();
        self.data.repos.retain(|r| r.url != url);
        if self.data.repos.len() == before {
            return false;
        }
        if self.data.active_repo_url == url {
            self.data.active_repo_url = self
                .data
                .repos
                .first()
                .map(|r| r.url.clone())
                .unwrap_or_default();
        }
        true
    }

    pub fn cached_skills(&self) -> &[String] {
        &self.data.cached_skills
    }

    pub fn last_updated(&self) -> &str {
        &self.data.last_updated
    }

    pub fn set_cached_skills(&mut self, skills: Vec<String>) {
        self.data.cached_skills = skills;
        self.data.last_updated = chrono::Utc::now().to_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry(tmp: &TempDir) -> Registry {
        Registry::load(tmp.path().join("config.toml")).unwrap()
    }

    #[test]
    fn missing_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let reg = registry(&tmp);
        assert!(reg.repos().is_empty());
        assert!(matches!(reg.repo_url(), Err(SkGetError::Configuration)));
    }

    #[test]
    fn first_added_repo_becomes_active() {
        let tmp = TempDir::new().unwrap();
        let mut reg = registry(&tmp);
        assert!(reg.add_repo("https://github.com/acme/skills"));
        assert!(reg.add_repo("https://github.com/acme/other"));
        assert!(!reg.add_repo("https://github.com/acme/skills"));
        assert_eq!(reg.active_repo_url(), Some("https://github.com/acme/skills"));
        assert_eq!(reg.repos().len(), 2);
    }

    #[test]
    fn removing_active_falls_back_to_first_remaining() {
        let tmp = TempDir::new().unwrap();
        let mut reg = registry(&tmp);
        reg.add_repo("https://github.com/a/one");
        reg.add_repo("https://github.com/a/two");
        assert!(reg.remove_repo("https://github.com/a/one"));
        assert_eq!(reg.active_repo_url(), Some("https://github.com/a/two"));
        assert!(reg.remove_repo("https://github.com/a/two"));
        assert_eq!(reg.active_repo_url(), None);
        assert!(!reg.remove_repo("https://github.com/a/two"));
    }

    #[test]
    fn set_repo_url_adds_and_activates() {
        let tmp = TempDir::new().unwrap();
        let mut reg = registry(&tmp);
        reg.add_repo("https://github.com/a/one");
        reg.set_repo_url("https://gitlab.com/b/two");
        assert_eq!(reg.active_repo_url(), Some("https://gitlab.com/b/two"));
        assert_eq!(reg.repos().len(), 2);
    }

    #[test]
    fn persists_across_loads() {
        let tmp = TempDir::new().unwrap();
        let mut reg = registry(&tmp);
        reg.add_repo("https://github.com/acme/skills");
        reg.set_cached_skills(vec!["git-commit".into(), "hello-world".into()]);
        reg.save().unwrap();

        let reloaded = registry(&tmp);
        assert_eq!(reloaded.active_repo_url(), Some("https://github.com/acme/skills"));
        assert_eq!(reloaded.cached_skills(), ["git-commit", "hello-world"]);
        assert!(!reloaded.last_updated().is_empty());
    }

    #[test]
    fn corrupt_file_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "repos = 12 = x").unwrap();
        assert!(matches!(Registry::load(&path), Err(SkGetError::Config(_))));
    }
}
