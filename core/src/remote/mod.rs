pub mod github;
pub mod gitlab;

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SkGetError};

pub const USER_AGENT: &str = "sk-get-cli";
pub const SKILLS_ROOT: &str = "skills";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    GitHub,
    GitLab,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GitHub => write!(f, "GitHub"),
            Self::GitLab => write!(f, "GitLab"),
        }
    }
}

/// A parsed repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub provider: Provider,
    pub host: String,
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = |reason: &str| SkGetError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(SkGetError::Configuration);
        }
        let trimmed = trimmed.trim_end_matches('/');
        let clean = trimmed.strip_suffix(".git").unwrap_or(trimmed);

        let parsed = Url::parse(clean).map_err(|e| invalid(&e.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| invalid("missing host"))?
            .to_lowercase();

        let provider = if host == "github.com" || host == "www.github.com" {
            Provider::GitHub
        } else if host.contains("gitlab") {
            Provider::GitLab
        } else {
            return Err(invalid(
                "only GitHub and GitLab repositories are supported",
            ));
        };

        let parts: Vec<&str> = parsed
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        if parts.len() < 2 {
            return Err(invalid("expected https://<host>/<owner>/<repo>"));
        }

        let (owner, repo) = match provider {
            Provider::GitHub => (parts[0].to_string(), parts[1].to_string()),
            Provider::GitLab => {
                let (last, groups) = parts.split_last().ok_or_else(|| invalid("empty path"))?;
                (groups.join("/"), last.to_string())
            }
        };

        Ok(Self {
            provider,
            host: host.trim_start_matches("www.").to_string(),
            owner,
            repo,
        })
    }

    /// Validates `url` and returns it without a trailing `/` or `.git`.
    pub fn normalize_url(url: &str) -> Result<String> {
        Self::parse(url)?;
        let trimmed = url.trim().trim_end_matches('/');
        Ok(trimmed.strip_suffix(".git").unwrap_or(trimmed).to_string())
    }

    /// `https://<host>/<owner>/<repo>` with no `.git` suffix.
    pub fn canonical_url(&self) -> String {
        format!("https://{}/{}/{}", self.host, self.owner, self.repo)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    pub download_url: Option<String>,
}

impl ContentEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Read access to a skill repository. The install engine only talks to this.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Entries one level below `path` in `repo`.
    async fn list_contents(&self, repo: &RepoRef, path: &str) -> Result<Vec<ContentEntry>>;

    async fn download(&self, url: &str) -> Result<Vec<u8>>;

    async fn download_text(&self, url: &str) -> Result<String> {
        let bytes = self.download(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// reqwest-backed client for the GitHub contents API and the GitLab
/// repository-tree API.
pub struct RemoteClient {
    client: reqwest::Client,
    github_api_base: Option<String>,
    gitlab_api_base: Option<String>,
}

impl RemoteClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            github_api_base: None,
            gitlab_api_base: None,
        })
    }

    pub fn with_github_api_base(mut self, base_url: impl Into<String>) -> Self {
        self.github_api_base = Some(base_url.into());
        self
    }

    pub fn with_gitlab_api_base(mut self, base_url: impl Into<String>) -> Self {
        self.gitlab_api_base = Some(base_url.into());
        self
    }

    fn github_base(&self) -> &str {
        self.github_api_base
            .as_deref()
            .unwrap_or(github::DEFAULT_API_BASE)
    }

    fn gitlab_base(&self, repo: &RepoRef) -> String {
        self.gitlab_api_base
            .clone()
            .unwrap_or_else(|| format!("https://{}", repo.host))
    }
}

#[async_trait]
impl ContentSource for RemoteClient {
    async fn list_contents(&self, repo: &RepoRef, path: &str) -> Result<Vec<ContentEntry>> {
        tracing::debug!(provider = %repo.provider, owner = %repo.owner, repo = %repo.repo, path, "Listing remote contents");
        match repo.provider {
            Provider::GitHub => {
                github::list_contents(&self.client, self.github_base(), repo, path).await
            }
            Provider::GitLab => {
                gitlab::list_contents(&self.client, &self.gitlab_base(repo), repo, path).await
            }
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!(url, "Downloading file");
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(SkGetError::RemoteApi {
                status: status.as_u16(),
                message: format!(
                    "Failed to download file: {}",
                    status.canonical_reason().unwrap_or("unknown error")
                ),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Turns a non-success response into `NotFound` (404) or `RemoteApi`.
pub(crate) async fn error_for_status(response: reqwest::Response, path: &str) -> SkGetError {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return SkGetError::NotFound(path.to_string());
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    SkGetError::RemoteApi {
        status: status.as_u16(),
        message,
    }
}

/// Names of the skill directories under `skills/`.
pub async fn list_skills(source: &dyn ContentSource, repo: &RepoRef) -> Result<Vec<String>> {
    let entries = source.list_contents(repo, SKILLS_ROOT).await?;
    Ok(entries
        .into_iter()
        .filter(ContentEntry::is_dir)
        .map(|e| e.name)
        .collect())
}

pub fn skill_path(skill: &str) -> String {
    format!("{}/{}", SKILLS_ROOT, skill)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_github_url() {
        let repo = RepoRef::parse("https://github.com/acme/skills").unwrap();
        assert_eq!(repo.provider, Provider::GitHub);
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.repo, "skills");
        assert_eq!(repo.canonical_url(), "https://github.com/acme/skills");
    }

    #[test]
    fn git_suffix_is_stripped() {
        for (with, without) in [
            ("https://github.com/acme/skills.git", "https://github.com/acme/skills"),
            ("https://gitlab.com/team/tools.git", "https://gitlab.com/team/tools"),
            ("https://github.com/acme/skills.git/", "https://github.com/acme/skills/"),
        ] {
            assert_eq!(RepoRef::parse(with).unwrap(), RepoRef::parse(without).unwrap());
        }
    }

    #[test]
    fn parses_gitlab_subgroups() {
        let repo = RepoRef::parse("https://gitlab.example.org/org/team/skills").unwrap();
        assert_eq!(repo.provider, Provider::GitLab);
        assert_eq!(repo.host, "gitlab.example.org");
        assert_eq!(repo.owner, "org/team");
        assert_eq!(repo.repo, "skills");
    }

    #[test]
    fn rejects_unsupported_hosts() {
        for url in [
            "https://bitbucket.org/acme/skills",
            "https://example.com/acme/skills.git",
        ] {
            assert!(matches!(
                RepoRef::parse(url),
                Err(SkGetError::InvalidUrl { .. })
            ));
        }
    }

    #[test]
    fn rejects_missing_repo_segment() {
        assert!(matches!(
            RepoRef::parse("https://github.com/acme"),
            Err(SkGetError::InvalidUrl { .. })
        ));
        assert!(matches!(
            RepoRef::parse("not a url"),
            Err(SkGetError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn normalize_strips_suffix_only() {
        assert_eq!(
            RepoRef::normalize_url("https://github.com/Acme/Skills.git").unwrap(),
            "https://github.com/Acme/Skills"
        );
        assert!(RepoRef::normalize_url("https://example.com/a/b").is_err());
    }

    #[test]
    fn empty_url_is_configuration_error() {
        assert!(matches!(RepoRef::parse("  "), Err(SkGetError::Configuration)));
    }
}
