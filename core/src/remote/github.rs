use reqwest::Url;
use serde::Deserialize;

use super::{ContentEntry, EntryKind, RepoRef, error_for_status};
use crate::error::{Result, SkGetError};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Deserialize)]
struct GitHubContent {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    download_url: Option<String>,
}

/// The contents endpoint answers with an object when `path` is a file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GitHubListing {
    Many(Vec<GitHubContent>),
    One(GitHubContent),
}

pub(crate) async fn list_contents(
    client: &reqwest::Client,
    api_base: &str,
    repo: &RepoRef,
    path: &str,
) -> Result<Vec<ContentEntry>> {
    let url = contents_url(api_base, repo, path)?;
    tracing::debug!(%url, "Requesting GitHub contents");

    let response = client
        .get(url)
        .header("Accept", "application/vnd.github.v3+json")
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(error_for_status(response, path).await);
    }

    let listing: GitHubListing = response.json().await?;
    let items = match listing {
        GitHubListing::Many(items) => items,
        GitHubListing::One(item) => vec![item],
    };

    Ok(items.into_iter().filter_map(convert).collect())
}

/// `{base}/repos/{owner}/{repo}/contents/{path}` with every segment encoded.
fn contents_url(api_base: &str, repo: &RepoRef, path: &str) -> Result<Url> {
    let mut url = Url::parse(api_base).map_err(|e| SkGetError::InvalidUrl {
        url: api_base.to_string(),
        reason: e.to_string(),
    })?;
    url.path_segments_mut()
        .map_err(|_| SkGetError::InvalidUrl {
            url: api_base.to_string(),
            reason: "cannot be used as an API base".to_string(),
        })?
        .pop_if_empty()
        .extend(["repos", repo.owner.as_str(), repo.repo.as_str(), "contents"])
        .extend(path.split('/').filter(|s| !s.is_empty()));
    Ok(url)
}

fn convert(item: GitHubContent) -> Option<ContentEntry> {
    let kind = match item.kind.as_str() {
        "file" => EntryKind::File,
        "dir" => EntryKind::Dir,
        other => {
            tracing::debug!(path = %item.path, kind = other, "Skipping unsupported entry");
            return None;
        }
    };

    Some(ContentEntry {
        name: item.name,
        path: item.path,
        kind,
        download_url: item.download_url,
    })
}
