use reqwest::Url;
use serde::Deserialize;

use super::{ContentEntry, EntryKind, RepoRef, error_for_status};
use crate::error::{Result, SkGetError};

/// Tried in order; only a 404 moves on to the next one.
pub const BRANCH_CANDIDATES: [&str; 2] = ["main", "master"];

const PER_PAGE: &str = "100";
const NEXT_PAGE_HEADER: &str = "x-next-page";

#[derive(Debug, Deserialize)]
struct GitLabTreeItem {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

pub(crate) async fn list_contents(
    client: &reqwest::Client,
    api_base: &str,
    repo: &RepoRef,
    path: &str,
) -> Result<Vec<ContentEntry>> {
    let path = path.trim_matches('/');
    let mut last_error = SkGetError::NotFound(path.to_string());

    for branch in BRANCH_CANDIDATES {
        match list_branch(client, api_base, repo, path, branch).await {
            Ok(items) => {
                return items
                    .into_iter()
                    .filter_map(|item| convert(item, api_base, repo, branch).transpose())
                    .collect();
            }
            Err(e @ SkGetError::NotFound(_)) => last_error = e,
            Err(e) => return Err(e),
        }
    }

    Err(last_error)
}

/// Every page of the tree at `path` on `branch`, following `X-Next-Page`.
async fn list_branch(
    client: &reqwest::Client,
    api_base: &str,
    repo: &RepoRef,
    path: &str,
    branch: &str,
) -> Result<Vec<GitLabTreeItem>> {
    let mut items = Vec::new();
    let mut page = String::from("1");

    loop {
        let url = tree_url(api_base, repo, path, branch, &page)?;
        tracing::debug!(%url, branch, "Requesting GitLab tree");

        let response = client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(error_for_status(response, path).await);
        }

        let next = response
            .headers()
            .get(NEXT_PAGE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && *v != page)
            .map(str::to_string);
        let batch: Vec<GitLabTreeItem> = response.json().await?;
        items.extend(batch);

        match next {
            Some(next) => page = next,
            None => return Ok(items),
        }
    }
}

fn project_url(api_base: &str, repo: &RepoRef) -> Result<Url> {
    let mut url = Url::parse(api_base).map_err(|e| SkGetError::InvalidUrl {
        url: api_base.to_string(),
        reason: e.to_string(),
    })?;
    let project = format!("{}/{}", repo.owner, repo.repo);
    url.path_segments_mut()
        .map_err(|_| SkGetError::InvalidUrl {
            url: api_base.to_string(),
            reason: "cannot be used as an API base".to_string(),
        })?
        .pop_if_empty()
        .extend(["api", "v4", "projects", project.as_str()]);
    Ok(url)
}

fn tree_url(api_base: &str, repo: &RepoRef, path: &str, branch: &str, page: &str) -> Result<Url> {
    let mut url = project_url(api_base, repo)?;
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.extend(["repository", "tree"]);
    }
    url.query_pairs_mut()
        .append_pair("path", path)
        .append_pair("ref", branch)
        .append_pair("per_page", PER_PAGE)
        .append_pair("page", page);
    Ok(url)
}

/// Raw-file-by-path endpoint; the listing never returns download URLs.
pub fn raw_file_url(api_base: &str, repo: &RepoRef, path: &str, branch: &str) -> Result<Url> {
    let mut url = project_url(api_base, repo)?;
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.extend(["repository", "files", path, "raw"]);
    }
    url.query_pairs_mut().append_pair("ref", branch);
    Ok(url)
}

fn convert(
    item: GitLabTreeItem,
    api_base: &str,
    repo: &RepoRef,
    branch: &str,
) -> Result<Option<ContentEntry>> {
    let entry = match item.kind.as_str() {
        "tree" => ContentEntry {
            name: item.name,
            path: item.path,
            kind: EntryKind::Dir,
            download_url: None,
        },
        "blob" => {
            let download_url = raw_file_url(api_base, repo, &item.path, branch)?.to_string();
            ContentEntry {
                name: item.name,
                path: item.path,
                kind: EntryKind::File,
                download_url: Some(download_url),
            }
        }
        other => {
            tracing::debug!(path = %item.path, kind = other, "Skipping unsupported entry");
            return Ok(None);
        }
    };
    Ok(Some(entry))
}
