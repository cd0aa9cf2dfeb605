use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::{Result, SkGetError};
use crate::remote::{ContentEntry, ContentSource, EntryKind, RepoRef};

const SCHEME: &str = "fake://";

/// In-memory repository keyed by file path.
#[derive(Default)]
pub struct FakeSource {
    files: BTreeMap<String, Vec<u8>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.as_bytes().to_vec());
        self
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn list_contents(&self, _repo: &RepoRef, path: &str) -> Result<Vec<ContentEntry>> {
        let prefix = format!("{}/", path.trim_matches('/'));
        let mut entries: BTreeMap<String, ContentEntry> = BTreeMap::new();

        for file in self.files.keys() {
            let Some(rest) = file.strip_prefix(&prefix) else {
                continue;
            };
            let entry = match rest.split_once('/') {
                Some((dir, _)) => ContentEntry {
                    name: dir.to_string(),
                    path: format!("{}{}", prefix, dir),
                    kind: EntryKind::Dir,
                    download_url: None,
                },
                None => ContentEntry {
                    name: rest.to_string(),
                    path: file.clone(),
                    kind: EntryKind::File,
                    download_url: Some(format!("{}{}", SCHEME, file)),
                },
            };
            entries.entry(entry.name.clone()).or_insert(entry);
        }

        if entries.is_empty() {
            return Err(SkGetError::NotFound(path.to_string()));
        }
        Ok(entries.into_values().collect())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        url.strip_prefix(SCHEME)
            .and_then(|path| self.files.get(path))
            .cloned()
            .ok_or_else(|| SkGetError::RemoteApi {
                status: 404,
                message: format!("no such file: {}", url),
            })
    }
}
