use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SkGetError, fs_err};

/// Provenance sidecar stored at the root of an installed skill.
pub const METADATA_FILE: &str = ".sk-get.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillMetadata {
    pub repo_url: String,
    pub installed_at: String,
}

impl SkillMetadata {
    pub fn now(repo_url: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            installed_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

pub fn write_metadata(skill_dir: &Path, metadata: &SkillMetadata) -> Result<()> {
    let path = skill_dir.join(METADATA_FILE);
    let json = serde_json::to_string_pretty(metadata)?;
    std::fs::write(&path, json).map_err(fs_err(&path))
}

/// `Ok(None)` when the sidecar is absent.
pub fn read_metadata(skill_dir: &Path) -> Result<Option<SkillMetadata>> {
    let path = skill_dir.join(METADATA_FILE);
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SkGetError::LocalFileSystem { path, source: e }),
    }
}
