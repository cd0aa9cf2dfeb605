use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SkGetError {
    #[error(
        "Repository URL is not set. Use `sk-get repo add <url>` or `sk-get repo use <url>` to configure one."
    )]
    Configuration,

    #[error("Invalid repository URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Remote API error {status}: {message}")]
    RemoteApi { status: u16, message: String },

    #[error("Path \"{0}\" not found in repository.")]
    NotFound(String),

    #[error("Skill \"{0}\" not found in repository.")]
    SkillNotFound(String),

    #[error("Invalid skill name: {0}")]
    InvalidSkillName(String),

    #[error("{asset} not found in skill \"{skill}\".")]
    SkillAssetMissing { skill: String, asset: String },

    #[error("Filesystem error at {}: {source}", path.display())]
    LocalFileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SkGetError>;

/// Builds a `map_err` adapter that tags an io error with the path it touched.
pub(crate) fn fs_err(path: &Path) -> impl FnOnce(std::io::Error) -> SkGetError + '_ {
    move |source| SkGetError::LocalFileSystem {
        path: path.to_path_buf(),
        source,
    }
}

impl SkGetError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::SkillNotFound(_))
    }
}
