use std::path::{Path, PathBuf};

use crate::platform::Platform;

pub const SK_GET_DIR: &str = ".sk-get";
pub const INSTRUCTIONS_FILE: &str = "copilot-instructions.md";

/// The five storage locations plus the library mirror, resolved from an
/// explicit working directory and home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    cwd: PathBuf,
    home: PathBuf,
}

impl Locations {
    pub fn new(cwd: impl Into<PathBuf>, home: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            home: home.into(),
        }
    }

    /// Uses the process working directory and the user's home directory.
    pub fn from_env() -> std::io::Result<Self> {
        let cwd = std::env::current_dir()?;
        let home = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?;
        Ok(Self::new(cwd, home))
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn local_cursor_skills_dir(&self) -> PathBuf {
        self.cwd.join(".cursor").join("skills")
    }

    pub fn global_cursor_skills_dir(&self) -> PathBuf {
        self.home.join(".cursor").join("skills")
    }

    pub fn local_claude_skills_dir(&self) -> PathBuf {
        self.cwd.join(".claude").join("skills")
    }

    pub fn global_claude_skills_dir(&self) -> PathBuf {
        self.home.join(".claude").join("skills")
    }

    pub fn instructions_path(&self) -> PathBuf {
        self.cwd.join(".github").join(INSTRUCTIONS_FILE)
    }

    pub fn sk_get_dir(&self) -> PathBuf {
        self.home.join(SK_GET_DIR)
    }

    pub fn library_dir(&self) -> PathBuf {
        self.sk_get_dir().join("library")
    }

    /// Mirror directory for one skill of one repository.
    pub fn library_skill_dir(&self, owner: &str, repo: &str, skill: &str) -> PathBuf {
        let mut dir = self.library_dir();
        for segment in owner.split('/').filter(|s| !s.is_empty()) {
            dir.push(segment);
        }
        dir.join(repo).join("skills").join(skill)
    }

    /// Skills directory for a directory-based platform, `None` for vscode.
    pub fn skills_dir(&self, platform: Platform, global: bool) -> Option<PathBuf> {
        match (platform, global) {
            (Platform::Cursor, false) => Some(self.local_cursor_skills_dir()),
            (Platform::Cursor, true) => Some(self.global_cursor_skills_dir()),
            (Platform::Claude, false) => Some(self.local_claude_skills_dir()),
            (Platform::Claude, true) => Some(self.global_claude_skills_dir()),
            (Platform::Vscode, _) => None,
        }
    }
}

/// Rejects names that could escape the skills directory. Dots inside a
/// name (`notes..md`) are fine; only `.` and `..` themselves are not.
pub fn is_unsafe_skill_name(name: &str) -> bool {
    matches!(name.trim(), "." | "..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
        || name.trim().is_empty()
}
