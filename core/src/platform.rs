use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::SkGetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Cursor,
    Claude,
    Vscode,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Cursor, Platform::Claude, Platform::Vscode];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Cursor => "cursor",
            Self::Claude => "claude",
            Self::Vscode => "vscode",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Cursor => "Cursor",
            Self::Claude => "Claude",
            Self::Vscode => "VSCode",
        }
    }

    /// Directory-based platforms hold one subdirectory per skill.
    pub fn is_directory_based(&self) -> bool {
        !matches!(self, Self::Vscode)
    }

    /// Human label for a storage location, e.g. `Claude (Global)`.
    pub fn location_label(&self, global: bool) -> String {
        if global && self.is_directory_based() {
            format!("{} (Global)", self.display_name())
        } else {
            self.display_name().to_string()
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Platform {
    type Err = SkGetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cursor" => Ok(Self::Cursor),
            "claude" => Ok(Self::Claude),
            "vscode" => Ok(Self::Vscode),
            other => Err(SkGetError::Config(format!(
                "Unsupported platform \"{}\". Use cursor, claude, or vscode.",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMethod {
    #[default]
    Link,
    Copy,
    Append,
}

impl fmt::Display for InstallMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link => write!(f, "link"),
            Self::Copy => write!(f, "copy"),
            Self::Append => write!(f, "append"),
        }
    }
}

impl FromStr for InstallMethod {
    type Err = SkGetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "link" => Ok(Self::Link),
            "copy" => Ok(Self::Copy),
            "append" => Ok(Self::Append),
            other => Err(SkGetError::Config(format!(
                "Unsupported install method \"{}\". Use link or copy.",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    pub platform: Platform,
    pub is_installed: bool,
}

/// Best-effort check for which assistants exist on this machine.
pub fn detect_platforms(home: &Path) -> Vec<PlatformInfo> {
    Platform::ALL
        .iter()
        .map(|&platform| PlatformInfo {
            platform,
            is_installed: platform_present(platform, home),
        })
        .collect()
}

fn platform_present(platform: Platform, home: &Path) -> bool {
    let app_bundle = match platform {
        Platform::Cursor => "/Applications/Cursor.app",
        Platform::Claude => "/Applications/Claude.app",
        Platform::Vscode => "/Applications/Visual Studio Code.app",
    };
    if cfg!(target_os = "macos") && Path::new(app_bundle).exists() {
        return true;
    }

    if cfg!(target_os = "windows")
        && platform == Platform::Cursor
        && let Ok(local) = std::env::var("LOCALAPPDATA")
        && Path::new(&local).join("Programs").join("cursor").exists()
    {
        return true;
    }

    let dot_dir = match platform {
        Platform::Cursor => ".cursor",
        Platform::Claude => ".claude",
        Platform::Vscode => ".vscode",
    };
    home.join(dot_dir).exists()
}
