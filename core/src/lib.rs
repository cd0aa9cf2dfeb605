pub mod config;
pub mod error;
pub mod install;
pub mod installed;
pub mod instructions;
pub mod manifest;
pub mod metadata;
pub mod paths;
pub mod platform;
pub mod remote;
pub mod remove;
pub mod transfer;

#[cfg(test)]
mod testing;

pub use config::{Registry, RepoEntry};
pub use error::{Result, SkGetError};
pub use install::{InstallOutcome, InstallReport, InstallRequest, Installer};
pub use installed::{InstalledSkill, Scanner};
pub use paths::Locations;
pub use platform::{InstallMethod, Platform, PlatformInfo, detect_platforms};
pub use remote::{ContentEntry, ContentSource, EntryKind, Provider, RemoteClient, RepoRef};
pub use remove::{RemoveOutcome, remove};
pub use transfer::{ExportDocument, replay_installs};
