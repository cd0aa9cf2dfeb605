use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, fs_err};
use crate::metadata::read_metadata;
use crate::paths::Locations;
use crate::platform::{InstallMethod, Platform};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledSkill {
    pub name: String,
    pub platform: Platform,
    pub global: bool,
    pub method: InstallMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
}

/// Names of subdirectories and symlinks in `dir`, sorted. Plain files are
/// ignored; a missing directory yields nothing.
pub fn installed_in_dir(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(fs_err(dir)(e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(fs_err(dir))?;
        let file_type = entry.file_type().map_err(fs_err(&entry.path()))?;
        if (file_type.is_dir() || file_type.is_symlink())
            && let Some(name) = entry.file_name().to_str()
        {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Section names found in the instructions file, in file order.
pub fn instructions_skills(path: &Path) -> Result<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(crate::instructions::section_names(&content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(fs_err(path)(e)),
    }
}

/// Reconstructs installations from the five storage locations alone.
pub struct Scanner<'a> {
    locations: &'a Locations,
}

impl<'a> Scanner<'a> {
    pub fn new(locations: &'a Locations) -> Self {
        Self { locations }
    }

    /// Skill names present in one location. `global` is ignored for vscode.
    pub fn scan_location(&self, platform: Platform, global: bool) -> Result<Vec<String>> {
        match self.locations.skills_dir(platform, global) {
            Some(dir) => installed_in_dir(&dir),
            None => instructions_skills(&self.locations.instructions_path()),
        }
    }

    /// Skill name to de-duplicated location labels, local locations first.
    pub fn scan_with_locations(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let order = [
            (Platform::Cursor, false),
            (Platform::Claude, false),
            (Platform::Vscode, false),
            (Platform::Cursor, true),
            (Platform::Claude, true),
        ];

        let mut result: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (platform, global) in order {
            let label = platform.location_label(global);
            for skill in self.scan_location(platform, global)? {
                let labels = result.entry(skill).or_default();
                if !labels.contains(&label) {
                    labels.push(label.clone());
                }
            }
        }
        Ok(result)
    }

    /// Every distinct installed skill name.
    pub fn scan(&self) -> Result<Vec<String>> {
        Ok(self.scan_with_locations()?.into_keys().collect())
    }

    /// One record per installation, with method and provenance inferred.
    pub fn scan_detailed(&self) -> Result<Vec<InstalledSkill>> {
        let mut result = Vec::new();

        for (platform, global) in [
            (Platform::Cursor, false),
            (Platform::Cursor, true),
            (Platform::Claude, false),
            (Platform::Claude, true),
        ] {
            let Some(dir) = self.locations.skills_dir(platform, global) else {
                continue;
            };
            for name in installed_in_dir(&dir)? {
                let skill_dir = dir.join(&name);
                let (method, repo_url) = self.inspect(&skill_dir);
                result.push(InstalledSkill {
                    name,
                    platform,
                    global,
                    method,
                    repo_url,
                });
            }
        }

        for name in instructions_skills(&self.locations.instructions_path())? {
            result.push(InstalledSkill {
                name,
                platform: Platform::Vscode,
                global: false,
                method: InstallMethod::Append,
                repo_url: None,
            });
        }

        Ok(result)
    }

    /// Method and origin of one directory install. Unreadable pieces degrade
    /// to `copy` with no origin.
    fn inspect(&self, skill_dir: &Path) -> (InstallMethod, Option<String>) {
        let links = symlinked_entries(skill_dir);
        let is_link = !links.is_empty()
            || fs::symlink_metadata(skill_dir).is_ok_and(|m| m.file_type().is_symlink());
        let method = if is_link {
            InstallMethod::Link
        } else {
            InstallMethod::Copy
        };

        let repo_url = match read_metadata(skill_dir) {
            Ok(Some(metadata)) if !metadata.repo_url.is_empty() => Some(metadata.repo_url),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(path = %skill_dir.display(), error = %e, "Ignoring unreadable metadata");
                None
            }
        };

        let repo_url = repo_url.or_else(|| {
            links
                .first()
                .and_then(|link| fs::read_link(link).ok())
                .and_then(|target| self.repo_url_from_library_path(&target))
        });

        (method, repo_url)
    }

    /// Recovers `https://github.com/<owner>/<repo>` from a link into the
    /// library. Assumes a GitHub origin and a single-segment owner.
    fn repo_url_from_library_path(&self, target: &Path) -> Option<String> {
        let relative = target.strip_prefix(self.locations.library_dir()).ok()?;
        let mut parts = relative.components().filter_map(|c| c.as_os_str().to_str());
        let owner = parts.next()?;
        let repo = parts.next()?;
        Some(format!("https://github.com/{}/{}", owner, repo))
    }
}

fn symlinked_entries(skill_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(skill_dir) else {
        return Vec::new();
    };
    let mut links: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_symlink()))
        .map(|entry| entry.path())
        .collect();
    links.sort();
    links
}
