use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SkGetError, fs_err};

pub const SKILL_FILE: &str = "SKILL.md";

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

/// Summary of an installed skill's SKILL.md, shown by `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillManifest {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub location: PathBuf,
}

/// Reads `<skill_dir>/SKILL.md`, following symlinks into the library.
pub fn load_manifest(skill_dir: &Path) -> Result<SkillManifest> {
    let md_path = skill_dir.join(SKILL_FILE);
    if !md_path.exists() {
        return Err(SkGetError::SkillAssetMissing {
            skill: dir_name(skill_dir),
            asset: SKILL_FILE.to_string(),
        });
    }

    let content = fs::read_to_string(&md_path).map_err(fs_err(&md_path))?;
    Ok(parse_manifest(&content, &dir_name(skill_dir), md_path))
}

pub fn parse_manifest(content: &str, fallback_name: &str, location: PathBuf) -> SkillManifest {
    if let Some((frontmatter, body)) = split_frontmatter(content)
        && let Ok(fm) = serde_yaml::from_str::<FrontMatter>(frontmatter)
    {
        return SkillManifest {
            name: fm.name.unwrap_or_else(|| fallback_name.to_string()),
            description: fm.description.or_else(|| first_paragraph(body)),
            version: fm.version,
            location,
        };
    }

    SkillManifest {
        name: fallback_name.to_string(),
        description: first_paragraph(content),
        version: None,
        location,
    }
}

fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))?;
    let close = rest.find("\n---")?;
    let frontmatter = &rest[..close];
    let body = rest[close + 4..].trim_start_matches(['\r', '\n']);
    Some((frontmatter, body))
}

fn first_paragraph(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find(|l| !(l.is_empty() || l.starts_with('#') || *l == "---"))
        .map(str::to_string)
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reads_frontmatter() {
        let tmp = TempDir::new().unwrap();
        let skill_dir = tmp.path().join("git-commit");
        fs::create_dir_all(&skill_dir).unwrap();
        fs::write(
            skill_dir.join(SKILL_FILE),
            "---\nname: git-commit\ndescription: Write conventional commits\nversion: 1.2.0\n---\n# Git Commit\nBody\n",
        )
        .unwrap();

        let manifest = load_manifest(&skill_dir).unwrap();
        assert_eq!(manifest.name, "git-commit");
        assert_eq!(manifest.description.as_deref(), Some("Write conventional commits"));
        assert_eq!(manifest.version.as_deref(), Some("1.2.0"));
    }

    #[test]
    fn falls_back_to_first_paragraph() {
        let manifest = parse_manifest(
            "# Hello World\n\nGreets the user politely.\n",
            "hello-world",
            PathBuf::from("SKILL.md"),
        );
        assert_eq!(manifest.name, "hello-world");
        assert_eq!(manifest.description.as_deref(), Some("Greets the user politely."));
    }

    #[test]
    fn missing_skill_file() {
        let tmp = TempDir::new().unwrap();
        let skill_dir = tmp.path().join("empty");
        fs::create_dir_all(&skill_dir).unwrap();

        assert!(matches!(
            load_manifest(&skill_dir),
            Err(SkGetError::SkillAssetMissing { .. })
        ));
    }
}
