use regex::Regex;
use std::sync::LazyLock;

/// Each skill in the instructions file starts with `# Skill: <name>`;
/// sections after the first are preceded by a `---` rule.
pub const SKILL_HEADER_PREFIX: &str = "# Skill: ";
pub const SEPARATOR: &str = "---";

static SKILL_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^# Skill: (.+)$").unwrap_or_else(|e| panic!("invalid header regex: {e}"))
});

pub fn skill_header(name: &str) -> String {
    format!("{}{}", SKILL_HEADER_PREFIX, name)
}

/// Skill names in file order. Duplicated headers are reported twice.
pub fn section_names(content: &str) -> Vec<String> {
    SKILL_HEADER
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// New file content with the skill appended, or `None` when `skill_content`
/// already appears verbatim in `existing`.
pub fn append_section(existing: &str, name: &str, skill_content: &str) -> Option<String> {
    if existing.contains(skill_content) {
        return None;
    }

    let section = format!("{}\n{}", skill_header(name), skill_content);
    if existing.is_empty() {
        Some(section)
    } else {
        Some(format!("{}\n\n{}\n\n{}", existing, SEPARATOR, section))
    }
}

/// Content with the named section cut out and trimmed, or `None` when no line
/// equals the section header. An empty result means nothing else remains.
pub fn remove_section(content: &str, name: &str) -> Option<String> {
    let header = skill_header(name);
    let mut lines: Vec<&str> = content.split('\n').collect();

    let header_index = lines.iter().position(|l| l.trim() == header)?;
    let start = section_start(&lines, header_index);

    let end = lines
        .iter()
        .enumerate()
        .skip(header_index + 1)
        .find(|(_, l)| {
            let t = l.trim();
            t.starts_with(SKILL_HEADER_PREFIX) || t == SEPARATOR
        })
        .map(|(i, _)| i)
        .unwrap_or(lines.len());

    lines.drain(start..end);
    Some(lines.join("\n").trim().to_string())
}

/// Walks back from the header over a `---` rule and the blank lines around it.
fn section_start(lines: &[&str], header_index: usize) -> usize {
    let is_blank = |i: usize| lines[i].trim().is_empty();
    let is_separator = |i: usize| lines[i].trim() == SEPARATOR;

    let mut start = header_index;
    if start > 1 && is_blank(start - 1) && is_separator(start - 2) {
        start -= 1;
    }
    if start > 0 && is_separator(start - 1) {
        start -= 1;
        if start > 0 && is_blank(start - 1) {
            start -= 1;
        }
    }
    start
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_append_has_no_separator() {
        let out = append_section("", "hello-world", "Say hello.\n").unwrap();
        assert_eq!(out, "# Skill: hello-world\nSay hello.\n");
    }

    #[test]
    fn second_identical_append_is_noop() {
        let once = append_section("", "hello-world", "Say hello.").unwrap();
        assert!(append_section(&once, "hello-world", "Say hello.").is_none());
    }

    #[test]
    fn two_skills_keep_order_with_rule() {
        let once = append_section("", "a", "Alpha body").unwrap();
        let twice = append_section(&once, "b", "Beta body").unwrap();
        assert_eq!(
            twice,
            "# Skill: a\nAlpha body\n\n---\n\n# Skill: b\nBeta body"
        );
        assert_eq!(section_names(&twice), ["a", "b"]);
    }

    #[test]
    fn preserves_existing_user_content() {
        let out = append_section("Project rules.", "a", "Alpha").unwrap();
        assert!(out.starts_with("Project rules.\n\n---\n\n# Skill: a"));
    }

    #[test]
    fn section_names_keep_duplicates_and_trim() {
        let content = "# Skill: a \nx\n# Skill: b\r\ny\n# Skill: a\n";
        assert_eq!(section_names(content), ["a", "b", "a"]);
    }

    #[test]
    fn removes_last_section_with_its_rule() {
        let content = "# Skill: a\nAlpha body\n\n---\n\n# Skill: b\nBeta body";
        assert_eq!(remove_section(content, "b").unwrap(), "# Skill: a\nAlpha body");
    }

    #[test]
    fn removes_first_section_up_to_rule() {
        let content = "# Skill: a\nAlpha body\n\n---\n\n# Skill: b\nBeta body";
        assert_eq!(
            remove_section(content, "a").unwrap(),
            "---\n\n# Skill: b\nBeta body"
        );
    }

    #[test]
    fn removes_middle_section_stopping_at_next_rule() {
        let content = "# Skill: a\nA\n\n---\n\n# Skill: b\nB\n\n---\n\n# Skill: c\nC";
        assert_eq!(
            remove_section(content, "b").unwrap(),
            "# Skill: a\nA\n---\n\n# Skill: c\nC"
        );
    }

    #[test]
    fn removing_only_section_leaves_nothing() {
        assert_eq!(remove_section("# Skill: a\nAlpha\n", "a").unwrap(), "");
    }

    #[test]
    fn missing_section_is_none() {
        assert!(remove_section("# Skill: a\nAlpha", "b").is_none());
        assert!(remove_section("mentions # Skill: b inline", "b").is_none());
    }

    #[test]
    fn rule_inside_skill_body_truncates_section() {
        let content = "# Skill: a\nintro\n---\ntail";
        assert_eq!(remove_section(content, "a").unwrap(), "---\ntail");
    }
}
