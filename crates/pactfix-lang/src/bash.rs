//! Bash matcher.
//!
//! Function bodies are brace blocks. Double-quoted strings and unquoted
//! heredocs expand variables, which the interpolation scope relies on.

use std::path::Path;

use pactfix_core::{Language, Matcher};

use crate::{file_name, in_directory};

/// Matches shell scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct BashMatcher;

impl Matcher for BashMatcher {
    fn language(&self) -> Language {
        Language::Bash
    }

    fn concatenation_operators(&self) -> &'static [&'static str] {
        &[]
    }

    fn interpolation_markers(&self) -> &'static [&'static str] {
        &["$"]
    }

    fn empty_body_fillers(&self) -> &'static [&'static str] {
        &[":", "true"]
    }

    fn is_test_path(&self, path: &Path) -> bool {
        file_name(path).ends_with(".bats") || in_directory(path, &["test", "tests"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactfix_core::{parse_rules, SourceDocument};
    use std::sync::Arc;

    const RULES: &str = r#"
[[rule]]
id = "BASH001"
name = "unbraced-variable"
language = "bash"
severity = "info"
message = "Brace variable expansions"
match = { regex = '(?:^|[^\\$])(?P<target>\$(?P<name>[A-Za-z_]\w*))', scope = "interpolation" }

[[rule]]
id = "SC2164"
name = "unchecked-cd"
language = "bash"
message = "cd can fail"
[rule.match]
regex = '(?m)^[ \t]*(?P<target>cd(?:[ \t]+[^\s;&|#]+)+)[ \t]*$'
unless-line-contains = ["||", "&&"]
unless-file-contains = ["set -e"]
"#;

    fn found(text: &str) -> Vec<(String, String)> {
        let rules: Vec<_> = parse_rules(RULES).unwrap().into_iter().map(Arc::new).collect();
        let doc = SourceDocument::new("deploy.sh", Language::Bash, text);
        let mut found: Vec<_> = BashMatcher
            .scan(&doc, &rules)
            .iter()
            .map(|m| (m.rule_id().to_string(), text[m.span.start..m.span.end].to_string()))
            .collect();
        found.sort();
        found.dedup();
        found
    }

    #[test]
    fn expansions_in_expanding_contexts() {
        let text = "\
cp \"$SRC\"/app ${DEST}/app
cat <<EOF
home=$HOME
EOF
cat <<'EOF'
literal=$USER
EOF
# $SHELL
";
        let names: Vec<String> = found(text).into_iter().map(|(_, s)| s).collect();
        assert_eq!(names, ["$HOME", "$SRC"]);
    }

    #[test]
    fn cd_without_a_failure_branch() {
        let text = "cd /srv/app\ncd build || exit 1\ncd\n";
        assert_eq!(found(text), [("SC2164".to_string(), "cd /srv/app".to_string())]);
        assert!(found("set -euo pipefail\ncd /srv/app\n").is_empty());
    }

    #[test]
    fn test_files() {
        assert!(BashMatcher.is_test_path(Path::new("test/deploy.bats")));
        assert!(BashMatcher.is_test_path(Path::new("tests/helpers.sh")));
        assert!(!BashMatcher.is_test_path(Path::new("scripts/deploy.sh")));
    }
}
