//! JavaScript and TypeScript matchers.
//!
//! Both share the lexical model (template literals included) and the brace
//! block model; they differ only in the language they claim.

use std::path::Path;

use pactfix_core::{Language, Matcher};

use crate::{file_name, in_directory};

fn is_js_test_path(path: &Path) -> bool {
    let name = file_name(path);
    name.contains(".test.") || name.contains(".spec.") || in_directory(path, &["__tests__"])
}

/// Matches JavaScript sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaScriptMatcher;

impl Matcher for JavaScriptMatcher {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn interpolation_markers(&self) -> &'static [&'static str] {
        &["${"]
    }

    fn is_test_path(&self, path: &Path) -> bool {
        is_js_test_path(path)
    }
}

/// Matches TypeScript sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptMatcher;

impl Matcher for TypeScriptMatcher {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn interpolation_markers(&self) -> &'static [&'static str] {
        &["${"]
    }

    fn is_test_path(&self, path: &Path) -> bool {
        is_js_test_path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactfix_core::{parse_rules, SourceDocument};
    use std::sync::Arc;

    const RULES: &str = r#"
[[rule]]
id = "JS012"
name = "sql-concatenation"
language = "javascript"
severity = "security"
message = "Use parameterized queries"
match = { structure = { kind = "call-with-concatenation", callees = ["query", "execute"] } }

[[rule]]
id = "JS011"
name = "empty-catch"
language = "javascript"
severity = "error"
message = "Handle or rethrow the error"
match = { structure = { kind = "empty-block", keywords = ["catch"] } }

[[rule]]
id = "JS003"
name = "console-logging"
language = "javascript"
message = "Remove console logging"
match = { regex = '\bconsole\.(?:log|debug|info)\s*\(' }
"#;

    fn ids(path: &str, text: &str) -> Vec<String> {
        let rules: Vec<_> = parse_rules(RULES).unwrap().into_iter().map(Arc::new).collect();
        let doc = SourceDocument::new(path, Language::JavaScript, text);
        JavaScriptMatcher
            .scan(&doc, &rules)
            .iter()
            .map(|m| m.rule_id().to_string())
            .collect()
    }

    #[test]
    fn template_literal_interpolation_in_query() {
        let text = "db.query(`SELECT * FROM users WHERE id = ${req.params.id}`);\n";
        assert_eq!(ids("api.js", text), ["JS012"]);
        let text = "db.query('SELECT * FROM users WHERE id = $1', [id]);\n";
        assert!(ids("api.js", text).is_empty());
    }

    #[test]
    fn empty_catch_with_comment_only() {
        let text = "try {\n  load();\n} catch (err) {\n  // ignore\n}\n";
        assert_eq!(ids("app.js", text), ["JS011"]);
    }

    #[test]
    fn test_files_halve_confidence() {
        assert_eq!(ids("app.js", "console.log(x);\n"), ["JS003"]);
        assert!(ids("app.test.js", "console.log(x);\n").is_empty());
        assert!(ids("src/__tests__/app.js", "console.log(x);\n").is_empty());
    }

    #[test]
    fn typescript_shares_test_naming() {
        assert!(TypeScriptMatcher.is_test_path(Path::new("user.spec.ts")));
        assert!(!TypeScriptMatcher.is_test_path(Path::new("user.service.ts")));
    }
}
