//! C# matcher.

use std::path::Path;

use pactfix_core::{Language, Matcher};

use crate::{file_name, in_directory};

/// Matches C# sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct CSharpMatcher;

impl Matcher for CSharpMatcher {
    fn language(&self) -> Language {
        Language::CSharp
    }

    fn concatenation_operators(&self) -> &'static [&'static str] {
        &["+", "string.Format(", "String.Format(", "string.Concat("]
    }

    fn interpolation_markers(&self) -> &'static [&'static str] {
        &["$\"", "$@\"", "@$\""]
    }

    fn is_test_path(&self, path: &Path) -> bool {
        let name = file_name(path);
        name.ends_with("Tests.cs") || name.ends_with("Test.cs") || in_directory(path, &["Tests"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactfix_core::{parse_rules, SourceDocument};
    use std::sync::Arc;

    const RULES: &str = r#"
[[rule]]
id = "CS013"
name = "sql-concatenation"
language = "csharp"
severity = "security"
message = "Use SqlParameter instead of building SQL text"
match = { structure = { kind = "call-with-concatenation", callees = ["SqlCommand"] } }

[[rule]]
id = "CS012"
name = "undisposed-resource"
language = "csharp"
message = "Dispose the resource with a using statement"
[rule.match]
confidence = 0.8
threshold = 0.7
structure = { kind = "unreleased-resource", acquire = ["new SqlConnection(", "new StreamReader("], release = [".Dispose(", ".Close("], guards = ["using"] }
"#;

    fn ids(path: &str, text: &str) -> Vec<String> {
        let rules: Vec<_> = parse_rules(RULES).unwrap().into_iter().map(Arc::new).collect();
        let doc = SourceDocument::new(path, Language::CSharp, text);
        CSharpMatcher
            .scan(&doc, &rules)
            .iter()
            .map(|m| m.rule_id().to_string())
            .collect()
    }

    #[test]
    fn interpolated_sql_command() {
        let text = "var cmd = new SqlCommand($\"SELECT * FROM Users WHERE Id = {id}\", conn);\n";
        assert_eq!(ids("Repo.cs", text), ["CS013"]);
        let text = "var cmd = new SqlCommand(\"SELECT * FROM Users WHERE Id = \" + id, conn);\n";
        assert_eq!(ids("Repo.cs", text), ["CS013"]);
        let text = "var cmd = new SqlCommand(\"SELECT * FROM Users WHERE Id = @id\", conn);\n";
        assert!(ids("Repo.cs", text).is_empty());
    }

    #[test]
    fn using_declarations_guard_resources() {
        let leaked = "void Load() {\n    var conn = new SqlConnection(cs);\n    conn.Open();\n}\n";
        assert_eq!(ids("Repo.cs", leaked), ["CS012"]);
        let guarded = "void Load() {\n    using var conn = new SqlConnection(cs);\n    conn.Open();\n}\n";
        assert!(ids("Repo.cs", guarded).is_empty());
        let disposed = "void Load() {\n    var r = new StreamReader(p);\n    r.Close();\n}\n";
        assert!(ids("Repo.cs", disposed).is_empty());
    }

    #[test]
    fn heuristic_rules_drop_in_test_projects() {
        let leaked = "void Load() {\n    var conn = new SqlConnection(cs);\n}\n";
        assert!(ids("RepoTests.cs", leaked).is_empty());
    }
}
