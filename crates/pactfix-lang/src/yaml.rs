//! YAML matcher.
//!
//! Blocks follow indentation: every mapping key owns its deeper lines,
//! every sequence item owns its entry and every `---` starts a document.

use pactfix_core::matcher::blocks;
use pactfix_core::{Block, Language, Matcher};

/// Matches YAML documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlMatcher;

impl Matcher for YamlMatcher {
    fn language(&self) -> Language {
        Language::Yaml
    }

    fn blocks(&self, code: &str) -> Vec<Block> {
        blocks::yaml_blocks(code)
    }

    fn concatenation_operators(&self) -> &'static [&'static str] {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactfix_core::{parse_rules, SourceDocument};
    use std::sync::Arc;

    const RULES: &str = r#"
[[rule]]
id = "YAML004"
name = "ambiguous-boolean"
language = "yaml"
message = "Quote the value"
match = { regex = '(?im)^[ \t]*(?:-[ \t]+)?[\w.-]+[ \t]*:[ \t]+(?P<target>yes|no|on|off)[ \t]*(?:#.*)?$' }

[[rule]]
id = "YAML007"
name = "duplicate-key"
language = "yaml"
severity = "error"
message = "Key repeats in the same mapping"
match = { structure = { kind = "repeated-name", pattern = '(?m)^[ \t]*(?:-[ \t]+)?(?P<name>[\w.-]+)[ \t]*:(?:[ \t]|$)' } }

[[rule]]
id = "YAML010"
name = "unused-anchor"
language = "yaml"
severity = "info"
message = "Anchor is never referenced"
match = { structure = { kind = "unused-binding", declaration = '(?:^|[ \t\[,])&(?P<name>[\w-]+)', usage = '\*${name}\b' } }
"#;

    fn found(text: &str) -> Vec<(String, usize)> {
        let rules: Vec<_> = parse_rules(RULES).unwrap().into_iter().map(Arc::new).collect();
        let doc = SourceDocument::new("deploy.yml", Language::Yaml, text);
        let mut found: Vec<_> = YamlMatcher
            .scan(&doc, &rules)
            .iter()
            .map(|m| (m.rule_id().to_string(), text[..m.span.start].matches('\n').count() + 1))
            .collect();
        found.sort();
        found.dedup();
        found
    }

    #[test]
    fn duplicate_keys_per_mapping() {
        let text = "\
services:
  web:
    image: nginx
    ports: []
    image: httpd
  db:
    image: postgres
";
        assert_eq!(found(text), [("YAML007".to_string(), 5)]);
    }

    #[test]
    fn sequence_items_are_separate_mappings() {
        let text = "\
steps:
  - name: build
    run: make
  - name: test
    run: make test
";
        assert!(found(text).is_empty());
    }

    #[test]
    fn plain_booleans_but_not_quoted_ones() {
        let text = "debug: yes\nverbose: \"no\"\nscript: |\n  enabled: on\n";
        assert_eq!(found(text), [("YAML004".to_string(), 1)]);
    }

    #[test]
    fn anchors_without_aliases() {
        let text = "\
base: &base
  retries: 3
spare: &spare
  retries: 5
job:
  <<: *base
";
        assert_eq!(found(text), [("YAML010".to_string(), 3)]);
    }
}
