//! Registered languages and the file classifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A language with a registered matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// PHP.
    Php,
    /// JavaScript (including JSX).
    JavaScript,
    /// TypeScript (including TSX).
    TypeScript,
    /// C#.
    CSharp,
    /// Ruby.
    Ruby,
    /// Python.
    Python,
    /// Go.
    Go,
    /// Java.
    Java,
    /// Rust.
    Rust,
    /// Bash and POSIX shell scripts.
    Bash,
    /// Dockerfiles and Containerfiles.
    Dockerfile,
    /// SQL scripts.
    Sql,
    /// YAML documents, Compose files included.
    Yaml,
}

impl Language {
    /// Every registered language.
    pub const ALL: [Self; 13] = [
        Self::Php,
        Self::JavaScript,
        Self::TypeScript,
        Self::CSharp,
        Self::Ruby,
        Self::Python,
        Self::Go,
        Self::Java,
        Self::Rust,
        Self::Bash,
        Self::Dockerfile,
        Self::Sql,
        Self::Yaml,
    ];

    /// Stable lowercase id used in catalogs, configuration and reports.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Php => "php",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::CSharp => "csharp",
            Self::Ruby => "ruby",
            Self::Python => "python",
            Self::Go => "go",
            Self::Java => "java",
            Self::Rust => "rust",
            Self::Bash => "bash",
            Self::Dockerfile => "dockerfile",
            Self::Sql => "sql",
            Self::Yaml => "yaml",
        }
    }

    /// Looks a language up by its id.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.id() == id)
    }

    /// Human-readable name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Php => "PHP",
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
            Self::CSharp => "C#",
            Self::Ruby => "Ruby",
            Self::Python => "Python",
            Self::Go => "Go",
            Self::Java => "Java",
            Self::Rust => "Rust",
            Self::Bash => "Bash",
            Self::Dockerfile => "Dockerfile",
            Self::Sql => "SQL",
            Self::Yaml => "YAML",
        }
    }

    /// File extensions (without dot, lowercase) that select this language.
    #[must_use]
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Php => &["php", "phtml", "php3", "php4", "php5", "phps"],
            Self::JavaScript => &["js", "mjs", "cjs", "jsx"],
            Self::TypeScript => &["ts", "tsx", "mts", "cts"],
            Self::CSharp => &["cs", "csx"],
            Self::Ruby => &["rb", "rake", "gemspec", "ru"],
            Self::Python => &["py", "pyw", "pyi"],
            Self::Go => &["go"],
            Self::Java => &["java"],
            Self::Rust => &["rs"],
            Self::Bash => &["sh", "bash"],
            Self::Dockerfile => &["dockerfile", "containerfile"],
            Self::Sql => &["sql"],
            Self::Yaml => &["yml", "yaml"],
        }
    }

    /// Exact file names that select this language.
    #[must_use]
    pub fn file_names(self) -> &'static [&'static str] {
        match self {
            Self::Ruby => &["Rakefile", "Gemfile"],
            Self::Bash => &[".bashrc", ".bash_profile", ".profile"],
            Self::Dockerfile => &["Dockerfile", "Containerfile"],
            _ => &[],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Extensions shared by several languages; resolved by content.
const AMBIGUOUS_EXTENSIONS: &[&str] = &["inc", "tpl"];

/// Bytes of the document inspected when sniffing.
const SNIFF_LIMIT: usize = 1024;

/// File name prefixes of stage-specific Dockerfiles.
const DOCKERFILE_PREFIXES: &[&str] = &["Dockerfile.", "Containerfile."];

/// Maps a path and its content to a registered language.
///
/// The classifier only answers with languages it was constructed with, so
/// a file is never routed to a language that has no matcher.
#[derive(Debug, Clone)]
pub struct LanguageClassifier {
    languages: Vec<Language>,
}

impl LanguageClassifier {
    /// Creates a classifier restricted to `languages`.
    #[must_use]
    pub fn new(languages: impl IntoIterator<Item = Language>) -> Self {
        let mut languages: Vec<_> = languages.into_iter().collect();
        languages.sort();
        languages.dedup();
        Self { languages }
    }

    /// Creates a classifier that knows every registered language.
    #[must_use]
    pub fn all() -> Self {
        Self::new(Language::ALL)
    }

    /// Languages this classifier can return.
    #[must_use]
    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    /// Classifies a file. Returns `None` for unknown or unsupported files.
    ///
    /// Extension and file name decide first. Extension-less files and
    /// ambiguous extensions fall back to a content sniff: a shebang, a
    /// `<?php` tag, or a leading `FROM` instruction.
    #[must_use]
    pub fn classify(&self, path: &Path, content: &[u8]) -> Option<Language> {
        let detected = match by_name(path) {
            Lookup::Found(language) => Some(language),
            Lookup::Sniff => sniff(content),
            Lookup::Unknown => None,
        };
        detected.filter(|l| self.languages.binary_search(l).is_ok())
    }
}

impl Default for LanguageClassifier {
    fn default() -> Self {
        Self::all()
    }
}

enum Lookup {
    Found(Language),
    Sniff,
    Unknown,
}

fn by_name(path: &Path) -> Lookup {
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        if let Some(language) = Language::ALL
            .into_iter()
            .find(|l| l.file_names().contains(&name))
        {
            return Lookup::Found(language);
        }
        // `Dockerfile.dev`, `Containerfile.prod`
        if DOCKERFILE_PREFIXES.iter().any(|p| name.starts_with(p)) {
            return Lookup::Found(Language::Dockerfile);
        }
    }

    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return Lookup::Sniff;
    };
    let ext = ext.to_ascii_lowercase();

    if AMBIGUOUS_EXTENSIONS.contains(&ext.as_str()) {
        return Lookup::Sniff;
    }
    Language::ALL
        .into_iter()
        .find(|l| l.extensions().contains(&ext.as_str()))
        .map_or(Lookup::Unknown, Lookup::Found)
}

fn sniff(content: &[u8]) -> Option<Language> {
    let head = String::from_utf8_lossy(&content[..content.len().min(SNIFF_LIMIT)]);
    let head = head.trim_start_matches('\u{feff}');
    let first_line = head.lines().next().unwrap_or_default().trim();

    if let Some(command) = first_line.strip_prefix("#!") {
        return interpreter(command).and_then(language_for_interpreter);
    }
    if head.trim_start().starts_with("<?php") {
        return Some(Language::Php);
    }
    if starts_with_from_instruction(head) {
        return Some(Language::Dockerfile);
    }
    None
}

/// Returns true if the first instruction, after comments, blank lines and
/// `ARG`s, is `FROM <image>`. Only the conventional uppercase spelling
/// counts, so prose starting with "from" stays unclassified.
fn starts_with_from_instruction(head: &str) -> bool {
    head.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .find(|l| !l.starts_with("ARG "))
        .is_some_and(|l| {
            let mut words = l.split_whitespace();
            words.next() == Some("FROM") && words.next().is_some()
        })
}

/// Extracts the interpreter name from a shebang command line.
fn interpreter(command: &str) -> Option<&str> {
    let mut parts = command.split_whitespace();
    let program = parts.next()?;
    let name = program.rsplit('/').next().unwrap_or(program);
    if name == "env" {
        return parts.find(|p| !p.starts_with('-'));
    }
    Some(name)
}

fn language_for_interpreter(name: &str) -> Option<Language> {
    let base = name.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.');
    match base {
        "php" => Some(Language::Php),
        "node" | "nodejs" | "deno" => Some(Language::JavaScript),
        "ts-node" | "tsx" => Some(Language::TypeScript),
        "ruby" => Some(Language::Ruby),
        "python" => Some(Language::Python),
        "sh" | "bash" | "dash" | "ksh" | "zsh" => Some(Language::Bash),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(path: &str, content: &str) -> Option<Language> {
        LanguageClassifier::all().classify(Path::new(path), content.as_bytes())
    }

    #[test]
    fn ids_round_trip() {
        for language in Language::ALL {
            assert_eq!(Language::from_id(language.id()), Some(language));
        }
        assert_eq!(Language::from_id("kotlin"), None);
    }

    #[test]
    fn classifies_by_extension() {
        assert_eq!(classify("index.php", ""), Some(Language::Php));
        assert_eq!(classify("app/main.JS", ""), Some(Language::JavaScript));
        assert_eq!(classify("src/App.tsx", ""), Some(Language::TypeScript));
        assert_eq!(classify("Program.cs", ""), Some(Language::CSharp));
        assert_eq!(classify("lib/task.rake", ""), Some(Language::Ruby));
        assert_eq!(classify("setup.py", ""), Some(Language::Python));
        assert_eq!(classify("main.go", ""), Some(Language::Go));
        assert_eq!(classify("Main.java", ""), Some(Language::Java));
        assert_eq!(classify("src/lib.rs", ""), Some(Language::Rust));
        assert_eq!(classify("scripts/deploy.sh", ""), Some(Language::Bash));
        assert_eq!(classify("db/schema.sql", ""), Some(Language::Sql));
        assert_eq!(classify("docker-compose.yml", ""), Some(Language::Yaml));
        assert_eq!(classify(".github/ci.YAML", ""), Some(Language::Yaml));
    }

    #[test]
    fn classifies_dockerfiles_by_name() {
        assert_eq!(classify("Dockerfile", ""), Some(Language::Dockerfile));
        assert_eq!(classify("build/Dockerfile.dev", ""), Some(Language::Dockerfile));
        assert_eq!(classify("Containerfile", ""), Some(Language::Dockerfile));
        assert_eq!(classify("api.dockerfile", ""), Some(Language::Dockerfile));
    }

    #[test]
    fn sniffs_from_instruction_in_extensionless_files() {
        let content = "# syntax=docker/dockerfile:1
ARG BASE=alpine
FROM ${BASE}
RUN true
";
        assert_eq!(classify("images/builder", content), Some(Language::Dockerfile));
        assert_eq!(classify("notes", "from here on
"), None);
        assert_eq!(classify("notes", "FROM
"), None);
    }

    #[test]
    fn extension_wins_over_shebang() {
        assert_eq!(
            classify("tool.rb", "#!/usr/bin/env python3\n"),
            Some(Language::Ruby)
        );
    }

    #[test]
    fn classifies_known_file_names() {
        assert_eq!(classify("project/Rakefile", ""), Some(Language::Ruby));
        assert_eq!(classify("Gemfile", "source 'x'"), Some(Language::Ruby));
    }

    #[test]
    fn sniffs_shebang_when_extension_absent() {
        assert_eq!(
            classify("bin/deploy", "#!/usr/bin/env python3\nprint('x')\n"),
            Some(Language::Python)
        );
        assert_eq!(classify("bin/serve", "#!/usr/bin/node\n"), Some(Language::JavaScript));
        assert_eq!(
            classify("bin/task", "#!/usr/bin/env -S ruby -w\n"),
            Some(Language::Ruby)
        );
        assert_eq!(classify("bin/run", "#!/bin/sh\necho hi\n"), Some(Language::Bash));
        assert_eq!(classify("bin/env", "#!/usr/bin/env bash\n"), Some(Language::Bash));
        assert_eq!(classify("bin/awk", "#!/usr/bin/awk -f\n"), None);
    }

    #[test]
    fn sniffs_php_tag_for_ambiguous_extension() {
        assert_eq!(classify("header.inc", "<?php\necho 1;"), Some(Language::Php));
        assert_eq!(classify("header.inc", "plain text"), None);
    }

    #[test]
    fn unknown_extension_is_not_sniffed() {
        assert_eq!(classify("README.md", "#!/usr/bin/env python\n"), None);
    }

    #[test]
    fn restricted_classifier_hides_unregistered_languages() {
        let classifier = LanguageClassifier::new([Language::Php]);
        assert_eq!(classifier.classify(Path::new("a.js"), b""), None);
        assert_eq!(
            classifier.classify(Path::new("a.php"), b""),
            Some(Language::Php)
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let content = b"#!/usr/bin/env ruby\nputs 1\n";
        let first = LanguageClassifier::all().classify(Path::new("script"), content);
        let second = LanguageClassifier::all().classify(Path::new("script"), content);
        assert_eq!(first, second);
    }
}
