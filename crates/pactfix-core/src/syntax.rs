//! Lexical model: comment and string syntax per language.
//!
//! The lexer is shallow. It classifies every byte of a
//! buffer as code, comment or string literal so that matchers can drop
//! findings inside literals and comments, and so that the fix engine can
//! compare delimiter balance before and after a rewrite.

use std::collections::VecDeque;
use std::ops::Range;

use crate::language::Language;

/// A string or character literal delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringDelimiter {
    /// Opening token (may include a prefix such as `r#"` or `@"`).
    pub open: &'static str,
    /// Closing token.
    pub close: &'static str,
    /// Whether `\` escapes the next character.
    pub escape: bool,
    /// Whether the literal may span lines.
    pub multiline: bool,
    /// Only a literal when it looks like `'x'` or `'\n'` (Rust lifetimes).
    pub char_literal: bool,
    /// Whether variables expand inside the literal (`"$HOME"` in a shell).
    pub interpolates: bool,
}

impl StringDelimiter {
    const fn quoted(quote: &'static str) -> Self {
        Self {
            open: quote,
            close: quote,
            escape: true,
            multiline: false,
            char_literal: false,
            interpolates: false,
        }
    }

    const fn multiline(open: &'static str, close: &'static str, escape: bool) -> Self {
        Self {
            open,
            close,
            escape,
            multiline: true,
            char_literal: false,
            interpolates: false,
        }
    }

    const fn raw(quote: &'static str) -> Self {
        Self {
            escape: false,
            ..Self::quoted(quote)
        }
    }

    const fn interpolating(self) -> Self {
        Self {
            interpolates: true,
            ..self
        }
    }
}

/// A block comment delimiter pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockComment {
    /// Opening token.
    pub open: &'static str,
    /// Closing token.
    pub close: &'static str,
    /// Both tokens must start a line (Ruby `=begin`/`=end`).
    pub line_start: bool,
}

const C_BLOCK: BlockComment = BlockComment {
    open: "/*",
    close: "*/",
    line_start: false,
};

/// A heredoc opener such as `<<<` (PHP) or `<<~` (Ruby).
///
/// The opener is followed by a terminator name, bare or quoted. The body
/// starts on the next line and ends at the first line whose indented text
/// starts with the name. A single-quoted name turns off interpolation
/// (PHP nowdoc, `<<'EOF'` in a shell).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heredoc {
    /// Opening token before the name.
    pub open: &'static str,
    /// Whether blanks may separate the opener from the name.
    pub space: bool,
}

/// Comment and string syntax of one language.
#[derive(Debug, Clone, Copy)]
pub struct LexicalSyntax {
    /// Line comment markers, longest first.
    pub line_comments: &'static [&'static str],
    /// Block comment delimiters.
    pub block_comments: &'static [BlockComment],
    /// Literal delimiters, longest opener first.
    pub strings: &'static [StringDelimiter],
    /// A prefix that looks like a line comment but is code (PHP `#[`).
    pub not_comment: Option<&'static str>,
    /// Line comments only start a word (`#` in a shell or YAML).
    pub comment_at_word_start: bool,
    /// Quotes open a literal only where a value starts (YAML scalars).
    pub quotes_start_values: bool,
    /// Heredoc openers, longest first.
    pub heredocs: &'static [Heredoc],
    /// A `/` in operand position opens a regular expression literal.
    pub regex_literals: bool,
    /// A line ending in `|` or `>` opens an indented block scalar.
    pub block_scalars: bool,
}

const PLAIN: LexicalSyntax = LexicalSyntax {
    line_comments: &[],
    block_comments: &[],
    strings: &[],
    not_comment: None,
    comment_at_word_start: false,
    quotes_start_values: false,
    heredocs: &[],
    regex_literals: false,
    block_scalars: false,
};

const SHELL_HEREDOCS: &[Heredoc] = &[
    Heredoc {
        open: "<<-",
        space: true,
    },
    Heredoc {
        open: "<<",
        space: true,
    },
];

static PHP: LexicalSyntax = LexicalSyntax {
    line_comments: &["//", "#"],
    block_comments: &[C_BLOCK],
    strings: &[
        StringDelimiter::quoted("\"").interpolating(),
        StringDelimiter::quoted("'"),
    ],
    not_comment: Some("#["),
    heredocs: &[Heredoc {
        open: "<<<",
        space: true,
    }],
    ..PLAIN
};

static JAVASCRIPT: LexicalSyntax = LexicalSyntax {
    line_comments: &["//"],
    block_comments: &[C_BLOCK],
    strings: &[
        StringDelimiter::multiline("`", "`", true).interpolating(),
        StringDelimiter::quoted("\""),
        StringDelimiter::quoted("'"),
    ],
    regex_literals: true,
    ..PLAIN
};

static CSHARP: LexicalSyntax = LexicalSyntax {
    line_comments: &["//"],
    block_comments: &[C_BLOCK],
    strings: &[
        StringDelimiter::multiline("$@\"", "\"", false),
        StringDelimiter::multiline("@$\"", "\"", false),
        StringDelimiter::multiline("@\"", "\"", false),
        StringDelimiter::quoted("\""),
        StringDelimiter::quoted("'"),
    ],
    ..PLAIN
};

static RUBY: LexicalSyntax = LexicalSyntax {
    line_comments: &["#"],
    block_comments: &[BlockComment {
        open: "=begin",
        close: "=end",
        line_start: true,
    }],
    strings: &[
        StringDelimiter::quoted("\"").interpolating(),
        StringDelimiter::quoted("'"),
        StringDelimiter::quoted("`").interpolating(),
    ],
    heredocs: &[
        Heredoc {
            open: "<<~",
            space: false,
        },
        Heredoc {
            open: "<<-",
            space: false,
        },
    ],
    ..PLAIN
};

static PYTHON: LexicalSyntax = LexicalSyntax {
    line_comments: &["#"],
    strings: &[
        StringDelimiter::multiline("\"\"\"", "\"\"\"", true),
        StringDelimiter::multiline("'''", "'''", true),
        StringDelimiter::quoted("\""),
        StringDelimiter::quoted("'"),
    ],
    ..PLAIN
};

static GO: LexicalSyntax = LexicalSyntax {
    line_comments: &["//"],
    block_comments: &[C_BLOCK],
    strings: &[
        StringDelimiter::multiline("`", "`", false),
        StringDelimiter::quoted("\""),
        StringDelimiter::quoted("'"),
    ],
    ..PLAIN
};

static JAVA: LexicalSyntax = LexicalSyntax {
    line_comments: &["//"],
    block_comments: &[C_BLOCK],
    strings: &[
        StringDelimiter::multiline("\"\"\"", "\"\"\"", true),
        StringDelimiter::quoted("\""),
        StringDelimiter::quoted("'"),
    ],
    ..PLAIN
};

static RUST: LexicalSyntax = LexicalSyntax {
    line_comments: &["//"],
    block_comments: &[C_BLOCK],
    strings: &[
        StringDelimiter::multiline("r##\"", "\"##", false),
        StringDelimiter::multiline("r#\"", "\"#", false),
        StringDelimiter::multiline("r\"", "\"", false),
        StringDelimiter::multiline("\"", "\"", true),
        StringDelimiter {
            char_literal: true,
            ..StringDelimiter::quoted("'")
        },
    ],
    ..PLAIN
};

static BASH: LexicalSyntax = LexicalSyntax {
    line_comments: &["#"],
    strings: &[
        StringDelimiter::multiline("\"", "\"", true).interpolating(),
        StringDelimiter::multiline("'", "'", false),
    ],
    comment_at_word_start: true,
    heredocs: SHELL_HEREDOCS,
    ..PLAIN
};

static DOCKERFILE: LexicalSyntax = LexicalSyntax {
    line_comments: &["#"],
    strings: &[
        StringDelimiter::quoted("\"").interpolating(),
        StringDelimiter::raw("'"),
    ],
    comment_at_word_start: true,
    heredocs: SHELL_HEREDOCS,
    ..PLAIN
};

static SQL: LexicalSyntax = LexicalSyntax {
    line_comments: &["--"],
    block_comments: &[C_BLOCK],
    strings: &[
        StringDelimiter::multiline("'", "'", false),
        StringDelimiter::raw("\""),
        StringDelimiter::raw("`"),
    ],
    ..PLAIN
};

static YAML: LexicalSyntax = LexicalSyntax {
    line_comments: &["#"],
    strings: &[
        StringDelimiter::multiline("\"", "\"", true),
        StringDelimiter::multiline("'", "'", false),
    ],
    comment_at_word_start: true,
    quotes_start_values: true,
    block_scalars: true,
    ..PLAIN
};

impl LexicalSyntax {
    /// Returns the lexical syntax of `language`.
    #[must_use]
    pub fn for_language(language: Language) -> &'static Self {
        match language {
            Language::Php => &PHP,
            Language::JavaScript | Language::TypeScript => &JAVASCRIPT,
            Language::CSharp => &CSHARP,
            Language::Ruby => &RUBY,
            Language::Python => &PYTHON,
            Language::Go => &GO,
            Language::Java => &JAVA,
            Language::Rust => &RUST,
            Language::Bash => &BASH,
            Language::Dockerfile => &DOCKERFILE,
            Language::Sql => &SQL,
            Language::Yaml => &YAML,
        }
    }

    /// The preferred line comment marker.
    #[must_use]
    pub fn line_comment(&self) -> &'static str {
        self.line_comments.first().copied().unwrap_or("#")
    }
}

/// Lexical class of one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Executable code.
    Code,
    /// Inside a comment, delimiters included.
    Comment,
    /// Inside a string or character literal, quotes included.
    String,
}

/// Per-byte classification of a buffer plus a code-only view of it.
#[derive(Debug, Clone)]
pub struct CodeMask {
    regions: Vec<Region>,
    interpolated: Vec<Range<usize>>,
    code: String,
    unterminated: usize,
}

/// A heredoc whose body starts at the next line break.
struct PendingHeredoc {
    name: String,
    interpolates: bool,
}

impl CodeMask {
    /// Lexes `text` with `syntax`.
    #[must_use]
    pub fn new(text: &str, syntax: &LexicalSyntax) -> Self {
        let bytes = text.as_bytes();
        let len = bytes.len();
        let mut regions = vec![Region::Code; len];
        let mut interpolated = Vec::new();
        let mut pending: VecDeque<PendingHeredoc> = VecDeque::new();
        let mut unterminated = 0;
        let mut i = 0;

        while i < len {
            if bytes[i] == b'\n' {
                if let Some(heredoc) = pending.pop_front() {
                    let body = i + 1;
                    // An opener without a terminator (`x << y` in arithmetic)
                    // leaves the rest of the buffer as it is.
                    let Some(end) = heredoc_end(bytes, body, &heredoc.name) else {
                        unterminated += 1;
                        i += 1;
                        continue;
                    };
                    regions[body..end].fill(Region::String);
                    if heredoc.interpolates {
                        interpolated.push(body..end);
                    }
                    i = end;
                    continue;
                }
                if syntax.block_scalars {
                    if let Some(end) = block_scalar_end(bytes, &regions, i) {
                        regions[i + 1..end].fill(Region::String);
                        i = end;
                        continue;
                    }
                }
                i += 1;
                continue;
            }

            if let Some(comment) = syntax
                .block_comments
                .iter()
                .find(|c| bytes[i..].starts_with(c.open.as_bytes()) && (!c.line_start || at_line_start(bytes, i)))
            {
                let (end, closed) = block_comment_end(bytes, i, comment);
                regions[i..end].fill(Region::Comment);
                unterminated += usize::from(!closed);
                i = end;
                continue;
            }

            let is_line_comment = syntax
                .line_comments
                .iter()
                .any(|m| bytes[i..].starts_with(m.as_bytes()))
                && !syntax
                    .not_comment
                    .is_some_and(|p| bytes[i..].starts_with(p.as_bytes()))
                && (!syntax.comment_at_word_start || i == 0 || bytes[i - 1].is_ascii_whitespace());
            if is_line_comment {
                let end = line_end(bytes, i);
                regions[i..end].fill(Region::Comment);
                i = end;
                continue;
            }

            if let Some((end, heredoc)) = syntax
                .heredocs
                .iter()
                .find_map(|h| heredoc_opener(bytes, i, h))
            {
                pending.push_back(heredoc);
                i = end;
                continue;
            }

            if syntax.regex_literals && bytes[i] == b'/' && regex_may_start(bytes, &regions, i) {
                if let Some(end) = regex_literal_end(bytes, i) {
                    regions[i..end].fill(Region::String);
                    i = end;
                    continue;
                }
            }

            if let Some(delimiter) = syntax
                .strings
                .iter()
                .find(|d| opens_literal(bytes, i, d))
                .filter(|_| !syntax.quotes_start_values || starts_value(bytes, i))
            {
                let body = i + delimiter.open.len();
                let (end, closed) = string_end(bytes, body, delimiter);
                regions[i..end].fill(Region::String);
                if delimiter.interpolates {
                    let inner_end = if closed { end - delimiter.close.len() } else { end };
                    interpolated.push(body..inner_end.max(body));
                }
                unterminated += usize::from(!closed);
                i = end;
                continue;
            }

            i += 1;
        }
        unterminated += pending.len();

        let code = mask_text(text, &regions);
        Self {
            regions,
            interpolated,
            code,
            unterminated,
        }
    }

    /// Region of the byte at `offset`. Offsets past the end count as code.
    #[must_use]
    pub fn region_at(&self, offset: usize) -> Region {
        self.regions.get(offset).copied().unwrap_or(Region::Code)
    }

    /// Returns true if the byte at `offset` is code.
    #[must_use]
    pub fn is_code(&self, offset: usize) -> bool {
        self.region_at(offset) == Region::Code
    }

    /// Returns true if `offset` lies inside a literal whose variables
    /// expand, such as a double-quoted shell string or a PHP heredoc.
    #[must_use]
    pub fn in_interpolation(&self, offset: usize) -> bool {
        let index = self.interpolated.partition_point(|r| r.end <= offset);
        self.interpolated
            .get(index)
            .is_some_and(|r| r.contains(&offset))
    }

    /// The buffer with comment and literal bytes replaced by spaces.
    ///
    /// Line breaks are kept and every byte offset is unchanged.
    #[must_use]
    pub fn code_text(&self) -> &str {
        &self.code
    }

    /// Number of literals or block comments cut off by a line break or the
    /// end of the buffer.
    #[must_use]
    pub fn unterminated(&self) -> usize {
        self.unterminated
    }
}

/// Keywords after which a `/` starts a regular expression, not a division.
const REGEX_KEYWORDS: &[&[u8]] = &[
    b"return", b"typeof", b"case", b"do", b"else", b"in", b"of", b"new", b"delete", b"void",
    b"throw", b"yield", b"await",
];

/// Decides from the previous token whether `/` at `i` is in operand
/// position. Identifiers, literals and closing brackets end an operand.
fn regex_may_start(bytes: &[u8], regions: &[Region], i: usize) -> bool {
    let Some(j) = (0..i)
        .rev()
        .find(|&j| regions[j] != Region::Comment && !bytes[j].is_ascii_whitespace())
    else {
        return true;
    };
    if regions[j] == Region::String {
        return false;
    }
    let b = bytes[j];
    if is_ident_byte(b) || b == b'$' {
        let start = (0..=j)
            .rev()
            .take_while(|&k| is_ident_byte(bytes[k]) || bytes[k] == b'$')
            .last()
            .unwrap_or(j);
        return REGEX_KEYWORDS.contains(&&bytes[start..=j]);
    }
    !matches!(b, b')' | b']' | b'<' | b'.' | b'+' | b'-')
}

/// End of a regular expression literal opened at `start`, or `None` when
/// no closing `/` appears on the line.
fn regex_literal_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut in_class = false;
    let mut j = start + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => {
                j += 2;
                continue;
            }
            b'\n' => return None,
            b'[' => in_class = true,
            b']' => in_class = false,
            b'/' if !in_class => return (j > start + 1).then_some(j + 1),
            _ => {}
        }
        j += 1;
    }
    None
}

/// Parses a heredoc opener at `i`: `<<<EOT`, `<<~'SQL'`, `<< "EOF"`.
fn heredoc_opener(bytes: &[u8], i: usize, heredoc: &Heredoc) -> Option<(usize, PendingHeredoc)> {
    let open = heredoc.open.as_bytes();
    if !bytes[i..].starts_with(open) {
        return None;
    }
    let mut j = i + open.len();
    // `<<<` after a two-character opener is a shell here-string.
    if bytes.get(j) == Some(&b'<') {
        return None;
    }
    if heredoc.space {
        while matches!(bytes.get(j), Some(b' ' | b'\t')) {
            j += 1;
        }
    }
    let quote = bytes.get(j).copied().filter(|b| matches!(b, b'\'' | b'"'));
    if quote.is_some() {
        j += 1;
    }
    let name_start = j;
    if !bytes.get(j).is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_') {
        return None;
    }
    while bytes.get(j).copied().is_some_and(is_ident_byte) {
        j += 1;
    }
    let name = String::from_utf8_lossy(&bytes[name_start..j]).into_owned();
    if let Some(q) = quote {
        if bytes.get(j) != Some(&q) {
            return None;
        }
        j += 1;
    }
    Some((
        j,
        PendingHeredoc {
            name,
            interpolates: quote != Some(b'\''),
        },
    ))
}

/// End of a heredoc body starting at `body`: just past the terminator name
/// on the first line whose indented text starts with it.
fn heredoc_end(bytes: &[u8], body: usize, name: &str) -> Option<usize> {
    let name = name.as_bytes();
    let mut line = body;
    while line < bytes.len() {
        let text_start = line
            + bytes[line..]
                .iter()
                .take_while(|b| matches!(b, b' ' | b'\t'))
                .count();
        let after = text_start + name.len();
        if bytes[text_start..].starts_with(name) && !bytes.get(after).copied().is_some_and(is_ident_byte) {
            return Some(after);
        }
        line = line_end(bytes, line) + 1;
    }
    None
}

fn indentation_width(bytes: &[u8], line: usize) -> usize {
    bytes[line..]
        .iter()
        .take_while(|b| matches!(b, b' ' | b'\t'))
        .count()
}

/// For the line ending at `newline`, returns the end of the indented block
/// scalar it opens (`key: |`, `- >-`), or `None`.
fn block_scalar_end(bytes: &[u8], regions: &[Region], newline: usize) -> Option<usize> {
    let start = bytes[..newline]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |p| p + 1);
    let code: Vec<u8> = (start..newline)
        .filter(|&k| regions[k] == Region::Code)
        .map(|k| bytes[k])
        .collect();
    let width = code
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |p| p + 1);
    let trimmed = &code[..width];
    let indicator = trimmed
        .iter()
        .rposition(|b| !matches!(b, b'+' | b'-' | b'0'..=b'9'))?;
    if !matches!(trimmed[indicator], b'|' | b'>') {
        return None;
    }
    let before = indicator.checked_sub(1).map(|k| trimmed[k]);
    if !matches!(before, None | Some(b' ' | b'\t' | b':' | b'-')) {
        return None;
    }

    let parent = indentation_width(bytes, start);
    let mut end = newline + 1;
    let mut line = newline + 1;
    while line < bytes.len() {
        let line_stop = line_end(bytes, line);
        let blank = bytes[line..line_stop].iter().all(u8::is_ascii_whitespace);
        if !blank {
            if indentation_width(bytes, line) <= parent {
                break;
            }
            end = line_stop;
        }
        line = line_stop + 1;
    }
    (end > newline + 1).then_some(end)
}

/// YAML quotes only open a scalar where a value starts: at the start of a
/// line or after `:`, `-`, `[`, `{`, `,` or `?`.
fn starts_value(bytes: &[u8], i: usize) -> bool {
    let previous = bytes[..i]
        .iter()
        .rev()
        .find(|b| !matches!(b, b' ' | b'\t'))
        .copied();
    matches!(previous, None | Some(b'\n' | b':' | b'-' | b'[' | b'{' | b',' | b'?'))
}

fn at_line_start(bytes: &[u8], i: usize) -> bool {
    i == 0 || bytes[i - 1] == b'\n'
}

fn line_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |p| from + p)
}

fn find(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from > bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p)
}

fn block_comment_end(bytes: &[u8], start: usize, comment: &BlockComment) -> (usize, bool) {
    let from = start + comment.open.len();
    if comment.line_start {
        let mut cursor = line_end(bytes, from);
        while cursor < bytes.len() {
            let line = cursor + 1;
            if bytes[line..].starts_with(comment.close.as_bytes()) {
                return (line_end(bytes, line), true);
            }
            cursor = line_end(bytes, line);
        }
        return (bytes.len(), false);
    }
    match find(bytes, from, comment.close.as_bytes()) {
        Some(p) => (p + comment.close.len(), true),
        None => (bytes.len(), false),
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn opens_literal(bytes: &[u8], i: usize, delimiter: &StringDelimiter) -> bool {
    if !bytes[i..].starts_with(delimiter.open.as_bytes()) {
        return false;
    }
    // Prefixed openers such as `r"` must not continue an identifier.
    if delimiter.open.as_bytes()[0].is_ascii_alphabetic() && i > 0 && is_ident_byte(bytes[i - 1]) {
        return false;
    }
    if delimiter.char_literal {
        return looks_like_char_literal(bytes, i);
    }
    true
}

/// Distinguishes `'a'` and `'\n'` from a lifetime such as `'a`.
fn looks_like_char_literal(bytes: &[u8], i: usize) -> bool {
    match bytes.get(i + 1) {
        Some(b'\\') => true,
        Some(&first) => {
            let width = utf8_width(first);
            bytes.get(i + 1 + width) == Some(&b'\'')
        }
        None => false,
    }
}

fn utf8_width(first: u8) -> usize {
    match first {
        0xF0..=0xFF => 4,
        0xE0..=0xEF => 3,
        0xC0..=0xDF => 2,
        _ => 1,
    }
}

fn string_end(bytes: &[u8], from: usize, delimiter: &StringDelimiter) -> (usize, bool) {
    let close = delimiter.close.as_bytes();
    let mut j = from;
    while j < bytes.len() {
        if delimiter.escape && bytes[j] == b'\\' {
            j = (j + 2).min(bytes.len());
            continue;
        }
        if bytes[j..].starts_with(close) {
            return (j + close.len(), true);
        }
        if bytes[j] == b'\n' && !delimiter.multiline {
            return (j, false);
        }
        j += 1;
    }
    (bytes.len(), false)
}

fn mask_text(text: &str, regions: &[Region]) -> String {
    let masked: Vec<u8> = text
        .bytes()
        .zip(regions)
        .map(|(b, region)| match region {
            Region::Code => b,
            _ if b == b'\n' || b == b'\r' => b,
            _ => b' ',
        })
        .collect();
    // Only whole literals and comments are blanked, so every multi-byte
    // character is either kept intact or fully replaced by ASCII spaces.
    String::from_utf8(masked).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Net delimiter balance of a text region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelimiterBalance {
    /// `(` minus `)`.
    pub parens: i64,
    /// `[` minus `]`.
    pub brackets: i64,
    /// `{` minus `}`.
    pub braces: i64,
    /// Literals or block comments left open.
    pub unterminated: usize,
}

impl DelimiterBalance {
    /// Measures `text`, ignoring delimiters inside comments and literals.
    #[must_use]
    pub fn measure(text: &str, syntax: &LexicalSyntax) -> Self {
        let mask = CodeMask::new(text, syntax);
        let mut balance = Self {
            unterminated: mask.unterminated(),
            ..Self::default()
        };
        for b in mask.code_text().bytes() {
            match b {
                b'(' => balance.parens += 1,
                b')' => balance.parens -= 1,
                b'[' => balance.brackets += 1,
                b']' => balance.brackets -= 1,
                b'{' => balance.braces += 1,
                b'}' => balance.braces -= 1,
                _ => {}
            }
        }
        balance
    }
}
