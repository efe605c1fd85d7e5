//! Shallow block models built on the code-only view of a document.
//!
//! None of these builds a syntax tree. They pair block delimiters and keep
//! enough position information for structural predicates: the statement that
//! introduces a block, its body and its nesting depth.

use crate::types::Span;

/// One block of code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Trimmed statement introducing the block, e.g. `catch (e)`.
    pub header: Span,
    /// Inner body, between the opener and the closer.
    pub body: Span,
    /// End of the closing token or of the last body line.
    pub end: usize,
    /// Nesting depth, 0 for top level.
    pub depth: usize,
}

impl Block {
    /// Returns true if `offset` lies inside the body.
    #[must_use]
    pub fn encloses(&self, offset: usize) -> bool {
        self.body.start <= offset && offset < self.body.end
    }
}

pub(crate) fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Offsets of every occurrence of `token` in `haystack` that does not
/// continue an identifier on either side.
pub(crate) fn find_tokens<'a>(haystack: &'a str, token: &'a str) -> impl Iterator<Item = usize> + 'a {
    let bytes = haystack.as_bytes();
    let tok = token.as_bytes();
    let check_left = tok.first().copied().is_some_and(is_ident_byte);
    let check_right = tok.last().copied().is_some_and(is_ident_byte);
    haystack.match_indices(token).filter_map(move |(i, _)| {
        let left_ok = !check_left || i == 0 || !is_ident_byte(bytes[i - 1]);
        let end = i + tok.len();
        let right_ok = !check_right || end >= bytes.len() || !is_ident_byte(bytes[end]);
        (left_ok && right_ok).then_some(i)
    })
}

/// Returns the first token of `tokens` found in `haystack`, with its offset.
pub(crate) fn find_any<'t>(haystack: &str, tokens: &'t [String]) -> Option<(usize, &'t str)> {
    tokens
        .iter()
        .filter_map(|t| find_tokens(haystack, t).next().map(|i| (i, t.as_str())))
        .min_by_key(|&(i, _)| i)
}

/// Shrinks `span` to exclude surrounding whitespace.
pub(crate) fn trim_span(text: &str, span: Span) -> Span {
    let slice = &text[span.start..span.end];
    let start = span.start + (slice.len() - slice.trim_start().len());
    let end = span.start + slice.trim_end().len();
    Span::new(start, end.max(start))
}

fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map_or(0, |p| p + 1)
}

fn line_end(text: &str, offset: usize) -> usize {
    text[offset..].find('\n').map_or(text.len(), |p| offset + p)
}

/// Span of the nearest non-blank line ending before `start`.
pub(crate) fn previous_nonblank_line(text: &str, start: usize) -> Option<Span> {
    let mut cursor = line_start(text, start);
    while cursor > 0 {
        let end = cursor - 1;
        let begin = line_start(text, end);
        if !text[begin..end].trim().is_empty() {
            return Some(Span::new(begin, end));
        }
        cursor = begin;
    }
    None
}

/// Returns true if a body holds no code.
///
/// Whitespace, statement separators and the given filler lines (`pass`)
/// do not count as code.
#[must_use]
pub fn body_is_empty(code: &str, fillers: &[&str]) -> bool {
    code.lines().all(|line| {
        let line = line.trim().trim_matches(';').trim();
        line.is_empty() || fillers.contains(&line)
    })
}

// ────────────────────────────────────────────
// Brace blocks
// ────────────────────────────────────────────

/// Pairs `{` and `}` in the code-only view.
///
/// The header runs from the last `{`, `}` or `;` before the opener on the
/// same line, or covers the previous non-blank line when the opener starts
/// its line.
#[must_use]
pub fn brace_blocks(code: &str) -> Vec<Block> {
    let mut stack = Vec::new();
    let mut blocks = Vec::new();
    for (i, b) in code.bytes().enumerate() {
        match b {
            b'{' => stack.push(i),
            b'}' => {
                if let Some(open) = stack.pop() {
                    blocks.push(Block {
                        header: brace_header(code, open),
                        body: Span::new(open + 1, i),
                        end: i + 1,
                        depth: stack.len(),
                    });
                }
            }
            _ => {}
        }
    }
    blocks.sort_by_key(|b| b.body.start);
    blocks
}

fn statement_part(code: &str, line: Span) -> Span {
    let before = &code[line.start..line.end];
    let cut = before.rfind(['{', '}', ';']).map_or(0, |p| p + 1);
    trim_span(code, Span::new(line.start + cut, line.end))
}

fn brace_header(code: &str, open: usize) -> Span {
    let start = line_start(code, open);
    if code[start..open].trim().is_empty() {
        if let Some(prev) = previous_nonblank_line(code, start) {
            return statement_part(code, prev);
        }
    }
    statement_part(code, Span::new(start, open))
}

// ────────────────────────────────────────────
// Ruby keyword blocks
// ────────────────────────────────────────────

const RUBY_OPENERS: &[&str] = &["def", "class", "module", "begin", "case"];
const RUBY_STATEMENT_OPENERS: &[&str] = &["if", "unless", "while", "until", "for"];
const RUBY_LOOPS: &[&str] = &["while", "until", "for"];
const RUBY_CLAUSES: &[&str] = &["rescue", "ensure", "else", "elsif", "when"];

struct RubyOpen {
    header: Span,
    keyword_end: usize,
    body_start: usize,
    clause: Option<(Span, usize)>,
}

fn is_ruby_word_byte(b: u8) -> bool {
    is_ident_byte(b) || b == b'?' || b == b'!'
}

/// Words of a line as `(offset, word)`, skipping method calls (`x.end`),
/// symbols (`:end`) and hash keys (`end:`).
fn ruby_keywords(code: &str, line: Span) -> Vec<(usize, &str)> {
    let bytes = code.as_bytes();
    let mut words = Vec::new();
    let mut i = line.start;
    while i < line.end {
        if !is_ruby_word_byte(bytes[i]) || bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < line.end && is_ruby_word_byte(bytes[i]) {
            i += 1;
        }
        let prev = start.checked_sub(1).map(|p| bytes[p]);
        let next = bytes.get(i).copied();
        let after_next = bytes.get(i + 1).copied();
        let is_member = matches!(prev, Some(b'.' | b':' | b'@' | b'$'));
        let is_key = next == Some(b':') && after_next != Some(b':');
        if !is_member && !is_key {
            words.push((start, &code[start..i]));
        }
    }
    words
}

fn at_statement_start(code: &str, line: Span, offset: usize) -> bool {
    code[line.start..offset]
        .trim_end()
        .chars()
        .last()
        .map_or(true, |c| matches!(c, '=' | ';' | '('))
}

/// Builds Ruby keyword blocks and `rescue`/`ensure`/`else` clause blocks.
#[must_use]
pub fn ruby_blocks(code: &str) -> Vec<Block> {
    let mut stack: Vec<RubyOpen> = Vec::new();
    let mut blocks = Vec::new();
    let mut offset = 0;

    while offset <= code.len() {
        let end = line_end(code, offset);
        let line = Span::new(offset, end);
        let header = trim_span(code, line);
        let next_line = (end + 1).min(code.len());
        let mut opened_loop = false;

        for (pos, word) in ruby_keywords(code, line) {
            let first_word = pos == header.start;
            let opens = RUBY_OPENERS.contains(&word)
                || (RUBY_STATEMENT_OPENERS.contains(&word) && at_statement_start(code, line, pos))
                || (word == "do" && !opened_loop);

            if opens {
                opened_loop |= RUBY_LOOPS.contains(&word);
                stack.push(RubyOpen {
                    header,
                    keyword_end: pos + word.len(),
                    body_start: next_line,
                    clause: None,
                });
            } else if first_word && RUBY_CLAUSES.contains(&word) {
                let depth = stack.len();
                if let Some(open) = stack.last_mut() {
                    if let Some(clause) = open.clause.take() {
                        blocks.push(close_clause(clause, offset, depth));
                    }
                    open.clause = Some((header, next_line));
                }
            } else if word == "end" {
                if let Some(open) = stack.pop() {
                    let depth = stack.len();
                    if let Some(clause) = open.clause {
                        blocks.push(close_clause(clause, pos, depth + 1));
                    }
                    let body = if open.body_start <= pos {
                        Span::new(open.body_start, pos)
                    } else {
                        Span::new(open.keyword_end, pos)
                    };
                    blocks.push(Block {
                        header: open.header,
                        body,
                        end: pos + word.len(),
                        depth,
                    });
                }
            }
        }

        if end >= code.len() {
            break;
        }
        offset = end + 1;
    }

    blocks.sort_by_key(|b| b.body.start);
    blocks
}

fn close_clause((header, body_start): (Span, usize), until: usize, depth: usize) -> Block {
    Block {
        header,
        body: Span::new(body_start.min(until), until),
        end: until,
        depth,
    }
}

// ────────────────────────────────────────────
// Indentation blocks
// ────────────────────────────────────────────

fn indentation(line: &str) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += 8 - width % 8,
            _ => break,
        }
    }
    width
}

fn bracket_delta(line: &str) -> i64 {
    line.bytes()
        .map(|b| match b {
            b'(' | b'[' | b'{' => 1,
            b')' | b']' | b'}' => -1,
            _ => 0,
        })
        .sum()
}

/// Builds indentation blocks: a logical line ending in `:` opens a block
/// whose body is every following line indented deeper.
#[must_use]
pub fn indentation_blocks(code: &str) -> Vec<Block> {
    let lines = line_spans(code);

    let mut blocks = Vec::new();
    let mut depth = 0i64;
    let mut logical_start = 0;

    for (index, line) in lines.iter().enumerate() {
        let text = &code[line.start..line.end];
        if depth <= 0 {
            logical_start = index;
            depth = 0;
        }
        depth += bracket_delta(text);
        if depth > 0 || !text.trim_end().ends_with(':') {
            continue;
        }

        let first = lines[logical_start];
        let indent = indentation(&code[first.start..first.end]);
        let header = trim_span(code, Span::new(first.start, line.end));
        let body_start = (line.end + 1).min(code.len());
        let mut body_end = body_start;
        for next in &lines[index + 1..] {
            let next_text = &code[next.start..next.end];
            if next_text.trim().is_empty() {
                continue;
            }
            if indentation(next_text) <= indent {
                break;
            }
            body_end = next.end;
        }

        blocks.push(Block {
            header,
            body: Span::new(body_start, body_end),
            end: body_end,
            depth: 0,
        });
    }

    assign_depths(&mut blocks);
    blocks
}

fn line_spans(code: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut offset = 0;
    loop {
        let end = line_end(code, offset);
        spans.push(Span::new(offset, end));
        if end >= code.len() {
            break;
        }
        offset = end + 1;
    }
    spans
}

/// Sets each block's depth to the number of bodies holding its header, then
/// orders blocks by body start.
fn assign_depths(blocks: &mut [Block]) {
    let bodies: Vec<Span> = blocks.iter().map(|b| b.body).collect();
    for block in blocks.iter_mut() {
        let at = block.header.start;
        block.depth = bodies.iter().filter(|body| body.start <= at && at < body.end).count();
    }
    blocks.sort_by_key(|b| b.body.start);
}

// ────────────────────────────────────────────
// YAML blocks
// ────────────────────────────────────────────

fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn is_document_marker(line: &str) -> bool {
    let line = line.trim_end();
    ["---", "..."]
        .iter()
        .any(|m| line == *m || line.strip_prefix(m).is_some_and(|r| r.starts_with(' ')))
}

fn is_sequence_item(trimmed: &str) -> bool {
    trimmed == "-" || trimmed.starts_with("- ")
}

/// A key whose value is empty or only node properties (`&anchor`, `!tag`).
fn opens_mapping(rest: &str) -> bool {
    let mut rest = rest.trim_end();
    loop {
        match rest.rfind(char::is_whitespace) {
            Some(pos) if is_node_property(&rest[pos + 1..]) => rest = rest[..pos].trim_end(),
            _ => return rest.len() > 1 && rest.ends_with(':'),
        }
    }
}

fn is_node_property(word: &str) -> bool {
    word.len() > 1 && (word.starts_with('&') || word.starts_with('!'))
}

/// End of the last line after `lines[from]` indented deeper than `column`.
/// With `siblings`, sequence items at exactly `column` count as well.
fn nested_end(
    code: &str,
    lines: &[Span],
    from: usize,
    column: usize,
    siblings: bool,
) -> Option<usize> {
    let mut end = None;
    for line in lines.iter().skip(from) {
        let text = &code[line.start..line.end];
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        let indent = leading_spaces(text);
        let nested = indent > column || (siblings && indent == column && is_sequence_item(trimmed));
        if !nested {
            break;
        }
        end = Some(line.end);
    }
    end
}

/// Builds YAML blocks over the code-only view.
///
/// A key ending in `:` owns the lines indented deeper than the key, plus
/// sequence items at its own indentation. A `- ` item owns the rest of its
/// line and every deeper line. `---` opens a document that runs to the next
/// marker.
#[must_use]
pub fn yaml_blocks(code: &str) -> Vec<Block> {
    let lines = line_spans(code);
    let mut blocks = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let text = &code[line.start..line.end];
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_document_marker(text) {
            if !trimmed.starts_with("---") {
                continue;
            }
            let end = lines[index + 1..]
                .iter()
                .take_while(|l| !is_document_marker(&code[l.start..l.end]))
                .filter(|l| !code[l.start..l.end].trim().is_empty())
                .last()
                .map_or(line.end, |l| l.end);
            blocks.push(Block {
                header: Span::new(line.start, line.start + 3),
                body: Span::new(line.end, end),
                end,
                depth: 0,
            });
            continue;
        }

        let indent = leading_spaces(text);
        let mut column = indent;
        let mut rest = text[indent..].trim_end();
        while is_sequence_item(rest) {
            let dash = line.start + column;
            let end = nested_end(code, &lines, index + 1, column, false).unwrap_or(line.end);
            blocks.push(Block {
                header: Span::new(dash, dash + 1),
                body: Span::new(dash + 1, end),
                end,
                depth: 0,
            });
            let after = &rest[1..];
            column += 1 + leading_spaces(after);
            rest = after.trim_start();
        }

        if opens_mapping(rest) {
            let end = nested_end(code, &lines, index + 1, column, column == indent)
                .unwrap_or(line.end);
            blocks.push(Block {
                header: trim_span(code, Span::new(line.start + column, line.end)),
                body: Span::new(line.end, end),
                end,
                depth: 0,
            });
        }
    }

    assign_depths(&mut blocks);
    blocks
}
