//! Structural predicates evaluated over a document's block model.

use std::collections::HashMap;

use regex::Regex;

use crate::catalog::model::{RegexPattern, Structure, UsageTemplate, TARGET_CAPTURE};
use crate::types::Span;

use super::blocks::{body_is_empty, find_any, find_tokens, is_ident_byte, previous_nonblank_line};
use super::{Block, Candidate, ScanContext};
use crate::syntax::Region;

/// Confidence factor when the acquired resource is handed to the caller.
const RETURNED_RESOURCE_FACTOR: f32 = 0.5;

/// Header keywords whose cleanup lives in a sibling clause.
const PROTECTED_HEADERS: &[&str] = &["try", "begin"];

/// Evaluates `structure` against the document in `context`.
#[must_use]
pub fn evaluate(structure: &Structure, context: &ScanContext<'_>) -> Vec<Candidate> {
    match structure {
        Structure::EmptyBlock { keywords } => empty_blocks(context, keywords),
        Structure::UnreleasedResource {
            acquire,
            release,
            guards,
        } => unreleased_resources(context, acquire, release, guards),
        Structure::CallWithConcatenation { callees } => concatenated_calls(context, callees),
        Structure::NestedIn {
            statements,
            enclosing,
            stop_at,
        } => nested_statements(context, statements, enclosing, stop_at),
        Structure::LongBlock {
            openers,
            max_lines,
        } => long_blocks(context, openers, *max_lines),
        Structure::UnusedBinding {
            declaration,
            item,
            usages,
            after_declaration,
        } => unused_bindings(context, declaration, item.as_ref(), usages, *after_declaration),
        Structure::UnguardedUse {
            declaration,
            usage,
            guards,
        } => unguarded_uses(context, declaration, usage, guards),
        Structure::RepeatedName { pattern } => repeated_names(context, pattern),
    }
}

fn header_keyword(context: &ScanContext<'_>, block: &Block, keywords: &[String]) -> Option<Span> {
    find_any(context.code_of(block.header), keywords)
        .map(|(pos, kw)| Span::new(block.header.start + pos, block.header.start + pos + kw.len()))
}

fn empty_blocks(context: &ScanContext<'_>, keywords: &[String]) -> Vec<Candidate> {
    let fillers = context.idioms().fillers;
    context
        .blocks()
        .iter()
        .filter_map(|block| {
            let keyword = header_keyword(context, block, keywords)?;
            body_is_empty(context.code_of(block.body), fillers).then(|| {
                Candidate::new(Span::new(keyword.start, block.end))
                    .with_capture("keyword", keyword)
                    .with_capture("body", block.body)
            })
        })
        .collect()
}

fn line_has_token(context: &ScanContext<'_>, line: Span, tokens: &[String]) -> bool {
    find_any(context.code_of(line), tokens).is_some()
}

fn unreleased_resources(
    context: &ScanContext<'_>,
    acquire: &[String],
    release: &[String],
    guards: &[String],
) -> Vec<Candidate> {
    let code = context.code();
    let document = context.document();
    let mut candidates = Vec::new();

    for token in acquire {
        for pos in find_tokens(code, token) {
            let line = document.line_bounds(document.line_index().line_of(pos));
            let line = Span::new(line.start, line.end);
            let previous = previous_nonblank_line(code, line.start);
            let guarded = line_has_token(context, line, guards)
                || previous.is_some_and(|p| line_has_token(context, p, guards));
            if guarded {
                continue;
            }

            let region_end = release_region_end(context, pos);
            let after = pos + token.len();
            let released = release.iter().any(|r| {
                code.get(after..region_end)
                    .is_some_and(|rest| find_tokens(rest, r).next().is_some())
            });
            if released {
                continue;
            }

            let span = Span::new(pos, after);
            let returned = find_tokens(context.code_of(line), "return").next().is_some();
            let factor = if returned { RETURNED_RESOURCE_FACTOR } else { 1.0 };
            candidates.push(
                Candidate::new(span)
                    .with_capture("resource", span)
                    .with_factor(factor),
            );
        }
    }
    candidates
}

/// End of the region searched for a release: the innermost enclosing block,
/// widened past `try`/`begin` blocks whose cleanup sits in a sibling clause.
fn release_region_end(context: &ScanContext<'_>, offset: usize) -> usize {
    let protected: Vec<String> = PROTECTED_HEADERS.iter().map(|s| (*s).to_string()).collect();
    for block in context.enclosing(offset) {
        if header_keyword(context, block, &protected).is_none() {
            return block.body.end;
        }
    }
    context.code().len()
}

fn matching_paren(code: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in code.bytes().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn has_operator(code: &str, op: &str) -> bool {
    let op_bytes = op.as_bytes();
    code.match_indices(op).any(|(i, _)| {
        let bytes = code.as_bytes();
        let prev = i.checked_sub(1).map(|p| bytes[p]);
        let next = bytes.get(i + op.len()).copied();
        match op_bytes {
            [c] if !c.is_ascii_alphanumeric() => {
                let doubled = prev == Some(*c) || next == Some(*c);
                let assignment = next == Some(b'=');
                let decimal = *c == b'.'
                    && (prev.is_some_and(|p| p.is_ascii_digit())
                        || next.is_some_and(|n| n.is_ascii_digit()));
                !doubled && !assignment && !decimal
            }
            [first, ..] if is_ident_byte(*first) => !prev.is_some_and(is_ident_byte),
            _ => true,
        }
    })
}

/// Interpolation markers: an identifier prefix (`f"`) must be code on a
/// word boundary, a sigil ending in a quote (`$"`) must not be a comment,
/// anything else (`${`, `#{`) must sit inside a literal.
fn has_marker(context: &ScanContext<'_>, args: Span, marker: &str) -> bool {
    let text = &context.text()[args.start..args.end];
    let bytes = marker.as_bytes();
    let prefix = bytes.first().copied().is_some_and(is_ident_byte);
    let quoted = matches!(bytes.last(), Some(b'"' | b'\''));
    text.match_indices(marker).any(|(i, _)| {
        let region = context.mask().region_at(args.start + i);
        if prefix {
            let boundary = i == 0 || !is_ident_byte(text.as_bytes()[i - 1]);
            boundary && region == Region::Code
        } else if quoted {
            region != Region::Comment
        } else {
            region == Region::String
        }
    })
}

fn concatenated_calls(context: &ScanContext<'_>, callees: &[String]) -> Vec<Candidate> {
    let code = context.code();
    let idioms = context.idioms();
    let mut candidates = Vec::new();

    for callee in callees {
        for pos in find_tokens(code, callee) {
            let after = pos + callee.len();
            let open = if callee.ends_with('(') {
                after - 1
            } else {
                let skipped = code[after..].len() - code[after..].trim_start().len();
                after + skipped
            };
            if code.as_bytes().get(open) != Some(&b'(') {
                continue;
            }
            let Some(close) = matching_paren(code, open) else {
                continue;
            };
            let args = Span::new(open + 1, close);
            let args_code = context.code_of(args);
            let has_string = (args.start..args.end)
                .any(|i| context.mask().region_at(i) == Region::String);

            let concatenated = has_string
                && idioms
                    .concatenation
                    .iter()
                    .any(|op| has_operator(args_code, op));
            let interpolated = idioms
                .interpolation
                .iter()
                .any(|m| has_marker(context, args, m));
            if !(concatenated || interpolated) {
                continue;
            }

            let callee_span = Span::new(pos, after);
            candidates.push(
                Candidate::new(Span::new(pos, close + 1))
                    .with_capture("callee", callee_span)
                    .with_capture("args", args),
            );
        }
    }
    candidates
}

fn nested_statements(
    context: &ScanContext<'_>,
    statements: &[String],
    enclosing: &[String],
    stop_at: &[String],
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for statement in statements {
        for pos in find_tokens(context.code(), statement) {
            for block in context.enclosing(pos) {
                if header_keyword(context, block, stop_at).is_some() {
                    break;
                }
                if header_keyword(context, block, enclosing).is_some() {
                    let span = Span::new(pos, pos + statement.len());
                    candidates.push(Candidate::new(span).with_capture("statement", span));
                    break;
                }
            }
        }
    }
    candidates
}

fn long_blocks(context: &ScanContext<'_>, openers: &[String], max_lines: usize) -> Vec<Candidate> {
    context
        .blocks()
        .iter()
        .filter_map(|block| {
            let opener = header_keyword(context, block, openers)?;
            let lines = context
                .code_of(block.body)
                .lines()
                .filter(|l| !l.trim().is_empty())
                .count();
            (lines > max_lines).then(|| Candidate::new(opener).with_capture("opener", opener))
        })
        .collect()
}

/// A name bound by a declaration.
struct Binding {
    /// Reported span: the `target` group if present, else the name.
    span: Span,
    name: Span,
    declaration: Span,
}

fn span_of(m: regex::Match<'_>, base: usize) -> Span {
    Span::new(base + m.start(), base + m.end())
}

/// Every binding introduced by `declaration`, optionally split into items
/// found inside its `list` group.
fn bindings(text: &str, declaration: &RegexPattern, item: Option<&RegexPattern>) -> Vec<Binding> {
    let mut found = Vec::new();
    for caps in declaration.regex().captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let extent = span_of(whole, 0);
        match item {
            None => {
                let Some(name) = caps.name("name") else {
                    continue;
                };
                let name = span_of(name, 0);
                let span = caps.name(TARGET_CAPTURE).map_or(name, |t| span_of(t, 0));
                found.push(Binding {
                    span,
                    name,
                    declaration: extent,
                });
            }
            Some(item) => {
                let Some(list) = caps.name("list") else {
                    continue;
                };
                for inner in item.regex().captures_iter(list.as_str()) {
                    let Some(name) = inner.name("name") else {
                        continue;
                    };
                    let name = span_of(name, list.start());
                    let span = inner
                        .name(TARGET_CAPTURE)
                        .map_or(name, |t| span_of(t, list.start()));
                    found.push(Binding {
                        span,
                        name,
                        declaration: extent,
                    });
                }
            }
        }
    }
    found
}

/// First `regex` hit in `range` that starts in code or inside an expanding
/// literal.
fn first_live_hit(context: &ScanContext<'_>, regex: &Regex, range: Span) -> Option<Span> {
    let text = context.text().get(range.start..range.end)?;
    regex
        .find_iter(text)
        .map(|m| span_of(m, range.start))
        .find(|hit| context.mask().is_code(hit.start) || context.mask().in_interpolation(hit.start))
}

/// End of the innermost block around `offset`, or of the document.
fn scope_end(context: &ScanContext<'_>, offset: usize) -> usize {
    context
        .enclosing(offset)
        .next()
        .map_or(context.text().len(), |b| b.body.end)
}

fn unused_bindings(
    context: &ScanContext<'_>,
    declaration: &RegexPattern,
    item: Option<&RegexPattern>,
    usages: &[UsageTemplate],
    after_declaration: bool,
) -> Vec<Candidate> {
    let text = context.text();
    let mut candidates = Vec::new();

    for binding in bindings(text, declaration, item) {
        let name = &text[binding.name.start..binding.name.end];
        let regexes: Vec<Regex> = usages.iter().filter_map(|u| u.compile(name)).collect();
        let ranges = if after_declaration {
            let end = scope_end(context, binding.name.start).max(binding.declaration.end);
            vec![Span::new(binding.declaration.end, end)]
        } else {
            vec![
                Span::new(0, binding.declaration.start),
                Span::new(binding.declaration.end, text.len()),
            ]
        };
        let used = ranges.iter().any(|range| {
            regexes
                .iter()
                .any(|regex| first_live_hit(context, regex, *range).is_some())
        });
        if used {
            continue;
        }

        let mut candidate = Candidate::new(binding.span)
            .with_extent(binding.declaration)
            .with_capture("name", binding.name)
            .with_capture("declaration", binding.declaration);
        candidate.anchor = binding.name.start;
        candidates.push(candidate);
    }
    candidates
}

fn unguarded_uses(
    context: &ScanContext<'_>,
    declaration: &RegexPattern,
    usage: &UsageTemplate,
    guards: &[UsageTemplate],
) -> Vec<Candidate> {
    let text = context.text();
    let mut candidates = Vec::new();

    for binding in bindings(text, declaration, None) {
        if !context.mask().is_code(binding.name.start) {
            continue;
        }
        let name = &text[binding.name.start..binding.name.end];
        let window = Span::new(
            binding.declaration.end,
            scope_end(context, binding.name.start).max(binding.declaration.end),
        );
        let Some(first_use) = usage
            .compile(name)
            .and_then(|regex| first_live_hit(context, &regex, window))
        else {
            continue;
        };
        let guarded = guards.iter().filter_map(|g| g.compile(name)).any(|regex| {
            first_live_hit(context, &regex, window).is_some_and(|guard| guard.start <= first_use.start)
        });
        if guarded {
            continue;
        }

        candidates.push(
            Candidate::new(first_use)
                .with_capture("name", binding.name)
                .with_capture("use", first_use),
        );
    }
    candidates
}

fn repeated_names(context: &ScanContext<'_>, pattern: &RegexPattern) -> Vec<Candidate> {
    let text = context.text();
    let mut seen: HashMap<(Option<usize>, usize, &str), Span> = HashMap::new();
    let mut candidates = Vec::new();

    for caps in pattern.regex().captures_iter(text) {
        let Some(name) = caps.name("name") else {
            continue;
        };
        let span = span_of(name, 0);
        if !context.mask().is_code(span.start) {
            continue;
        }
        let scope = context.enclosing(span.start).next().map(|b| b.body.start);
        let column = span.start - text[..span.start].rfind('\n').map_or(0, |p| p + 1);
        match seen.get(&(scope, column, name.as_str())) {
            Some(first) => candidates.push(
                Candidate::new(span)
                    .with_capture("name", span)
                    .with_capture("first", *first),
            ),
            None => {
                seen.insert((scope, column, name.as_str()), span);
            }
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SourceDocument;
    use crate::language::Language;
    use crate::matcher::{blocks, Matcher};

    struct Brace(Language, &'static [&'static str], &'static [&'static str]);

    impl Matcher for Brace {
        fn language(&self) -> Language {
            self.0
        }

        fn concatenation_operators(&self) -> &'static [&'static str] {
            self.1
        }

        fn interpolation_markers(&self) -> &'static [&'static str] {
            self.2
        }
    }

    struct Ruby;

    impl Matcher for Ruby {
        fn language(&self) -> Language {
            Language::Ruby
        }

        fn blocks(&self, code: &str) -> Vec<Block> {
            blocks::ruby_blocks(code)
        }

        fn interpolation_markers(&self) -> &'static [&'static str] {
            &["#{"]
        }
    }

    struct Yaml;

    impl Matcher for Yaml {
        fn language(&self) -> Language {
            Language::Yaml
        }

        fn blocks(&self, code: &str) -> Vec<Block> {
            blocks::yaml_blocks(code)
        }
    }

    struct Python;

    impl Matcher for Python {
        fn language(&self) -> Language {
            Language::Python
        }

        fn blocks(&self, code: &str) -> Vec<Block> {
            blocks::indentation_blocks(code)
        }

        fn empty_body_fillers(&self) -> &'static [&'static str] {
            &["pass", "..."]
        }
    }

    fn regex(source: &str) -> RegexPattern {
        RegexPattern::new(source).unwrap()
    }

    fn usage(source: &str) -> UsageTemplate {
        UsageTemplate::new(source).unwrap()
    }

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn run<M: Matcher>(matcher: &M, text: &str, structure: &Structure) -> Vec<(String, Candidate)> {
        let doc = SourceDocument::new("test", matcher.language(), text);
        let context = ScanContext::new(matcher, &doc);
        evaluate(structure, &context)
            .into_iter()
            .map(|c| (text[c.span.start..c.span.end].to_string(), c))
            .collect()
    }

    fn js() -> Brace {
        Brace(Language::JavaScript, &["+"], &["${"])
    }

    #[test]
    fn empty_catch_is_found() {
        let structure = Structure::EmptyBlock {
            keywords: words(&["catch"]),
        };
        let text = "try {\n  run();\n} catch (e) {\n  // ignored\n}\ntry { a(); } catch (e) { log(e); }\n";
        let found = run(&js(), text, &structure);
        assert_eq!(found.len(), 1);
        assert!(found[0].0.starts_with("catch (e) {"));
        assert!(found[0].1.captures.get("keyword").is_some());
    }

    #[test]
    fn python_pass_body_is_empty() {
        let structure = Structure::EmptyBlock {
            keywords: words(&["except"]),
        };
        let text = "try:\n    f()\nexcept ValueError:\n    pass\nexcept KeyError:\n    log()\n";
        let found = run(&Python, text, &structure);
        assert_eq!(found.len(), 1);
        assert!(found[0].0.starts_with("except ValueError"));
    }

    #[test]
    fn ruby_empty_rescue() {
        let structure = Structure::EmptyBlock {
            keywords: words(&["rescue"]),
        };
        let text = "begin\n  risky\nrescue StandardError\nend\n";
        assert_eq!(run(&Ruby, text, &structure).len(), 1);
    }

    #[test]
    fn unreleased_resource_in_block() {
        let structure = Structure::UnreleasedResource {
            acquire: words(&["open("]),
            release: words(&[".close("]),
            guards: words(&["with"]),
        };
        let leaked = "def f(p):\n    fh = open(p)\n    return fh.read()\n";
        assert_eq!(run(&Python, leaked, &structure).len(), 1);
        let closed = "def f(p):\n    fh = open(p)\n    data = fh.read()\n    fh.close()\n";
        assert!(run(&Python, closed, &structure).is_empty());
        let guarded = "def f(p):\n    with open(p) as fh:\n        return fh.read()\n";
        assert!(run(&Python, guarded, &structure).is_empty());
    }

    #[test]
    fn returned_resource_lowers_confidence() {
        let structure = Structure::UnreleasedResource {
            acquire: words(&["new FileInputStream("]),
            release: words(&[".close("]),
            guards: words(&["try ("]),
        };
        let text = "InputStream open(File f) {\n    return new FileInputStream(f);\n}\n";
        let found = run(&Brace(Language::Java, &["+"], &[]), text, &structure);
        assert_eq!(found.len(), 1);
        assert!((found[0].1.factor - RETURNED_RESOURCE_FACTOR).abs() < f32::EPSILON);
    }

    #[test]
    fn release_in_finally_counts() {
        let structure = Structure::UnreleasedResource {
            acquire: words(&["new FileInputStream("]),
            release: words(&[".close("]),
            guards: Vec::new(),
        };
        let text = "void f() {\n  try {\n    in = new FileInputStream(x);\n  } finally {\n    in.close();\n  }\n}\n";
        assert!(run(&Brace(Language::Java, &["+"], &[]), text, &structure).is_empty());
    }

    #[test]
    fn sql_concatenation_in_call() {
        let structure = Structure::CallWithConcatenation {
            callees: words(&["query"]),
        };
        let text = "db.query(\"SELECT * FROM t WHERE id = \" + id);\ndb.query(\"SELECT 1\", [a + b]);\n";
        let found = run(&js(), text, &structure);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].0, "query(\"SELECT * FROM t WHERE id = \" + id)");

        let safe = "db.query(\"SELECT * FROM t WHERE id = ?\", [id]);\ncount = query(a + b);\n";
        assert!(run(&js(), safe, &structure).is_empty());
    }

    #[test]
    fn interpolation_marker_in_string() {
        let structure = Structure::CallWithConcatenation {
            callees: words(&["query"]),
        };
        let text = "db.query(`SELECT * FROM t WHERE id = ${id}`);\n";
        assert_eq!(run(&js(), text, &structure).len(), 1);
        let ruby = "conn.query(\"SELECT * FROM t WHERE id = #{id}\")\n";
        assert_eq!(run(&Ruby, ruby, &structure).len(), 1);
    }

    #[test]
    fn sigil_markers_must_sit_in_literals() {
        let structure = Structure::CallWithConcatenation {
            callees: words(&["query"]),
        };
        let php = Brace(Language::Php, &["."], &["$"]);
        let text = "$db->query(\"SELECT * FROM t WHERE id = $id\");\n";
        assert_eq!(run(&php, text, &structure).len(), 1);
        let bound = "$db->query($sql, [$id]);\n";
        assert!(run(&php, bound, &structure).is_empty());

        let csharp = Brace(Language::CSharp, &["+"], &["$\""]);
        let text = "cmd.query($\"SELECT * FROM t WHERE id = {id}\");\n";
        assert_eq!(run(&csharp, text, &structure).len(), 1);
    }

    #[test]
    fn concatenation_in_comment_is_ignored() {
        let structure = Structure::CallWithConcatenation {
            callees: words(&["query"]),
        };
        let text = "db.query(\"SELECT 1\" /* + x */);\n";
        assert!(run(&js(), text, &structure).is_empty());
    }

    #[test]
    fn operator_heuristics() {
        assert!(has_operator("\"a\" + b", "+"));
        assert!(!has_operator("i++", "+"));
        assert!(!has_operator("x += 1", "+"));
        assert!(has_operator("\"a\" . $b", "."));
        assert!(!has_operator("1.5", "."));
        assert!(has_operator("x.format(y)", ".format("));
        assert!(!has_operator("myfmt.Sprintf(", "fmt.Sprintf("));
        assert!(has_operator("fmt.Sprintf(", "fmt.Sprintf("));
    }

    #[test]
    fn defer_in_loop() {
        let structure = Structure::NestedIn {
            statements: words(&["defer"]),
            enclosing: words(&["for"]),
            stop_at: words(&["func"]),
        };
        let go = Brace(Language::Go, &["+"], &[]);
        let text = "func f() {\n\tfor _, p := range ps {\n\t\tdefer p.Close()\n\t}\n}\n";
        assert_eq!(run(&go, text, &structure).len(), 1);
        let wrapped = "func f() {\n\tfor _, p := range ps {\n\t\tgo func() {\n\t\t\tdefer wg.Done()\n\t\t}()\n\t}\n}\n";
        assert!(run(&go, wrapped, &structure).is_empty());
        let plain = "func f() {\n\tdefer x.Close()\n}\n";
        assert!(run(&go, plain, &structure).is_empty());
    }

    #[test]
    fn long_method() {
        let structure = Structure::LongBlock {
            openers: words(&["def"]),
            max_lines: 2,
        };
        let text = "def short\n  a\nend\n\ndef long\n  a\n  b\n\n  c\nend\n";
        let found = run(&Ruby, text, &structure);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1.captures.get("opener"), Some(found[0].1.span));
        assert_eq!(found[0].1.span.start, text.find("def long").unwrap());
    }

    #[test]
    fn unused_import_items() {
        let structure = Structure::UnusedBinding {
            declaration: regex(r"(?m)^import\s+(?:type\s+)?\{(?P<list>[^}]*)\}\s*from"),
            item: Some(regex(r"(?:^|,)\s*(?:\w+\s+as\s+)?(?P<name>[A-Za-z_$][\w$]*)")),
            usages: vec![usage(r"\b${name}\b")],
            after_declaration: false,
        };
        let text = "import { a, b as c, d } from 'm';\nuse(a);\nconst s = `${d}`;\n// c\n";
        let found = run(&Brace(Language::TypeScript, &["+"], &[]), text, &structure);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "c");
        assert_eq!(
            found[0].1.captures.get("declaration").map(|d| d.start),
            Some(0)
        );
    }

    #[test]
    fn mutable_binding_never_written() {
        let structure = Structure::UnusedBinding {
            declaration: regex(r"\blet[ \t]+(?P<target>mut[ \t]+)(?P<name>[a-z_]\w*)"),
            item: None,
            usages: vec![
                usage(r"\b${name}\s*(?:[-+*/%|&^]|<<|>>)?=[^=]"),
                usage(r"&mut\s+${name}\b"),
                usage(r"\b${name}\s*\."),
            ],
            after_declaration: true,
        };
        let text = "fn f() {\n    let mut a = 1;\n    let mut b = 2;\n    b += a;\n    println!(\"{a}\");\n}\nfn g() {\n    let mut a = 0;\n    a = 3;\n}\n";
        let found = run(&Brace(Language::Rust, &["+"], &[]), text, &structure);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "mut ");
        let name = found[0].1.captures.get("name").unwrap();
        assert_eq!(&text[name.start..name.end], "a");
        assert!(name.start < text.find("fn g").unwrap());
    }

    #[test]
    fn use_before_null_check() {
        let structure = Structure::UnguardedUse {
            declaration: regex(r"\b(?P<name>[a-z]\w*)\s*=\s*null\s*;"),
            usage: usage(r"\b${name}\s*\."),
            guards: vec![usage(r"\b${name}\s*!=\s*null"), usage(r"\b${name}\s*=[^=]")],
        };
        let text = "void f() {\n  Foo a = null;\n  a.run();\n}\nvoid g() {\n  Foo b = null;\n  if (b != null) {\n    b.run();\n  }\n}\nvoid h() {\n  Foo c = null;\n  c = make();\n  c.run();\n}\n";
        let found = run(&Brace(Language::Java, &["+"], &[]), text, &structure);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "a.");
    }

    #[test]
    fn repeated_keys_share_a_mapping() {
        let structure = Structure::RepeatedName {
            pattern: regex(r"(?m)^[ \t]*(?:-[ \t]+)?(?P<name>[\w.-]+)[ \t]*:(?:[ \t]|$)"),
        };
        let text = "a: 1\nb:\n  x: 1\n  x: 2\nc:\n  x: 3\nlist:\n- name: p\n  image: q\n- name: r\na: 4\n";
        let found = run(&Yaml, text, &structure);
        let names: Vec<_> = found.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(names, ["x", "a"]);
        assert_eq!(found[1].1.captures.get("first"), Some(Span::new(0, 1)));
    }
}
