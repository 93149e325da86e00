//! Markdown documentation lint.
//!
//! Everything here is advisory. The document is split into prose and fenced
//! code first so that code samples never trigger prose checks.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{has_extension, ContentSource, Gate, GateKind};
use crate::rules::{Predicate, Rule, Subject};
use crate::validation_constants::{LONG_DOCUMENT_LINES, MAX_CODE_BLOCK_LINES};
use crate::ToolInput;

const DOC_EXTENSIONS: &[&str] = &["md", "mdx"];

static CONDESCENDING: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(r"(?i)\b(obviously|clearly|simply|of course|everyone knows|trivially|as you know)\b")
});
static INLINE_CODE: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"`[^`]*`"));
static ATX_HEADER: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"^\s{0,3}#{1,6}\s+\S"));
static SETEXT_UNDERLINE: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"^\s{0,3}(?:=+|-+)\s*$"));

static RULES: &[Rule] = &[
    Rule::warn(
        "DOC001",
        Predicate::Check(condescending_wording),
        "Wording like \"obviously\" or \"simply\" assumes reader knowledge; explain the step instead of presuming it is known",
    ),
    Rule::warn(
        "DOC002",
        Predicate::Check(unintroduced_long_code_block),
        "Long code block has no introducing prose; say what the listing shows before it starts",
    ),
    Rule::warn(
        "DOC003",
        Predicate::Check(long_document_without_headers),
        "Long document has no section headers; add ## headings so readers can navigate it",
    ),
];

pub struct DocLintGate;

impl Gate for DocLintGate {
    fn kind(&self) -> GateKind {
        GateKind::DocLint
    }

    fn applies_to(&self, input: &ToolInput) -> bool {
        has_extension(input, DOC_EXTENSIONS)
    }

    fn content_source(&self) -> ContentSource {
        ContentSource::Disk
    }

    fn rules(&self) -> &'static [Rule] {
        RULES
    }
}

#[derive(Debug, PartialEq, Eq)]
struct CodeBlock {
    /// 1-based line of the opening fence
    start_line: usize,
    /// Lines between the fences
    body_lines: usize,
    introduced: bool,
}

#[derive(Debug, Default)]
struct DocShape<'a> {
    /// (1-based line, text) for every line outside front matter and code fences
    prose: Vec<(usize, &'a str)>,
    code_blocks: Vec<CodeBlock>,
    total_lines: usize,
    /// ATX (`## Title`) or setext (`Title` over `=====`) heading outside code
    has_heading: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Prev {
    Nothing,
    Heading,
    Fence,
    Prose,
}

fn is_heading(line: &str) -> bool {
    ATX_HEADER.as_ref().map(|re| re.is_match(line)).unwrap_or(false)
}

fn is_setext_underline(line: &str) -> bool {
    SETEXT_UNDERLINE.as_ref().map(|re| re.is_match(line)).unwrap_or(false)
}

fn fence_marker(line: &str) -> Option<(char, usize)> {
    let t = line.trim_start();
    let ch = t.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = t.chars().take_while(|c| *c == ch).count();
    (len >= 3).then_some((ch, len))
}

fn scan(content: &str) -> DocShape<'_> {
    let lines: Vec<&str> = content.lines().collect();
    let mut shape = DocShape {
        total_lines: lines.len(),
        ..Default::default()
    };

    let mut i = 0;
    // YAML front matter
    if lines.first().map(|l| l.trim_end() == "---").unwrap_or(false) {
        if let Some(end) = lines.iter().skip(1).position(|l| l.trim_end() == "---") {
            i = end + 2;
        }
    }

    let mut prev = Prev::Nothing;
    while i < lines.len() {
        let line = lines[i];
        if let Some((ch, len)) = fence_marker(line) {
            let start = i;
            i += 1;
            while i < lines.len() {
                let closes = fence_marker(lines[i])
                    .map(|(c, l)| c == ch && l >= len && lines[i].trim().chars().all(|x| x == ch))
                    .unwrap_or(false);
                if closes {
                    break;
                }
                i += 1;
            }
            let body_end = i.min(lines.len());
            shape.code_blocks.push(CodeBlock {
                start_line: start + 1,
                body_lines: body_end - start - 1,
                introduced: prev == Prev::Prose,
            });
            prev = Prev::Fence;
            i += 1;
            continue;
        }

        if !line.trim().is_empty() {
            // the underline turns the prose line directly above it into a heading
            let underlined = prev == Prev::Prose
                && i > 0
                && !lines[i - 1].trim().is_empty()
                && is_setext_underline(line);
            prev = if underlined || is_heading(line) {
                shape.has_heading = true;
                Prev::Heading
            } else {
                Prev::Prose
            };
        }
        shape.prose.push((i + 1, line));
        i += 1;
    }
    shape
}

fn condescending_wording(subject: &Subject) -> Option<String> {
    let content = subject.content.as_deref()?;
    let words = CONDESCENDING.as_ref().ok()?;
    let inline = INLINE_CODE.as_ref().ok()?;
    scan(content).prose.iter().find_map(|(line_no, line)| {
        let text = inline.replace_all(line, "");
        words
            .find(&text)
            .map(|m| format!("line {}: `{}`", line_no, m.as_str()))
    })
}

fn unintroduced_long_code_block(subject: &Subject) -> Option<String> {
    let content = subject.content.as_deref()?;
    scan(content)
        .code_blocks
        .iter()
        .find(|b| b.body_lines > MAX_CODE_BLOCK_LINES && !b.introduced)
        .map(|b| {
            format!(
                "line {}: {} lines, limit {}",
                b.start_line, b.body_lines, MAX_CODE_BLOCK_LINES
            )
        })
}

fn long_document_without_headers(subject: &Subject) -> Option<String> {
    let content = subject.content.as_deref()?;
    let shape = scan(content);
    if shape.total_lines <= LONG_DOCUMENT_LINES {
        return None;
    }
    if shape.has_heading {
        return None;
    }
    Some(format!("{} lines, limit {}", shape.total_lines, LONG_DOCUMENT_LINES))
}
