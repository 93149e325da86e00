use once_cell::sync::Lazy;
use regex::Regex;

use super::{ContentSource, Gate, GateKind};
use crate::rules::{Predicate, Rule, Subject, Target};
use crate::ToolInput;

/// Markdown file names that are treated as generated artifacts
const ARTIFACT_NAMES: &[&str] = &["report", "analysis", "review", "audit", "finding", "plan"];
/// Artifact types that must open with a header element
const HEADER_REQUIRED: &[&str] = &["report", "analysis", "review", "audit"];

static HEADER_ELEMENT: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"<(?:header|metadata)\b"));
static SCORED_BLOCK: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(r"(?s)<(finding|recommendation)\b([^>]*?)(?:/>|>(.*?)</(?:finding|recommendation)\s*>)")
});
static FINDING_PROSE: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"(?i)\b(findings?|recommendations?)\b"));
static CONFIDENCE: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"(?i)\bconfidence\b"));
static EVIDENCE: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"(?i)\bevidence\b"));

static RULES: &[Rule] = &[
    Rule::warn(
        "XML001",
        Predicate::Missing(
            Target::Content,
            r#"<(?:artifact_)?id>|<identifier>|\bid\s*=\s*["'][^"']+["']"#,
        ),
        "Artifact has no identifier element; add <id> (or an id=\"...\" attribute on the root element)",
    ),
    Rule::warn(
        "XML002",
        Predicate::Check(missing_header),
        "Artifact has no <header> element; report, analysis, review and audit outputs must open with one",
    ),
    Rule::warn(
        "XML003",
        Predicate::Check(unscored_findings),
        "Findings and recommendations need confidence and evidence scoring",
    ),
];

pub struct XmlOutputGate;

impl Gate for XmlOutputGate {
    fn kind(&self) -> GateKind {
        GateKind::XmlOutput
    }

    fn applies_to(&self, input: &ToolInput) -> bool {
        let Some(path) = crate::extract_file_path(input) else {
            return false;
        };
        match crate::file_extension(path).as_deref() {
            Some("xml") => true,
            Some("md") => artifact_kind(path, ARTIFACT_NAMES).is_some(),
            _ => false,
        }
    }

    fn content_source(&self) -> ContentSource {
        ContentSource::Disk
    }

    fn rules(&self) -> &'static [Rule] {
        RULES
    }
}

/// First artifact word contained in the lower-cased file name
fn artifact_kind(path: &str, kinds: &[&'static str]) -> Option<&'static str> {
    let name = crate::file_name(path)?.to_ascii_lowercase();
    kinds.iter().copied().find(|kind| name.contains(kind))
}

fn missing_header(subject: &Subject) -> Option<String> {
    let content = subject.content.as_deref()?;
    let kind = artifact_kind(subject.file_path.as_deref()?, HEADER_REQUIRED)?;
    let header = HEADER_ELEMENT.as_ref().ok()?;
    if header.is_match(content) {
        None
    } else {
        Some(format!("required for {} artifacts", kind))
    }
}

fn lacking(text: &str) -> Option<&'static str> {
    let has_confidence = CONFIDENCE.as_ref().map(|re| re.is_match(text)).unwrap_or(true);
    let has_evidence = EVIDENCE.as_ref().map(|re| re.is_match(text)).unwrap_or(true);
    match (has_confidence, has_evidence) {
        (true, true) => None,
        (false, true) => Some("confidence"),
        (true, false) => Some("evidence"),
        (false, false) => Some("confidence and evidence"),
    }
}

fn unscored_findings(subject: &Subject) -> Option<String> {
    let content = subject.content.as_deref()?;
    let blocks = SCORED_BLOCK.as_ref().ok()?;

    let mut seen_block = false;
    for (index, caps) in blocks.captures_iter(content).enumerate() {
        seen_block = true;
        let element = caps.get(1).map(|m| m.as_str()).unwrap_or("finding");
        let attrs = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let body = caps.get(3).map(|m| m.as_str()).unwrap_or("");
        if let Some(missing) = lacking(&format!("{attrs} {body}")) {
            return Some(format!("<{}> #{} lacks {}", element, index + 1, missing));
        }
    }
    if seen_block {
        return None;
    }

    // No structured blocks: fall back to the document as a whole
    let prose = FINDING_PROSE.as_ref().ok()?;
    let mention = prose.find(content)?;
    lacking(content).map(|missing| format!("`{}` mentioned without {}", mention.as_str(), missing))
}
