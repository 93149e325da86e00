use once_cell::sync::Lazy;
use regex::Regex;

use super::{has_extension, ContentSource, Gate, GateKind};
use crate::rules::{evidence, line_of, Predicate, Rule, Subject, Target};
use crate::ToolInput;

const MARKUP_EXTENSIONS: &[&str] = &["tsx", "jsx", "html", "vue", "svelte"];

// Opening tags; attribute values in single-level braces may contain `>`
static ICON_BUTTON_TAG: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"<Button\b(?:[^>{]|\{[^}]*\})*>"));
static ICON_SIZE: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r#"\bsize\s*=\s*(?:"icon"|'icon'|\{\s*["']icon["']\s*\})"#));
static ARIA_LABEL: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"\baria-label(?:ledby)?\s*="));
static IMAGE_TAG: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"<(?:img|Image)\b(?:[^>{]|\{[^}]*\})*>"));
static ALT_ATTR: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"\balt\s*="));

static RULES: &[Rule] = &[
    Rule::warn(
        "UI001",
        Predicate::Matches(
            Target::Content,
            r"\b(?:bg|text|border|ring|fill|stroke|from|via|to|outline|divide|placeholder|decoration|accent|caret)-(?:(?:slate|gray|zinc|neutral|stone|red|orange|amber|yellow|lime|green|emerald|teal|cyan|sky|blue|indigo|violet|purple|fuchsia|pink|rose)-(?:50|[1-9]00|950)\b|(?:black|white)\b|\[#[0-9a-fA-F]{3,8}\])",
        ),
        "Hardcoded color utility; use semantic theme tokens such as bg-primary or text-muted-foreground",
    ),
    Rule::warn(
        "UI002",
        Predicate::Check(icon_button_without_label),
        "Icon-only button has no aria-label; screen readers cannot announce its purpose",
    ),
    Rule::warn(
        "UI003",
        Predicate::Check(image_without_alt),
        "Image has no alt attribute; add descriptive alt text (alt=\"\" for decorative images)",
    ),
];

pub struct ComponentGate;

impl Gate for ComponentGate {
    fn kind(&self) -> GateKind {
        GateKind::Component
    }

    fn applies_to(&self, input: &ToolInput) -> bool {
        has_extension(input, MARKUP_EXTENSIONS)
    }

    fn content_source(&self) -> ContentSource {
        ContentSource::Disk
    }

    fn rules(&self) -> &'static [Rule] {
        RULES
    }
}

/// First tag matched by `tag` that satisfies `offending`, reported with its line.
fn first_offending_tag(content: &str, tag: &Regex, offending: impl Fn(&str) -> bool) -> Option<String> {
    tag.find_iter(content)
        .find(|m| offending(m.as_str()))
        .map(|m| format!("line {}: `{}`", line_of(content, m.start()), evidence(m.as_str())))
}

fn icon_button_without_label(subject: &Subject) -> Option<String> {
    let content = subject.content.as_deref()?;
    let tag = ICON_BUTTON_TAG.as_ref().ok()?;
    let size = ICON_SIZE.as_ref().ok()?;
    let aria = ARIA_LABEL.as_ref().ok()?;
    first_offending_tag(content, tag, |t| size.is_match(t) && !aria.is_match(t))
}

fn image_without_alt(subject: &Subject) -> Option<String> {
    let content = subject.content.as_deref()?;
    let tag = IMAGE_TAG.as_ref().ok()?;
    let alt = ALT_ATTR.as_ref().ok()?;
    first_offending_tag(content, tag, |t| !alt.is_match(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn ids(content: &str) -> Vec<&'static str> {
        let subject = Subject {
            file_path: Some("components/Card.tsx".to_string()),
            content: Some(content.to_string()),
            ..Default::default()
        };
        ComponentGate
            .evaluate(&subject, &Config::default())
            .into_iter()
            .map(|v| v.rule_id)
            .collect()
    }

    #[test]
    fn palette_colors_warn_but_semantic_tokens_do_not() {
        assert_eq!(ids(r#"<div className="bg-blue-500 p-4" />"#), vec!["UI001"]);
        assert_eq!(ids(r#"<p className="hover:text-gray-900">x</p>"#), vec!["UI001"]);
        assert_eq!(ids(r#"<div className="bg-[#ff0000]" />"#), vec!["UI001"]);
        assert_eq!(ids(r#"<div className="text-white" />"#), vec!["UI001"]);
        assert!(ids(r#"<div className="bg-primary text-muted-foreground border-border" />"#).is_empty());
        assert!(ids(r#"<div className="bg-blue" />"#).is_empty());
    }

    #[test]
    fn color_evidence_names_the_token() {
        let subject = Subject {
            content: Some(r#"<div className="p-2 border-red-600" />"#.to_string()),
            ..Default::default()
        };
        let v = ComponentGate.evaluate(&subject, &Config::default());
        assert!(v[0].message.contains("`border-red-600`"));
    }

    #[test]
    fn icon_buttons_need_labels() {
        let bad = "<Button variant=\"ghost\" size=\"icon\" onClick={() => setOpen(true)}>\n  <X />\n</Button>";
        assert_eq!(ids(bad), vec!["UI002"]);
        let good = r#"<Button size="icon" aria-label="Close"><X /></Button>"#;
        assert!(ids(good).is_empty());
        let text_button = r#"<Button size="sm">Save</Button>"#;
        assert!(ids(text_button).is_empty());
    }

    #[test]
    fn images_need_alt_text() {
        let v = ids("<div>\n<img src=\"/logo.png\" />\n</div>");
        assert_eq!(v, vec!["UI003"]);
        assert!(ids(r#"<Image src={logo} alt="Company logo" />"#).is_empty());
        assert!(ids(r#"<img src="/spacer.gif" alt="" />"#).is_empty());
    }

    #[test]
    fn offending_tag_reports_line() {
        let subject = Subject {
            content: Some("<div>\n<img src=\"/logo.png\" />\n</div>".to_string()),
            ..Default::default()
        };
        assert_eq!(
            image_without_alt(&subject).as_deref(),
            Some("line 2: `<img src=\"/logo.png\" />`")
        );
    }
}
