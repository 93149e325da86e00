//! Rule tables.
//!
//! Every gate describes its policy as a static slice of [`Rule`]s. A rule pairs
//! a predicate with a severity and a message; evaluation walks the slice in
//! order and collects one [`Violation`] per rule that fires. Rules whose input
//! field is absent, or whose pattern fails to compile, are skipped.

use regex::Regex;
use serde::Serialize;

use crate::config::{self, Config};
use crate::error::GateError;
use crate::truncate_utf8_safe;
use crate::validation_constants::MAX_EVIDENCE_CHARS;

/// Ordered by strictness: `Warning < Block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Surfaced as advisory context, never prevents the action.
    Warning,
    /// Prevents the underlying write or command.
    Block,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Block => "block",
        }
    }
}

/// Which field of the invocation a pattern is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Path,
    Command,
    Content,
}

/// Custom check. Returns `Some(detail)` when it fires; an empty detail adds nothing to the message.
pub type CheckFn = fn(&Subject) -> Option<String>;

#[derive(Debug, Clone, Copy)]
pub enum Predicate {
    /// Fires when the pattern matches the target.
    Matches(Target, &'static str),
    /// Fires when the pattern does not match the target.
    Missing(Target, &'static str),
    /// Fires when the function returns `Some`.
    Check(CheckFn),
    /// Evaluated by the owning gate itself; the table walk never fires it.
    External,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub id: &'static str,
    pub severity: Severity,
    pub predicate: Predicate,
    pub message: &'static str,
}

impl Rule {
    pub const fn block(id: &'static str, predicate: Predicate, message: &'static str) -> Self {
        Self {
            id,
            severity: Severity::Block,
            predicate,
            message,
        }
    }

    pub const fn warn(id: &'static str, predicate: Predicate, message: &'static str) -> Self {
        Self {
            id,
            severity: Severity::Warning,
            predicate,
            message,
        }
    }

    /// Evaluate this rule against a subject.
    /// `Ok(None)` covers both "did not fire" and "target field absent".
    pub fn check(&self, subject: &Subject) -> Result<Option<Violation>, GateError> {
        let detail = match self.predicate {
            Predicate::Matches(target, pattern) => {
                let Some(text) = subject.field(target) else {
                    return Ok(None);
                };
                compile(self.id, pattern)?
                    .find(text)
                    .map(|m| format!("found `{}`", evidence(m.as_str())))
            }
            Predicate::Missing(target, pattern) => {
                let Some(text) = subject.field(target) else {
                    return Ok(None);
                };
                if compile(self.id, pattern)?.is_match(text) {
                    None
                } else if target == Target::Content {
                    Some(String::new())
                } else {
                    Some(format!("got `{}`", evidence(text)))
                }
            }
            Predicate::Check(f) => f(subject),
            Predicate::External => None,
        };

        Ok(detail.map(|detail| self.violation(&detail)))
    }

    /// Build this rule's violation; an empty detail leaves the message as is.
    pub fn violation(&self, detail: &str) -> Violation {
        Violation {
            rule_id: self.id,
            severity: self.severity,
            message: if detail.is_empty() {
                self.message.to_string()
            } else {
                format!("{} ({})", self.message, detail)
            },
        }
    }
}

fn compile(rule_id: &'static str, pattern: &str) -> Result<Regex, GateError> {
    Regex::new(pattern).map_err(|source| GateError::InvalidPattern { rule_id, source })
}

/// Clip matched text for inclusion in a message, on one line.
pub fn evidence(text: &str) -> String {
    let one_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_utf8_safe(&one_line, MAX_EVIDENCE_CHARS)
}

/// 1-based line number of a byte offset.
pub fn line_of(content: &str, offset: usize) -> usize {
    let end = offset.min(content.len());
    content.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}

/// The extracted fields a gate evaluates. Absent fields make dependent rules inapplicable.
#[derive(Debug, Default, Clone)]
pub struct Subject {
    pub file_path: Option<String>,
    pub content: Option<String>,
    pub command: Option<String>,
    /// Working directory reported by the host, for gates that locate files themselves
    pub cwd: Option<String>,
}

impl Subject {
    pub fn field(&self, target: Target) -> Option<&str> {
        match target {
            Target::Path => self.file_path.as_deref(),
            Target::Command => self.command.as_deref(),
            Target::Content => self.content.as_deref(),
        }
    }

    /// Path with separators normalized to `/`
    pub fn normalized_path(&self) -> Option<String> {
        self.file_path.as_ref().map(|p| p.replace('\\', "/"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub rule_id: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Run a rule table in order, skipping disabled and unevaluable rules.
pub fn evaluate_rules(rules: &[Rule], subject: &Subject, cfg: &Config) -> Vec<Violation> {
    let mut violations = Vec::new();
    for rule in rules {
        if config::is_rule_disabled(cfg, rule.id) {
            tracing::debug!(rule = rule.id, "Rule disabled by configuration");
            continue;
        }
        match rule.check(subject) {
            Ok(Some(v)) => {
                tracing::debug!(rule = rule.id, severity = v.severity.as_str(), "Rule fired");
                violations.push(v);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Skipping unevaluable rule"),
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject_with_path(p: &str) -> Subject {
        Subject {
            file_path: Some(p.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn missing_predicate_reports_the_actual_value() {
        let rule = Rule::block("T001", Predicate::Missing(Target::Path, r"^ok/"), "must live under ok/");
        let v = rule.check(&subject_with_path("bad/x")).unwrap().unwrap();
        assert_eq!(v.message, "must live under ok/ (got `bad/x`)");
        assert!(rule.check(&subject_with_path("ok/x")).unwrap().is_none());
    }

    #[test]
    fn absent_field_is_not_a_violation() {
        let rule = Rule::block("T002", Predicate::Matches(Target::Command, "rm"), "no rm");
        assert!(rule.check(&Subject::default()).unwrap().is_none());
    }

    #[test]
    fn invalid_pattern_is_skipped_during_evaluation() {
        let rules = [
            Rule::block("T003", Predicate::Matches(Target::Path, "("), "broken"),
            Rule::warn("T004", Predicate::Matches(Target::Path, "x"), "has x"),
        ];
        let out = evaluate_rules(&rules, &subject_with_path("x"), &Config::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rule_id, "T004");
        assert!(matches!(
            rules[0].check(&subject_with_path("x")),
            Err(GateError::InvalidPattern { rule_id: "T003", .. })
        ));
    }

    #[test]
    fn disabled_rules_do_not_fire() {
        let rules = [Rule::warn("T005", Predicate::Matches(Target::Path, "x"), "has x")];
        let cfg = Config {
            disabled_rules: vec!["T005".into()],
            ..Default::default()
        };
        assert!(evaluate_rules(&rules, &subject_with_path("x"), &cfg).is_empty());
    }

    #[test]
    fn line_numbers_are_one_based() {
        let text = "a\nb\nc";
        assert_eq!(line_of(text, 0), 1);
        assert_eq!(line_of(text, 2), 2);
        assert_eq!(line_of(text, 100), 3);
    }

    #[test]
    fn severity_orders_block_above_warning() {
        assert!(Severity::Block > Severity::Warning);
    }
}
