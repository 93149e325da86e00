//! Policy variants.
//!
//! Each gate decides whether an invocation is in its domain, says where its
//! content comes from, and exposes an ordered rule table. The coverage gate is
//! the one variant whose evaluation is not a plain table walk.

/// Skill definition files must live at plugins/<plugin>/skills/<skill>/SKILL.md
pub mod skill_placement;
/// Destructive Firebase CLI deny-list
pub mod firebase_command;
/// Next.js App Router structure (legacy pages dir, deprecated data APIs)
pub mod structure;
/// Tailwind / shadcn markup heuristics
pub mod component;
/// Markdown documentation lint
pub mod doc_lint;
/// Artifact contract checks for XML / report outputs
pub mod xml_output;
/// Test coverage thresholds from coverage reports
pub mod coverage;

use clap::ValueEnum;
use serde::Serialize;

use crate::config::Config;
use crate::rules::{evaluate_rules, Rule, Severity, Subject, Violation};
use crate::ToolInput;

/// Where a gate takes file content from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    /// Path / command only.
    None,
    /// Proposed content from the payload (pre-write).
    Inline,
    /// The file as already written on disk (post-write).
    Disk,
}

pub trait Gate: Send + Sync {
    fn kind(&self) -> GateKind;

    /// Whether this invocation belongs to the gate's domain at all.
    fn applies_to(&self, input: &ToolInput) -> bool;

    fn content_source(&self) -> ContentSource {
        ContentSource::None
    }

    fn rules(&self) -> &'static [Rule];

    fn evaluate(&self, subject: &Subject, cfg: &Config) -> Vec<Violation> {
        evaluate_rules(self.rules(), subject, cfg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateKind {
    SkillPlacement,
    FirebaseCommand,
    Structure,
    Component,
    DocLint,
    XmlOutput,
    Coverage,
}

impl GateKind {
    pub const ALL: [GateKind; 7] = [
        GateKind::SkillPlacement,
        GateKind::FirebaseCommand,
        GateKind::Structure,
        GateKind::Component,
        GateKind::DocLint,
        GateKind::XmlOutput,
        GateKind::Coverage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GateKind::SkillPlacement => "skill-placement",
            GateKind::FirebaseCommand => "firebase-command",
            GateKind::Structure => "structure",
            GateKind::Component => "component",
            GateKind::DocLint => "doc-lint",
            GateKind::XmlOutput => "xml-output",
            GateKind::Coverage => "coverage",
        }
    }

    pub fn gate(self) -> &'static dyn Gate {
        match self {
            GateKind::SkillPlacement => &skill_placement::SkillPlacementGate,
            GateKind::FirebaseCommand => &firebase_command::FirebaseCommandGate,
            GateKind::Structure => &structure::StructureGate,
            GateKind::Component => &component::ComponentGate,
            GateKind::DocLint => &doc_lint::DocLintGate,
            GateKind::XmlOutput => &xml_output::XmlOutputGate,
            GateKind::Coverage => &coverage::CoverageGate,
        }
    }
}

impl std::fmt::Display for GateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule table row for `validation-gate rules`
#[derive(Debug, Clone, Serialize)]
pub struct RuleInfo {
    pub id: &'static str,
    pub gate: GateKind,
    pub severity: Severity,
    pub message: &'static str,
}

pub fn describe_rules(kinds: &[GateKind]) -> Vec<RuleInfo> {
    kinds
        .iter()
        .flat_map(|kind| {
            kind.gate().rules().iter().map(move |r| RuleInfo {
                id: r.id,
                gate: *kind,
                severity: r.severity,
                message: r.message,
            })
        })
        .collect()
}

/// True when the path ends with one of the given extensions (lower-case, no dot).
pub(crate) fn has_extension(input: &ToolInput, extensions: &[&str]) -> bool {
    crate::extract_file_path(input)
        .and_then(crate::file_extension)
        .map(|ext| extensions.contains(&ext.as_str()))
        .unwrap_or(false)
}
