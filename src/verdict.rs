//! Verdict aggregation and the hook output contract.
//!
//! Exit 0 with empty stdout allows silently, exit 0 with
//! `{"additionalContext": ...}` advises, exit 2 with
//! `{"decision":"block","reason":...}` blocks.

use serde::Serialize;

use crate::gates::GateKind;
use crate::messages::{format_advisory, format_block_reason};
use crate::rules::{Severity, Violation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Advise { context: String },
    Block { reason: String },
}

#[derive(Serialize)]
struct BlockOutput<'a> {
    decision: &'static str,
    reason: &'a str,
}

#[derive(Serialize)]
struct AdvisoryOutput<'a> {
    #[serde(rename = "additionalContext")]
    additional_context: &'a str,
}

impl Verdict {
    /// Blocks if any violation blocks, advises if there are only warnings.
    pub fn from_violations(gate: GateKind, violations: &[Violation]) -> Self {
        let strictest = violations.iter().map(|v| v.severity).max();
        match strictest {
            None => Verdict::Allow,
            Some(Severity::Warning) => Verdict::Advise {
                context: format_advisory(gate, violations),
            },
            Some(Severity::Block) => Verdict::Block {
                reason: format_block_reason(violations),
            },
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Verdict::Block { .. } => 2,
            Verdict::Allow | Verdict::Advise { .. } => 0,
        }
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self, Verdict::Block { .. })
    }

    /// JSON line for stdout; `None` for a silent allow.
    pub fn to_stdout(&self) -> Result<Option<String>, serde_json::Error> {
        match self {
            Verdict::Allow => Ok(None),
            Verdict::Advise { context } => serde_json::to_string(&AdvisoryOutput {
                additional_context: context,
            })
            .map(Some),
            Verdict::Block { reason } => serde_json::to_string(&BlockOutput {
                decision: "block",
                reason,
            })
            .map(Some),
        }
    }
}
