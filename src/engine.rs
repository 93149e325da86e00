//! One gate invocation: parse the payload, decide applicability, gather the
//! subject fields, evaluate the gate and turn violations into a verdict.
//!
//! Every internal fault on the way (unparsable input, unreadable target)
//! ends in [`Verdict::Allow`].

use std::time::Instant;

use crate::config::{self, Config};
use crate::error::GateError;
use crate::gates::{ContentSource, GateKind};
use crate::rules::{Subject, Violation};
use crate::validation_constants::{MAX_PATH_LENGTH, MAX_TARGET_BYTES};
use crate::verdict::Verdict;
use crate::{extract_file_path, extract_inline_content, parse_hook_input, timings, HookInput};

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub violations: Vec<Violation>,
}

impl Evaluation {
    fn allow() -> Self {
        Self {
            verdict: Verdict::Allow,
            violations: Vec::new(),
        }
    }
}

/// Evaluate raw stdin for `kind`.
pub fn run_gate(kind: GateKind, raw: &str, cfg: &Config) -> Evaluation {
    match parse_hook_input(raw) {
        Ok(input) => run_gate_input(kind, &input, cfg),
        Err(e) => {
            tracing::debug!(gate = %kind, error = %e, "Treating unusable input as not applicable");
            Evaluation::allow()
        }
    }
}

/// Evaluate an already parsed payload for `kind`.
pub fn run_gate_input(kind: GateKind, input: &HookInput, cfg: &Config) -> Evaluation {
    let started = Instant::now();
    let gate = kind.gate();
    let tool_input = input.tool_input();
    let file_path = extract_file_path(&tool_input).map(str::to_string);
    tracing::debug!(
        gate = %kind,
        tool = input.tool_name.as_deref().unwrap_or("-"),
        event = input.hook_event_name.as_deref().unwrap_or("-"),
        session = input.session_id.as_deref().unwrap_or("-"),
        "Hook invocation"
    );

    if let Some(path) = file_path.as_deref() {
        if path.len() > MAX_PATH_LENGTH {
            tracing::warn!(gate = %kind, len = path.len(), max = MAX_PATH_LENGTH, "Path exceeds maximum length, not evaluated");
            return Evaluation::allow();
        }
        if config::should_ignore_path(cfg, path) {
            tracing::debug!(gate = %kind, path, "Path ignored by configuration");
            return Evaluation::allow();
        }
    }

    if !gate.applies_to(&tool_input) {
        tracing::debug!(gate = %kind, "Invocation outside gate domain");
        return Evaluation::allow();
    }

    let content = match gate.content_source() {
        ContentSource::None => None,
        ContentSource::Inline => extract_inline_content(&tool_input),
        ContentSource::Disk => {
            let Some(path) = file_path.as_deref() else {
                return Evaluation::allow();
            };
            match read_target(cfg, path, input.cwd.as_deref()) {
                Ok(text) => Some(text),
                Err(e @ GateError::MissingTarget(_)) => {
                    tracing::debug!(gate = %kind, error = %e, "Skipping content checks");
                    return Evaluation::allow();
                }
                Err(e) => {
                    tracing::warn!(gate = %kind, error = %e, "Skipping content checks");
                    return Evaluation::allow();
                }
            }
        }
    };

    let subject = Subject {
        file_path,
        content,
        command: tool_input.command.clone(),
        cwd: input.cwd.clone(),
    };

    let violations = gate.evaluate(&subject, cfg);
    timings::record(kind.as_str(), started.elapsed());
    tracing::debug!(gate = %kind, violations = violations.len(), "Gate evaluated");

    Evaluation {
        verdict: Verdict::from_violations(kind, &violations),
        violations,
    }
}

/// Read the written file back from disk. Missing files are skipped rather than blocked.
pub fn read_target(cfg: &Config, path: &str, cwd: Option<&str>) -> Result<String, GateError> {
    let resolved = config::resolve_target(cfg, path, cwd);
    let meta = match std::fs::metadata(&resolved) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(GateError::MissingTarget(resolved));
        }
        Err(source) => return Err(GateError::ReadTarget { path: resolved, source }),
    };
    if !meta.is_file() {
        return Err(GateError::MissingTarget(resolved));
    }
    if meta.len() > MAX_TARGET_BYTES {
        return Err(GateError::ReadTarget {
            path: resolved,
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, "file too large"),
        });
    }
    std::fs::read_to_string(&resolved).map_err(|source| GateError::ReadTarget { path: resolved, source })
}
