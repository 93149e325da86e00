use serde::Deserialize;

/// Common utilities for validation gate hooks

/// Safely truncate a UTF-8 string to a maximum number of characters
pub fn truncate_utf8_safe(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}

/// Ambient configuration (ignore globs, disabled rules, project dir, thresholds)
pub mod config;

/// Typed internal faults; every one of them degrades to "not applicable"
pub mod error;

/// Fixed thresholds used by the compiled-in rule tables
pub mod validation_constants;

/// Rule table entries and their evaluation
pub mod rules;

/// Policy variants, one module per gate
pub mod gates;

/// Verdict aggregation and hook output encoding
pub mod verdict;

/// Reason / advisory text formatting and remediation tips
pub mod messages;

/// Single invocation pipeline: parse, filter, evaluate, decide
pub mod engine;

/// Optional per-gate timing capture
pub mod timings;

pub use engine::{run_gate, Evaluation};
pub use error::GateError;
pub use gates::{Gate, GateKind};
pub use rules::{Rule, Severity, Subject, Violation};
pub use verdict::Verdict;

/// Hook input envelope - only `tool_input` drives decisions
#[derive(Debug, Default, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Option<ToolInput>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub hook_event_name: Option<String>,
}

/// Fields of a Write / Edit / MultiEdit / Bash tool call the gates look at
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ToolInput {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub new_string: Option<String>,
    #[serde(default)]
    pub edits: Option<Vec<EditOp>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditOp {
    #[serde(default)]
    pub new_string: Option<String>,
}

impl HookInput {
    /// Build a synthetic payload for direct CLI use (`--file <path>`)
    pub fn for_file(path: &str) -> Self {
        Self {
            tool_input: Some(ToolInput {
                file_path: Some(path.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Tool input, or an empty one for payloads that carry none (Stop events)
    pub fn tool_input(&self) -> ToolInput {
        self.tool_input.clone().unwrap_or_default()
    }
}

/// Parse raw stdin into a hook input
pub fn parse_hook_input(raw: &str) -> Result<HookInput, GateError> {
    if raw.trim().is_empty() {
        return Err(GateError::EmptyInput);
    }
    let input: HookInput = serde_json::from_str(raw)?;
    Ok(input)
}

/// Extract the proposed content from a tool input.
/// Write carries `content`, Edit carries `new_string`, MultiEdit carries `edits[].new_string`.
pub fn extract_inline_content(tool_input: &ToolInput) -> Option<String> {
    if let Some(content) = &tool_input.content {
        return Some(content.clone());
    }
    if let Some(new_string) = &tool_input.new_string {
        return Some(new_string.clone());
    }
    tool_input.edits.as_ref().map(|edits| {
        edits
            .iter()
            .filter_map(|edit| edit.new_string.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    })
}

/// Get the target file path from a tool input, ignoring blank values
pub fn extract_file_path(tool_input: &ToolInput) -> Option<&str> {
    tool_input
        .file_path
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
}

/// Lower-cased extension of a path, without the dot
pub fn file_extension(path: &str) -> Option<String> {
    std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Final path component
pub fn file_name(path: &str) -> Option<&str> {
    let normalized = path.trim_end_matches(['/', '\\']);
    normalized.rsplit(['/', '\\']).next().filter(|n| !n.is_empty())
}
