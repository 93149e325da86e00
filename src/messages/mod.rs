use crate::gates::GateKind;
use crate::rules::{Severity, Violation};
use crate::truncate_utf8_safe;
use crate::validation_constants::{MAX_CONTEXT_CHARS, MAX_REASON_CHARS};

/// Short remediation hint for a rule, if one exists.
pub fn tip_for_rule(rule_id: &str) -> Option<&'static str> {
    let tip = match rule_id {
        "SKL001" => "Move the file, e.g. plugins/my-plugin/skills/my-skill/SKILL.md.",
        "FB001" | "FB005" | "FB006" => "Run destructive Firebase operations from the console, not the agent.",
        "FB002" | "FB003" | "FB004" => "Delete specific documents or paths instead of whole collections.",
        "FBW01" => "Drop --force or confirm the target project with `firebase use` first.",
        "NX001" => "Create routes under app/<route>/page.tsx.",
        "NX002" => "Fetch data in a server component or a route handler.",
        "NX003" => "Import useRouter from next/navigation.",
        "NXW01" => "Move client-only code into a child component marked 'use client'.",
        "UI001" => "Map the color onto a theme token in tailwind.config.",
        _ => return None,
    };
    Some(tip)
}

fn with_tip(v: &Violation) -> String {
    match tip_for_rule(v.rule_id) {
        Some(tip) => format!("{} Hint: {}", v.message, tip),
        None => v.message.clone(),
    }
}

/// Reason text for a blocking verdict: blocking messages in table order, then
/// every warning prefixed with `warning: `.
pub fn format_block_reason(violations: &[Violation]) -> String {
    let blocking = violations.iter().filter(|v| v.severity == Severity::Block);
    let warnings = violations.iter().filter(|v| v.severity == Severity::Warning);

    let mut lines: Vec<String> = blocking.map(with_tip).collect();
    lines.extend(warnings.map(|v| format!("warning: {}", v.message)));
    truncate_utf8_safe(&lines.join("\n"), MAX_REASON_CHARS)
}

/// Advisory context for a warnings-only verdict.
pub fn format_advisory(gate: GateKind, violations: &[Violation]) -> String {
    let count = violations.len();
    let mut out = format!(
        "{}: {} warning{}\n",
        gate,
        count,
        if count == 1 { "" } else { "s" }
    );
    for v in violations {
        out.push_str("- ");
        out.push_str(&with_tip(v));
        out.push('\n');
    }
    truncate_utf8_safe(out.trim_end(), MAX_CONTEXT_CHARS)
}
