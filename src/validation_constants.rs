/// Centralized thresholds for the compiled-in rule tables.
/// These are part of the fixed policy and are not read from configuration.

// Documentation lint
pub const MAX_CODE_BLOCK_LINES: usize = 40;
pub const LONG_DOCUMENT_LINES: usize = 100;

// Coverage gate defaults (overridable through config)
pub const DEFAULT_BACKEND_COVERAGE_THRESHOLD: f64 = 80.0;
pub const DEFAULT_FRONTEND_COVERAGE_THRESHOLD: f64 = 70.0;
pub const MAX_UNCOVERED_FILES_LISTED: usize = 5;

// Output budgets
pub const MAX_REASON_CHARS: usize = 4000;
pub const MAX_CONTEXT_CHARS: usize = 4000;
pub const MAX_EVIDENCE_CHARS: usize = 80;

// Path validation constants
pub const MAX_PATH_LENGTH: usize = 4096;

// Targets larger than this are not read for content checks
pub const MAX_TARGET_BYTES: u64 = 2 * 1024 * 1024;
