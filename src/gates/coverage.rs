//! Coverage threshold gate.
//!
//! Reads a coverage report that a test run already produced and blocks when
//! total coverage is below the configured threshold. The report is either the
//! file named in the payload or, for payloads without a file (Stop events), the
//! first report found at a well-known location in the project directory.
//! coverage.py and LCOV reports use the backend threshold, Jest/Vitest
//! summaries the frontend one.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{Gate, GateKind};
use crate::config::{self, Config};
use crate::error::GateError;
use crate::rules::{Predicate, Rule, Subject, Violation};
use crate::validation_constants::{MAX_TARGET_BYTES, MAX_UNCOVERED_FILES_LISTED};
use crate::ToolInput;

const SEARCH_PATHS: &[&str] = &[
    "coverage/coverage.json",
    "coverage/coverage-summary.json",
    "coverage.json",
    "coverage-summary.json",
    "coverage/lcov.info",
    "lcov.info",
];

static RULES: &[Rule] = &[Rule::block(
    "COV001",
    Predicate::External,
    "Test coverage is below the required threshold; add tests before finishing",
)];

pub struct CoverageGate;

impl Gate for CoverageGate {
    fn kind(&self) -> GateKind {
        GateKind::Coverage
    }

    fn applies_to(&self, input: &ToolInput) -> bool {
        match crate::extract_file_path(input) {
            Some(path) => ReportFormat::detect(Path::new(path)).is_some(),
            // Stop-style payloads carry no tool call; the report is discovered instead
            None => input.command.is_none() && input.content.is_none(),
        }
    }

    fn rules(&self) -> &'static [Rule] {
        RULES
    }

    fn evaluate(&self, subject: &Subject, cfg: &Config) -> Vec<Violation> {
        let rule = &RULES[0];
        if config::is_rule_disabled(cfg, rule.id) {
            return Vec::new();
        }
        let Some(path) = locate_report(subject, cfg) else {
            tracing::debug!("No coverage report found");
            return Vec::new();
        };
        let report = match load_report(&path, cfg) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping coverage check");
                return Vec::new();
            }
        };
        if report.total_percent >= report.threshold {
            return Vec::new();
        }
        vec![rule.violation(&report.describe(&path))]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    CoveragePy,
    Jest,
    Lcov,
}

impl ReportFormat {
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        match name {
            "coverage.json" => Some(ReportFormat::CoveragePy),
            "coverage-summary.json" => Some(ReportFormat::Jest),
            _ if name.ends_with(".info") => Some(ReportFormat::Lcov),
            _ => None,
        }
    }

    fn threshold(self, cfg: &Config) -> f64 {
        match self {
            ReportFormat::Jest => cfg.frontend_coverage_threshold,
            ReportFormat::CoveragePy | ReportFormat::Lcov => cfg.backend_coverage_threshold,
        }
    }
}

/// Per-metric totals. `functions` is absent for coverage.py reports.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Breakdown {
    pub statements: f64,
    pub branches: f64,
    pub functions: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoverageReport {
    pub format: ReportFormat,
    pub total_percent: f64,
    pub threshold: f64,
    pub breakdown: Breakdown,
    /// Files under the threshold, lowest first
    pub uncovered_files: Vec<(String, f64)>,
}

impl CoverageReport {
    pub fn gap(&self) -> f64 {
        (self.threshold - self.total_percent).max(0.0)
    }

    fn describe(&self, path: &Path) -> String {
        let mut out = format!(
            "total {:.1}% < {:.0}% in {}; gap {:.1}%; statements {:.1}%, branches {:.1}%",
            self.total_percent,
            self.threshold,
            path.display(),
            self.gap(),
            self.breakdown.statements,
            self.breakdown.branches,
        );
        if let Some(functions) = self.breakdown.functions {
            out.push_str(&format!(", functions {:.1}%", functions));
        }
        if !self.uncovered_files.is_empty() {
            let listed: Vec<String> = self
                .uncovered_files
                .iter()
                .take(MAX_UNCOVERED_FILES_LISTED)
                .map(|(file, pct)| format!("{} {:.1}%", file, pct))
                .collect();
            out.push_str("; lowest: ");
            out.push_str(&listed.join(", "));
        }
        out
    }
}

/// Payload path first, then the configured report path, then the well-known locations.
fn locate_report(subject: &Subject, cfg: &Config) -> Option<PathBuf> {
    let cwd = subject.cwd.as_deref();
    if let Some(path) = subject.file_path.as_deref() {
        let resolved = config::resolve_target(cfg, path, cwd);
        return resolved.is_file().then_some(resolved);
    }
    if let Some(path) = cfg.coverage_report_path.as_deref() {
        let resolved = config::resolve_target(cfg, &path.to_string_lossy(), cwd);
        if resolved.is_file() {
            return Some(resolved);
        }
        tracing::debug!(path = %resolved.display(), "Configured coverage report not found");
        return None;
    }
    let base = cfg
        .project_dir
        .clone()
        .or_else(|| cwd.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    SEARCH_PATHS
        .iter()
        .map(|rel| base.join(rel))
        .find(|candidate| candidate.is_file())
}

pub fn load_report(path: &Path, cfg: &Config) -> Result<CoverageReport, GateError> {
    let format = ReportFormat::detect(path).ok_or_else(|| GateError::CoverageReport {
        path: path.to_path_buf(),
        reason: "unknown report format".to_string(),
    })?;
    let size = std::fs::metadata(path)
        .map_err(|source| GateError::ReadTarget {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    if size > MAX_TARGET_BYTES * 8 {
        return Err(GateError::CoverageReport {
            path: path.to_path_buf(),
            reason: format!("report too large ({size} bytes)"),
        });
    }
    let text = std::fs::read_to_string(path).map_err(|source| GateError::ReadTarget {
        path: path.to_path_buf(),
        source,
    })?;
    let threshold = format.threshold(cfg);
    let bad = |reason: String| GateError::CoverageReport {
        path: path.to_path_buf(),
        reason,
    };
    let parsed = match format {
        ReportFormat::CoveragePy => parse_coverage_py(&text).map_err(|e| bad(e.to_string()))?,
        ReportFormat::Jest => parse_jest_summary(&text).map_err(|e| bad(e.to_string()))?,
        ReportFormat::Lcov => parse_lcov(&text).ok_or_else(|| bad("no LF/LH records".to_string()))?,
    };

    let mut uncovered_files: Vec<(String, f64)> = parsed
        .files
        .into_iter()
        .filter(|(_, pct)| *pct < threshold)
        .collect();
    uncovered_files.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    Ok(CoverageReport {
        format,
        total_percent: parsed.total,
        threshold,
        breakdown: parsed.breakdown,
        uncovered_files,
    })
}

struct Parsed {
    total: f64,
    breakdown: Breakdown,
    files: Vec<(String, f64)>,
}

#[derive(Deserialize)]
struct CoveragePyReport {
    // An absent totals object scores zero
    #[serde(default)]
    totals: CoveragePySummary,
    #[serde(default)]
    files: BTreeMap<String, CoveragePyFile>,
}

#[derive(Deserialize)]
struct CoveragePyFile {
    #[serde(default)]
    summary: CoveragePySummary,
}

#[derive(Deserialize, Default)]
struct CoveragePySummary {
    #[serde(default)]
    percent_covered: f64,
    #[serde(default)]
    percent_covered_branches: f64,
}

fn parse_coverage_py(text: &str) -> Result<Parsed, serde_json::Error> {
    let report: CoveragePyReport = serde_json::from_str(text)?;
    let files = report
        .files
        .into_iter()
        .map(|(path, file)| (path, file.summary.percent_covered))
        .collect();
    Ok(Parsed {
        total: report.totals.percent_covered,
        breakdown: Breakdown {
            statements: report.totals.percent_covered,
            branches: report.totals.percent_covered_branches,
            functions: None,
        },
        files,
    })
}

#[derive(Deserialize)]
struct JestEntry {
    #[serde(default)]
    lines: JestMetric,
    #[serde(default)]
    statements: JestMetric,
    #[serde(default)]
    functions: JestMetric,
    #[serde(default)]
    branches: JestMetric,
}

#[derive(Deserialize, Default)]
struct JestMetric {
    #[serde(default)]
    pct: Option<serde_json::Value>,
}

impl JestMetric {
    /// Absent metrics score 0. Istanbul writes the string "Unknown" when there
    /// is nothing to cover, which scores 100.
    fn pct(&self) -> f64 {
        match &self.pct {
            Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(serde_json::Value::String(s)) if s.eq_ignore_ascii_case("unknown") => 100.0,
            _ => 0.0,
        }
    }
}

fn parse_jest_summary(text: &str) -> Result<Parsed, serde_json::Error> {
    let mut entries: BTreeMap<String, JestEntry> = serde_json::from_str(text)?;
    let total = entries
        .remove("total")
        .ok_or_else(|| <serde_json::Error as serde::de::Error>::missing_field("total"))?;
    let breakdown = Breakdown {
        statements: total.statements.pct(),
        branches: total.branches.pct(),
        functions: Some(total.functions.pct()),
    };
    let files = entries
        .into_iter()
        .map(|(path, entry)| (path, entry.lines.pct()))
        .collect();
    Ok(Parsed {
        total: (breakdown.statements + breakdown.branches + total.functions.pct() + total.lines.pct()) / 4.0,
        breakdown,
        files,
    })
}

/// Found/hit counters for one LCOV metric.
#[derive(Default, Clone, Copy)]
struct Counter {
    found: u64,
    hit: u64,
}

impl Counter {
    fn add(&mut self, other: Counter) {
        self.found += other.found;
        self.hit += other.hit;
    }

    fn percent(self) -> f64 {
        if self.found == 0 {
            100.0
        } else {
            self.hit as f64 * 100.0 / self.found as f64
        }
    }
}

fn parse_count(n: &str) -> u64 {
    n.trim().parse().unwrap_or(0)
}

fn parse_lcov(text: &str) -> Option<Parsed> {
    let mut files = Vec::new();
    let (mut lines_total, mut branches_total, mut functions_total) =
        (Counter::default(), Counter::default(), Counter::default());
    let (mut lines, mut branches, mut functions) =
        (Counter::default(), Counter::default(), Counter::default());
    let mut current = String::new();
    let mut saw_counts = false;

    for line in text.lines().map(str::trim) {
        if let Some(sf) = line.strip_prefix("SF:") {
            current = sf.to_string();
            lines = Counter::default();
            branches = Counter::default();
            functions = Counter::default();
        } else if let Some(n) = line.strip_prefix("LF:") {
            lines.found = parse_count(n);
            saw_counts = true;
        } else if let Some(n) = line.strip_prefix("LH:") {
            lines.hit = parse_count(n);
            saw_counts = true;
        } else if let Some(n) = line.strip_prefix("BRF:") {
            branches.found = parse_count(n);
        } else if let Some(n) = line.strip_prefix("BRH:") {
            branches.hit = parse_count(n);
        } else if let Some(n) = line.strip_prefix("FNF:") {
            functions.found = parse_count(n);
        } else if let Some(n) = line.strip_prefix("FNH:") {
            functions.hit = parse_count(n);
        } else if line == "end_of_record" {
            lines_total.add(lines);
            branches_total.add(branches);
            functions_total.add(functions);
            files.push((std::mem::take(&mut current), lines.percent()));
            lines = Counter::default();
            branches = Counter::default();
            functions = Counter::default();
        }
    }
    if !saw_counts {
        return None;
    }
    Some(Parsed {
        total: lines_total.percent(),
        breakdown: Breakdown {
            statements: lines_total.percent(),
            branches: branches_total.percent(),
            functions: (functions_total.found > 0).then(|| functions_total.percent()),
        },
        files,
    })
}
