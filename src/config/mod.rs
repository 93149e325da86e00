use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};

use crate::validation_constants::{
    DEFAULT_BACKEND_COVERAGE_THRESHOLD, DEFAULT_FRONTEND_COVERAGE_THRESHOLD,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub ignore_globs: Option<GlobSet>,
    pub disabled_rules: Vec<String>,
    pub project_dir: Option<PathBuf>,
    pub backend_coverage_threshold: f64,
    pub frontend_coverage_threshold: f64,
    /// Explicit coverage report; disables the well-known location search
    pub coverage_report_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // None means: do not ignore anything
            ignore_globs: None,
            disabled_rules: Vec::new(),
            project_dir: None,
            backend_coverage_threshold: DEFAULT_BACKEND_COVERAGE_THRESHOLD,
            frontend_coverage_threshold: DEFAULT_FRONTEND_COVERAGE_THRESHOLD,
            coverage_report_path: None,
        }
    }
}

/// Load `.env` (then `.env.local`) sitting next to the executable.
/// Values already present in the process environment win.
pub fn load_env_files() {
    let Ok(exe_path) = std::env::current_exe() else {
        return;
    };
    let Some(exe_dir) = exe_path.parent() else {
        return;
    };
    for name in [".env", ".env.local"] {
        let path = exe_dir.join(name);
        if path.exists() {
            if let Err(e) = dotenvy::from_path(&path) {
                tracing::warn!(path = %path.display(), error = %e, "Failed to load env file");
            }
        }
    }
}

pub fn load_config() -> Config {
    let mut cfg = Config::default();

    if let Ok(val) = std::env::var("GATE_IGNORE_GLOBS") {
        cfg.ignore_globs = build_globset(val.split(','));
    }

    if let Ok(val) = std::env::var("GATE_DISABLED_RULES") {
        cfg.disabled_rules = split_list(&val);
    }

    if let Ok(val) = std::env::var("CLAUDE_PROJECT_DIR") {
        if !val.trim().is_empty() {
            cfg.project_dir = Some(PathBuf::from(val.trim()));
        }
    }

    if let Some(t) = env_threshold("BACKEND_COVERAGE_THRESHOLD") {
        cfg.backend_coverage_threshold = t;
    }
    if let Some(t) = env_threshold("FRONTEND_COVERAGE_THRESHOLD") {
        cfg.frontend_coverage_threshold = t;
    }
    if let Ok(val) = std::env::var("COVERAGE_REPORT_PATH") {
        if !val.trim().is_empty() {
            cfg.coverage_report_path = Some(PathBuf::from(val.trim()));
        }
    }

    // Optional JSON config file: path from HOOKS_CONFIG_FILE or .hooks-config.json in CWD
    let cfg_path = std::env::var("HOOKS_CONFIG_FILE")
        .ok()
        .unwrap_or_else(|| ".hooks-config.json".to_string());
    apply_config_file(&mut cfg, Path::new(&cfg_path));

    cfg
}

fn apply_config_file(cfg: &mut Config, path: &Path) {
    let Ok(text) = std::fs::read_to_string(path) else {
        return;
    };
    let json = match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unparsable hooks config");
            return;
        }
    };

    if let Some(globs) = json.get("ignore_globs").and_then(|v| v.as_array()) {
        cfg.ignore_globs = build_globset(globs.iter().filter_map(|g| g.as_str()));
    }
    if let Some(list) = json.get("disabled_rules").and_then(|v| v.as_array()) {
        cfg.disabled_rules = list
            .iter()
            .filter_map(|r| r.as_str())
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
    }
    if let Some(dir) = json.get("project_dir").and_then(|v| v.as_str()) {
        if !dir.trim().is_empty() {
            cfg.project_dir = Some(PathBuf::from(dir.trim()));
        }
    }
    if let Some(t) = json.get("backend_coverage_threshold").and_then(|v| v.as_f64()) {
        cfg.backend_coverage_threshold = t.clamp(0.0, 100.0);
    }
    if let Some(t) = json.get("frontend_coverage_threshold").and_then(|v| v.as_f64()) {
        cfg.frontend_coverage_threshold = t.clamp(0.0, 100.0);
    }
    if let Some(path) = json.get("coverage_report_path").and_then(|v| v.as_str()) {
        if !path.trim().is_empty() {
            cfg.coverage_report_path = Some(PathBuf::from(path.trim()));
        }
    }
}

fn build_globset<'a>(patterns: impl Iterator<Item = &'a str>) -> Option<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let mut added = 0usize;
    for pat in patterns.map(str::trim).filter(|s| !s.is_empty()) {
        match Glob::new(pat) {
            Ok(glob) => {
                builder.add(glob);
                added += 1;
            }
            Err(e) => tracing::warn!(pattern = pat, error = %e, "Skipping invalid ignore glob"),
        }
    }
    if added == 0 {
        return None;
    }
    builder.build().ok()
}

fn split_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn env_threshold(key: &str) -> Option<f64> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .map(|t| t.clamp(0.0, 100.0))
}

pub fn should_ignore_path(cfg: &Config, path: &str) -> bool {
    if path.is_empty() {
        return false;
    }
    let p = Path::new(path);
    cfg.ignore_globs
        .as_ref()
        .map(|set| set.is_match(p))
        .unwrap_or(false)
}

pub fn is_rule_disabled(cfg: &Config, rule_id: &str) -> bool {
    cfg.disabled_rules
        .iter()
        .any(|r| r.eq_ignore_ascii_case(rule_id))
}

/// Resolve a payload path for disk reads.
/// Relative paths are joined onto the project dir, then the payload cwd.
pub fn resolve_target(cfg: &Config, path: &str, cwd: Option<&str>) -> PathBuf {
    let p = PathBuf::from(path);
    if p.is_absolute() {
        return p;
    }
    if let Some(dir) = &cfg.project_dir {
        return dir.join(p);
    }
    match cwd.map(str::trim).filter(|c| !c.is_empty()) {
        Some(cwd) => Path::new(cwd).join(p),
        None => p,
    }
}
