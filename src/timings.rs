//! Per-gate wall-clock samples, printed to stderr when `GATE_TIMINGS` is set.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use once_cell::sync::Lazy;

static SAMPLES: Lazy<Mutex<BTreeMap<String, Samples>>> = Lazy::new(|| Mutex::new(BTreeMap::new()));

#[derive(Debug, Default)]
struct Samples {
    micros: Vec<u64>,
}

#[derive(Debug, PartialEq, Eq)]
struct Stats {
    count: usize,
    p50: u64,
    p95: u64,
    max: u64,
}

impl Samples {
    fn push(&mut self, elapsed: Duration) {
        self.micros.push(u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX));
    }

    /// Nearest-rank percentiles over the recorded samples.
    fn stats(&self) -> Option<Stats> {
        let mut sorted = self.micros.clone();
        sorted.sort_unstable();
        let max = *sorted.last()?;
        let rank = |pct: usize| sorted[(pct * sorted.len()).div_ceil(100).saturating_sub(1)];
        Some(Stats {
            count: sorted.len(),
            p50: rank(50),
            p95: rank(95),
            max,
        })
    }
}

fn samples() -> MutexGuard<'static, BTreeMap<String, Samples>> {
    // poisoned samples are still usable
    SAMPLES.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Timing capture is on when `GATE_TIMINGS` is set to anything non-empty.
pub fn enabled() -> bool {
    std::env::var_os("GATE_TIMINGS").is_some_and(|v| !v.is_empty())
}

pub fn record(label: &str, elapsed: Duration) {
    if enabled() {
        samples().entry(label.to_owned()).or_default().push(elapsed);
    }
}

/// Stderr summary; empty when disabled or nothing was recorded.
pub fn summary() -> String {
    if !enabled() {
        return String::new();
    }
    let lines: Vec<String> = samples()
        .iter()
        .filter_map(|(label, s)| {
            s.stats().map(|st| {
                format!("{label}: count={} p50={} p95={} max={}", st.count, st.p50, st.p95, st.max)
            })
        })
        .collect();
    if lines.is_empty() {
        return String::new();
    }
    format!("=== TIMINGS (us) ===\n{}\n", lines.join("\n"))
}
