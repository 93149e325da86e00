use std::time::Duration;

use skill_validation_hooks::timings;

#[test]
fn summary_lists_recorded_labels_in_order() {
    std::env::set_var("GATE_TIMINGS", "1");
    timings::record("structure", Duration::from_micros(40));
    timings::record("doc-lint", Duration::from_micros(120));
    timings::record("doc-lint", Duration::from_micros(80));
    let s = timings::summary();
    assert!(s.starts_with("=== TIMINGS (us) ===\n"), "{s}");
    assert!(s.contains("doc-lint: count=2 p50=80 p95=120 max=120"), "{s}");
    assert!(s.contains("structure: count=1"), "{s}");
    assert!(s.find("doc-lint").unwrap() < s.find("structure").unwrap());
}
