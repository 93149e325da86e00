use std::process::{Command, Stdio};

fn rules(args: &[&str]) -> serde_json::Value {
    let bin = env!("CARGO_BIN_EXE_validation-gate");
    let out = Command::new(bin)
        .arg("rules")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .unwrap();
    assert!(out.status.success());
    serde_json::from_slice(&out.stdout).unwrap()
}

#[test]
fn lists_every_gate_by_default() {
    let table = rules(&[]);
    let gates: std::collections::BTreeSet<&str> = table
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["gate"].as_str().unwrap())
        .collect();
    assert_eq!(gates.len(), 7);
    assert!(gates.contains("xml-output"));
}

#[test]
fn filters_by_gate() {
    let table = rules(&["skill-placement"]);
    let rows = table.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], "SKL001");
    assert_eq!(rows[0]["severity"], "block");
}
