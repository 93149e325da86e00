use std::io::Write;
use std::process::{Command, Output, Stdio};

fn run_command(command: &str) -> Output {
    let td = tempfile::tempdir().unwrap();
    let input = serde_json::json!({
        "tool_name": "Bash",
        "tool_input": { "command": command },
        "hook_event_name": "PreToolUse"
    });
    let bin = env!("CARGO_BIN_EXE_validation-gate");
    let mut child = Command::new(bin)
        .args(["check", "firebase-command"])
        .current_dir(td.path())
        .env_remove("HOOKS_CONFIG_FILE")
        .env_remove("GATE_DISABLED_RULES")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn validation-gate");
    child.stdin.as_mut().unwrap().write_all(input.to_string().as_bytes()).unwrap();
    child.wait_with_output().unwrap()
}

fn reason(out: &Output) -> String {
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["decision"], "block");
    v["reason"].as_str().unwrap().to_string()
}

#[test]
fn bulk_firestore_delete_is_blocked() {
    let out = run_command("firebase firestore:delete --all-collections");
    assert_eq!(out.status.code(), Some(2));
    assert!(reason(&out).contains("Firestore data deletion"));
}

#[test]
fn project_deletion_is_blocked() {
    let out = run_command("npx firebase projects:delete my-app");
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn chained_destructive_command_is_blocked() {
    let out = run_command("npm run build && firebase functions:delete api --force");
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn plain_deploy_is_allowed_silently() {
    let out = run_command("firebase deploy");
    assert_eq!(out.status.code(), Some(0));
    assert!(out.stdout.is_empty());
}

#[test]
fn non_firebase_commands_are_ignored() {
    for cmd in ["npm install -g firebase-tools", "cat firebase.json", "git status"] {
        let out = run_command(cmd);
        assert_eq!(out.status.code(), Some(0), "{cmd}");
        assert!(out.stdout.is_empty(), "{cmd}");
    }
}

#[test]
fn wrapped_destructive_commands_are_blocked() {
    for cmd in [
        "bash -c 'firebase projects:delete my-app'",
        "env FOO=1 firebase projects:delete my-app",
        "time firebase projects:delete my-app",
        "nohup firebase projects:delete my-app",
        "yarn firebase projects:delete my-app",
        "pnpm exec firebase functions:delete api",
        "npm exec -- firebase hosting:disable",
        "echo $(firebase database:remove /x --force)",
        "echo `firebase firestore:delete /users --recursive --force`",
    ] {
        let out = run_command(cmd);
        assert_eq!(out.status.code(), Some(2), "{cmd}");
        assert!(!reason(&out).is_empty(), "{cmd}");
    }
}

#[test]
fn forced_deploy_with_leading_project_flag_is_advised() {
    let out = run_command("firebase -P prod deploy --force");
    assert_eq!(out.status.code(), Some(0));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert!(v["additionalContext"].as_str().unwrap().contains("production-like"));
}
