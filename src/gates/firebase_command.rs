use once_cell::sync::Lazy;
use regex::Regex;

use super::{Gate, GateKind};
use crate::rules::{evidence, Predicate, Rule, Subject, Target};
use crate::ToolInput;

// `firebase` as a word anywhere in the line: wrappers (env, time, nohup, yarn,
// pnpm exec, bash -c '...') and command substitution all reach the CLI
static FIREBASE_INVOCATION: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(r#"(?:^|[\s;&|(/'"`])firebase(?:\.cmd)?(?:[\s'"`);&|]|$)"#)
});

// Command separators and substitution boundaries
static SEGMENT_SPLIT: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"&&|\|\||\$\(|[;|\n`()]"));

static PRODUCTION_LIKE: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"(?i)\b(prod|production|live|main)\b"));

// Global options whose value is a separate token
const VALUE_FLAGS: &[&str] = &["--project", "-P", "--config", "-c", "--token", "--account"];

static RULES: &[Rule] = &[
    Rule::block(
        "FB001",
        Predicate::Matches(Target::Command, r"\bprojects:delete\b"),
        "Deleting a Firebase project is irreversible and removes every resource in it",
    ),
    Rule::block(
        "FB002",
        Predicate::Matches(Target::Command, r"\bfirestore:delete\b[^;&|\n]*--all-collections"),
        "Bulk Firestore data deletion (--all-collections) wipes every collection in the database",
    ),
    Rule::block(
        "FB003",
        Predicate::Check(forced_recursive_firestore_delete),
        "Recursive forced Firestore data deletion removes documents and subcollections without confirmation",
    ),
    Rule::block(
        "FB004",
        Predicate::Check(forced_database_remove),
        "Forced Realtime Database removal deletes data without confirmation",
    ),
    Rule::block(
        "FB005",
        Predicate::Matches(Target::Command, r"\bfunctions:delete\b"),
        "Deleting deployed Cloud Functions takes their endpoints offline",
    ),
    Rule::block(
        "FB006",
        Predicate::Matches(Target::Command, r"\bhosting:disable\b"),
        "Disabling Firebase Hosting takes the site offline",
    ),
    Rule::warn(
        "FBW01",
        Predicate::Check(forced_production_deploy),
        "Force-deploying to a production-like target skips safety prompts; double-check the project alias",
    ),
];

pub struct FirebaseCommandGate;

impl Gate for FirebaseCommandGate {
    fn kind(&self) -> GateKind {
        GateKind::FirebaseCommand
    }

    fn applies_to(&self, input: &ToolInput) -> bool {
        let Some(command) = input.command.as_deref() else {
            return false;
        };
        match FIREBASE_INVOCATION.as_ref() {
            Ok(re) => re.is_match(command),
            Err(e) => {
                tracing::warn!(error = %e, "Firebase invocation pattern failed to compile");
                false
            }
        }
    }

    fn rules(&self) -> &'static [Rule] {
        RULES
    }
}

/// One `firebase <subcommand> [args...]` found in a shell command line.
#[derive(Debug, PartialEq, Eq)]
struct Invocation<'a> {
    subcommand: &'a str,
    args: Vec<&'a str>,
}

fn invocations(command: &str) -> Vec<Invocation<'_>> {
    let Ok(split) = SEGMENT_SPLIT.as_ref() else {
        return Vec::new();
    };
    split
        .split(command)
        .filter_map(|segment| {
            let tokens: Vec<&str> = segment
                .split_whitespace()
                .map(|t| t.trim_matches(|c| c == '\'' || c == '"'))
                .filter(|t| !t.is_empty())
                .collect();
            let start = tokens.iter().position(|t| is_firebase_binary(t))?;
            let mut rest = tokens[start + 1..].iter().copied();
            let mut subcommand = None;
            let mut args = Vec::new();
            while let Some(tok) = rest.next() {
                if subcommand.is_none() {
                    if VALUE_FLAGS.contains(&tok) {
                        // keep global options such as `-P prod` visible to the checks
                        args.push(tok);
                        args.extend(rest.next());
                        continue;
                    }
                    if !tok.starts_with('-') {
                        subcommand = Some(tok);
                        continue;
                    }
                }
                args.push(tok);
            }
            subcommand.map(|subcommand| Invocation { subcommand, args })
        })
        .collect()
}

fn is_firebase_binary(token: &str) -> bool {
    let base = token.rsplit('/').next().unwrap_or(token);
    base == "firebase" || base == "firebase.cmd"
}

/// `--long`, `--long=value`, or a short cluster such as `-rf`
fn has_flag(args: &[&str], long: &str, short: char) -> bool {
    args.iter().any(|a| {
        if let Some(name) = a.strip_prefix("--") {
            name == long || name.starts_with(&format!("{long}="))
        } else if let Some(cluster) = a.strip_prefix('-') {
            !cluster.is_empty() && cluster.chars().all(|c| c.is_ascii_alphabetic()) && cluster.contains(short)
        } else {
            false
        }
    })
}

fn first_invocation<'a>(
    subject: &'a Subject,
    subcommand: &str,
    pred: impl Fn(&Invocation<'a>) -> bool,
) -> Option<String> {
    let command = subject.command.as_deref()?;
    invocations(command)
        .into_iter()
        .find(|inv| inv.subcommand == subcommand && pred(inv))
        .map(|inv| {
            let shown = format!("firebase {} {}", inv.subcommand, inv.args.join(" "));
            format!("found `{}`", evidence(shown.trim_end()))
        })
}

fn forced_recursive_firestore_delete(subject: &Subject) -> Option<String> {
    first_invocation(subject, "firestore:delete", |inv| {
        has_flag(&inv.args, "recursive", 'r') && has_flag(&inv.args, "force", 'f')
    })
}

fn forced_database_remove(subject: &Subject) -> Option<String> {
    first_invocation(subject, "database:remove", |inv| has_flag(&inv.args, "force", 'f'))
}

fn forced_production_deploy(subject: &Subject) -> Option<String> {
    let Ok(prod) = PRODUCTION_LIKE.as_ref() else {
        return None;
    };
    first_invocation(subject, "deploy", |inv| {
        has_flag(&inv.args, "force", 'f') && inv.args.iter().any(|a| prod.is_match(a))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::rules::{Severity, Violation};

    fn command(cmd: &str) -> ToolInput {
        ToolInput {
            command: Some(cmd.to_string()),
            ..Default::default()
        }
    }

    fn eval(cmd: &str) -> Vec<Violation> {
        let subject = Subject {
            command: Some(cmd.to_string()),
            ..Default::default()
        };
        FirebaseCommandGate.evaluate(&subject, &Config::default())
    }

    fn ids(cmd: &str) -> Vec<&'static str> {
        eval(cmd).into_iter().map(|v| v.rule_id).collect()
    }

    #[test]
    fn applicability_requires_a_firebase_invocation() {
        assert!(FirebaseCommandGate.applies_to(&command("firebase deploy")));
        assert!(FirebaseCommandGate.applies_to(&command("npx -y firebase projects:list")));
        assert!(FirebaseCommandGate.applies_to(&command("npm run build && firebase deploy")));
        assert!(FirebaseCommandGate.applies_to(&command("./node_modules/.bin/firebase emulators:start")));
        assert!(!FirebaseCommandGate.applies_to(&command("ls -la")));
        assert!(!FirebaseCommandGate.applies_to(&command("npm install firebase-tools")));
        assert!(!FirebaseCommandGate.applies_to(&ToolInput::default()));
    }

    #[test]
    fn destructive_commands_block() {
        assert_eq!(ids("firebase projects:delete my-app"), vec!["FB001"]);
        assert_eq!(ids("firebase firestore:delete --all-collections"), vec!["FB002"]);
        assert_eq!(ids("firebase firestore:delete /users -r -f"), vec!["FB003"]);
        assert_eq!(ids("firebase firestore:delete /users --recursive --force"), vec!["FB003"]);
        assert_eq!(ids("firebase firestore:delete /users -rf"), vec!["FB003"]);
        assert_eq!(ids("firebase database:remove /messages --force"), vec!["FB004"]);
        assert_eq!(ids("firebase functions:delete sendMail --region us-central1"), vec!["FB005"]);
        assert_eq!(ids("firebase hosting:disable"), vec!["FB006"]);
    }

    #[test]
    fn firestore_bulk_delete_reason_mentions_firestore_data() {
        let v = eval("firebase firestore:delete --all-collections");
        assert_eq!(v[0].severity, Severity::Block);
        assert!(v[0].message.contains("Firestore data deletion"));
    }

    #[test]
    fn non_forced_deletes_are_allowed() {
        assert!(ids("firebase firestore:delete /users/alice").is_empty());
        assert!(ids("firebase firestore:delete /users -r").is_empty());
        assert!(ids("firebase database:remove /messages").is_empty());
    }

    #[test]
    fn forced_production_deploy_is_only_a_warning() {
        let v = eval("firebase deploy --only hosting --project my-app-prod --force");
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].rule_id, "FBW01");
        assert_eq!(v[0].severity, Severity::Warning);
        assert!(ids("firebase deploy --force --project staging").is_empty());
        assert!(ids("firebase deploy --project production").is_empty());
        assert!(ids("firebase deploy").is_empty());
    }

    #[test]
    fn global_flags_before_the_subcommand_are_skipped() {
        let inv = invocations("firebase --project prod database:remove /x -f");
        assert_eq!(inv.len(), 1);
        assert_eq!(inv[0].subcommand, "database:remove");
        assert_eq!(inv[0].args, vec!["--project", "prod", "/x", "-f"]);
    }

    #[test]
    fn wrapped_invocations_are_recognised() {
        for cmd in [
            "bash -c 'firebase projects:delete my-app'",
            "env FOO=1 firebase projects:delete my-app",
            "time firebase projects:delete my-app",
            "nohup firebase projects:delete my-app &",
            "yarn firebase projects:delete my-app",
            "pnpm exec firebase functions:delete api",
            "npm exec -- firebase hosting:disable",
            "echo $(firebase database:remove /x --force)",
            "echo `firebase firestore:delete /users -r -f`",
        ] {
            assert!(FirebaseCommandGate.applies_to(&command(cmd)), "{cmd}");
            assert!(!ids(cmd).is_empty(), "{cmd}");
        }
        assert!(!FirebaseCommandGate.applies_to(&command("cat firebase.json")));
    }

    #[test]
    fn substitution_and_quotes_are_tokenized_away() {
        let inv = invocations("echo $(firebase database:remove /x --force)");
        assert_eq!(inv[0].subcommand, "database:remove");
        assert_eq!(inv[0].args, vec!["/x", "--force"]);
        let inv = invocations("sh -c \"firebase firestore:delete /users -rf\"");
        assert_eq!(inv[0].args, vec!["/users", "-rf"]);
    }

    #[test]
    fn project_flag_before_the_subcommand_counts_for_production_deploys() {
        assert_eq!(ids("firebase -P prod deploy --force"), vec!["FBW01"]);
        assert_eq!(ids("firebase --project production deploy --force"), vec!["FBW01"]);
        assert_eq!(ids("firebase deploy --force -P prod"), vec!["FBW01"]);
        assert!(ids("firebase -P staging deploy --force").is_empty());
    }
}
