use std::io::{self, IsTerminal, Read, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use skill_validation_hooks::config::{load_config, load_env_files};
use skill_validation_hooks::engine::{run_gate, run_gate_input};
use skill_validation_hooks::gates::describe_rules;
use skill_validation_hooks::{timings, GateKind, HookInput};

#[derive(Parser, Debug)]
#[command(name = "validation-gate", version, about = "Deterministic validation gates for tool-call hooks")]
struct Cli {
    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one gate against a hook payload read from stdin
    Check {
        #[arg(value_enum)]
        gate: GateKind,

        /// Evaluate this path instead of reading a payload from stdin
        #[arg(long)]
        file: Option<String>,

        /// Also write the violations as JSON to stderr
        #[arg(long)]
        report: bool,
    },
    /// Print the compiled-in rule tables as JSON
    Rules {
        #[arg(value_enum)]
        gate: Option<GateKind>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("GATE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let json = std::env::var("GATE_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // stdout belongs to the hook protocol
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).without_time().with_writer(io::stderr))
            .init();
    }
}

fn read_stdin() -> String {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return String::new();
    }
    let mut buf = String::new();
    if let Err(e) = stdin.lock().read_to_string(&mut buf) {
        tracing::debug!(error = %e, "Failed to read stdin");
        return String::new();
    }
    buf
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    load_env_files();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            // Internal faults never block the host
            tracing::warn!(error = %e, "validation-gate failed");
            ExitCode::SUCCESS
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Rules { gate } => {
            let kinds: Vec<GateKind> = match gate {
                Some(kind) => vec![kind],
                None => GateKind::ALL.to_vec(),
            };
            let table = serde_json::to_string_pretty(&describe_rules(&kinds)).context("serializing rule table")?;
            writeln!(io::stdout(), "{}", table).context("writing rule table")?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { gate, file, report } => {
            let cfg = load_config();
            let evaluation = match file {
                Some(path) => run_gate_input(gate, &HookInput::for_file(&path), &cfg),
                None => run_gate(gate, &read_stdin(), &cfg),
            };

            if let Some(line) = evaluation.verdict.to_stdout().context("encoding verdict")? {
                let _ = writeln!(io::stdout(), "{}", line);
            }
            if report {
                let violations =
                    serde_json::to_string(&evaluation.violations).context("encoding violations")?;
                let _ = writeln!(io::stderr(), "{}", violations);
            }
            let summary = timings::summary();
            if !summary.is_empty() {
                let _ = write!(io::stderr(), "{}", summary);
            }
            Ok(ExitCode::from(evaluation.verdict.exit_code()))
        }
    }
}
