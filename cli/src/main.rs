//! Command-line driver for the camel interpreter (§4.9).
//!
//! Reads a program from a file (or stdin via `-`), runs it against a fresh
//! namespace, and prints the result or a redacted traceback. Grounded on the
//! teacher's `cli/src/main.rs` binary wiring (tracing-subscriber init via
//! `EnvFilter`, `anyhow` at the process boundary) and on
//! `run_code.py`'s read-run-report driver shape — this binary has no TUI, no
//! event loop, and no registered tool suite of its own (§1 names the
//! concrete tool suite as out of scope); it exists to exercise the engine
//! end to end from the outside.

use std::io::Read as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use camel_config::RunConfig;
use camel_engine::{extract_code_block, namespace_with_builtins, run, EvalArgs, EvalMode};
use camel_tools::{SecurityPolicyEngine, ToolRegistry};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Run a camel program and report its result.
#[derive(Debug, Parser)]
#[command(name = "camel", version, about)]
struct Cli {
    /// Path to a source file, or `-` to read from stdin.
    path: String,

    /// Security-policy engine to gate tool calls with: `none`, `banking`, or
    /// `document-sharing`. Overrides the config file's `policy` key.
    #[arg(long)]
    policy: Option<String>,

    /// Run in strict evaluation mode, widening recorded dependency traces.
    /// Overrides the config file's `strict` key.
    #[arg(long)]
    strict: bool,

    /// Load settings from this TOML file instead of `~/.camel/config.toml`.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(env_filter)
        .init();
}

fn read_source(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read program from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
    }
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RunConfig::load_from(path).with_context(|| format!("loading {}", path.display()))?,
        None => RunConfig::load().unwrap_or_default(),
    };

    let policy_name = cli.policy.as_deref().unwrap_or_else(|| config.policy_name()).to_string();
    let policy: &'static SecurityPolicyEngine =
        Box::leak(Box::new(camel_config::resolve_policy(&policy_name)?));

    let mode = if cli.strict || config.is_strict() {
        EvalMode::Strict
    } else {
        EvalMode::Normal
    };

    let source = read_source(&cli.path)?;

    let namespace = namespace_with_builtins();
    ToolRegistry::new().install(&namespace, policy);

    let eval_args = EvalArgs { mode };
    let (result, _log, _deps) = run(&source, &namespace, vec![], &eval_args);

    match result {
        Ok(value) => {
            println!("{:?}", value.to_plain());
            Ok(())
        }
        Err(exc) => {
            let extracted = extract_code_block(&source);
            eprintln!("{}", camel_core::exception::render_traceback(&exc, &extracted));
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_source_from_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prog.py");
        std::fs::write(&path, "x = 1\n").unwrap();
        let source = read_source(path.to_str().unwrap()).unwrap();
        assert_eq!(source, "x = 1\n");
    }

    #[test]
    fn missing_file_is_a_readable_error() {
        let err = read_source("/nonexistent/path/does/not/exist.py").unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
