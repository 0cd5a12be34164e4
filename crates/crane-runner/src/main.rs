use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use crane_runner::{init_tracing, RunConfig, Session};
use crane_world::LevelWorld;
use serde_json::json;

/// Run a crane script headlessly and report what happened to the world.
#[derive(Parser, Debug)]
#[command(name = "crane-run", version, about, long_about = None)]
struct Args {
    /// The script to run.
    script: PathBuf,

    /// Level description in JSON. Defaults to an empty 8×8 field.
    #[arg(short, long)]
    level: Option<PathBuf>,

    /// File handed to the script as standard input.
    #[arg(long)]
    stdin: Option<PathBuf>,

    /// Run configuration in JSON (loop and call ceilings, step length).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the outcome, crane and goals as one JSON document.
    #[arg(long)]
    json: bool,
}

fn read(path: &Path, what: &str) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {what} '{}'", path.display()))
}

fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let args = Args::parse();

    let source = read(&args.script, "script")?;
    let stdin = match &args.stdin {
        Some(path) => read(path, "stdin file")?,
        None => String::new(),
    };
    let level = match &args.level {
        Some(path) => LevelWorld::from_json(&read(path, "level")?)
            .with_context(|| format!("invalid level '{}'", path.display()))?,
        None => LevelWorld::default(),
    };
    let config = match &args.config {
        Some(path) => RunConfig::from_json(&read(path, "config")?)
            .with_context(|| format!("invalid config '{}'", path.display()))?,
        None => RunConfig::default(),
    };

    let mut session = Session::new(level, config);
    let outcome = session.run(&source, &stdin);
    let goals = session.goal_report();
    let crane = session.crane();

    if args.json {
        let report = json!({
            "outcome": outcome,
            "crane": crane,
            "goals": goals,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", outcome.stdout);
        for warning in &outcome.warnings {
            eprintln!("warning: {warning}");
        }
        if let Some(error) = &outcome.error {
            eprintln!("error: {error}");
        }
        let carried = crane.carried.as_deref().unwrap_or("nothing");
        eprintln!(
            "crane at ({}, {}) facing {}, carrying {carried}",
            crane.x, crane.y, crane.dir
        );
        if !session.level().goal.is_empty() {
            if goals.met {
                eprintln!("goal complete");
            } else {
                eprintln!("goal incomplete: {} block(s) missing", goals.missing.len());
            }
        }
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
