//! Aether CLI - interactive element-combination sandbox.
//!
//! # Event Loop
//!
//! The shell reads commands from stdin while a fixed tick applies finished
//! oracle calls, so discoveries show up even when the user is idle:
//!
//! 1. Wait for the next input line or tick
//! 2. Run the command against the engine
//! 3. On tick, apply finished merges (`engine.tick()`) and print them

mod shell;

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use aether_config::AetherConfig;
use aether_engine::{Engine, EngineSettings, oracle_from_config};

use shell::Command;

const TICK_DURATION: Duration = Duration::from_millis(50);
const PROMPT: &str = "aether> ";

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file: stay silent rather than interleave logs with shell output.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: next to the config file (~/.aether/logs/aether.log)
    if let Some(config_path) = AetherConfig::path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("aether.log"));
    }

    candidates.push(PathBuf::from(".aether").join("logs").join("aether.log"));

    candidates
}

fn load_config() -> Option<AetherConfig> {
    match AetherConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Ignoring config: {e}");
            None
        }
    }
}

fn print_prompt() {
    let mut out = std::io::stdout();
    let _ = out.write_all(PROMPT.as_bytes());
    let _ = out.flush();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = load_config();
    let settings = EngineSettings::from_config(config.as_ref());
    let oracle = oracle_from_config(config.as_ref());
    tracing::info!(oracle = oracle.name(), ?settings, "Starting engine");
    let mut engine = Engine::new(oracle, settings);

    println!("Aether - combine elements to discover new ones. Type 'help' for commands.");
    print_prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticks = tokio::time::interval(TICK_DURATION);
    ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Command::parse(&line) {
                    Ok(Some(command)) => {
                        // `wait` can block on a stalled oracle; ctrl-c returns to the prompt.
                        let output = tokio::select! {
                            output = shell::execute(&mut engine, command) => output,
                            _ = tokio::signal::ctrl_c() => Some(shell::INTERRUPTED.to_string()),
                        };
                        match output {
                            Some(output) => print!("{output}"),
                            None => break,
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                }
                print_prompt();
            }
            _ = ticks.tick() => {
                let outcomes = engine.tick();
                if outcomes.is_empty() {
                    continue;
                }
                let mut out = String::from("\n");
                shell::render_outcomes(&engine, &outcomes, &mut out);
                shell::render_cues(&engine.take_cues(), &mut out);
                print!("{out}");
                print_prompt();
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    if engine.is_busy() {
        tracing::info!(pending = engine.pending_count(), "Exiting with merges still pending");
    }
    Ok(())
}
