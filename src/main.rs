//! CLI entry point for gesture-actions
//!
//! Provides command-line interface for validating configuration files,
//! listing triggers, replaying recorded motion and watching for edits.

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use gesture_actions::{
    actions::RecordingExecutor,
    config::{self, ConfigWatcher, LoadError},
    core::{InputDevice, InputDeviceType, MotionDelta, VariableManager, VariableValue},
    handlers::{HandlerManager, TriggerDefinition},
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gesture-actions")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    Check {
        /// Path to the gesture configuration file
        #[arg(short, long, default_value = "~/.config/gesture-actions.conf")]
        config: PathBuf,
    },

    /// List the triggers of a configuration file
    List {
        /// Path to the gesture configuration file
        #[arg(short, long, default_value = "~/.config/gesture-actions.conf")]
        config: PathBuf,
    },

    /// Replay a motion script against the configured triggers
    Replay {
        /// Path to the gesture configuration file
        #[arg(short, long, default_value = "~/.config/gesture-actions.conf")]
        config: PathBuf,

        /// Device class the motion comes from
        #[arg(short, long, value_enum, default_value_t = DeviceArg::Touchpad)]
        device: DeviceArg,

        /// Motion script: `pointer dx dy`, `pinch scale angle`, `wheel dx dy`,
        /// `hold ms`, `end` or `set <variable> <value>`, one per line
        #[arg(short, long)]
        events: PathBuf,
    },

    /// Re-validate a configuration file every time it changes
    Watch {
        /// Path to the gesture configuration file
        #[arg(short, long, default_value = "~/.config/gesture-actions.conf")]
        config: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DeviceArg {
    Touchpad,
    Mouse,
    Touchscreen,
}

impl From<DeviceArg> for InputDeviceType {
    fn from(device: DeviceArg) -> Self {
        match device {
            DeviceArg::Touchpad => InputDeviceType::Touchpad,
            DeviceArg::Mouse => InputDeviceType::Mouse,
            DeviceArg::Touchscreen => InputDeviceType::Touchscreen,
        }
    }
}

/// One line of a replay script
#[derive(Debug)]
enum ScriptStep {
    Motion(MotionDelta),
    End,
    Set(String, VariableValue),
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => check_config(&config)?,
        Commands::List { config } => list_triggers(&config)?,
        Commands::Replay {
            config,
            device,
            events,
        } => replay(&config, device.into(), &events)?,
        Commands::Watch { config } => watch_config(&config)?,
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Expand tilde in a path argument
fn expand(path: &Path) -> anyhow::Result<PathBuf> {
    let text = path
        .to_str()
        .ok_or_else(|| anyhow!("Invalid path encoding"))?;
    Ok(config::expand_path(text))
}

/// Print a load error the way a compiler would, prefixed with the file
fn report_load_error(path: &Path, error: &LoadError) {
    match error {
        LoadError::Config(config_error) => {
            let position = config_error.position();
            eprintln!(
                "{}:{}: {} {}",
                path.display(),
                position,
                "error:".red().bold(),
                config_error.message()
            );
        }
        other => eprintln!("{} {}", "✗".red().bold(), other),
    }
}

/// Load and validate a configuration file
fn check_config(config_path: &Path) -> anyhow::Result<()> {
    let path = expand(config_path)?;
    println!("{} Checking config: {}", "→".cyan(), path.display());

    match config::load_file(&path) {
        Ok(triggers) => {
            println!(
                "{} {}",
                "✓".green().bold(),
                format!(
                    "{} trigger{} loaded, no errors",
                    triggers.len(),
                    if triggers.len() == 1 { "" } else { "s" }
                )
                .bold()
            );
            Ok(())
        }
        Err(e) => {
            report_load_error(&path, &e);
            std::process::exit(1);
        }
    }
}

/// List all triggers in the config
fn list_triggers(config_path: &Path) -> anyhow::Result<()> {
    let path = expand(config_path)?;
    let triggers = load_or_report(&path)?;

    println!("{}", format!("Triggers from: {}\n", path.display()).bold());

    for (index, trigger) in triggers.iter().enumerate() {
        let label = trigger
            .id
            .clone()
            .unwrap_or_else(|| format!("#{}", index + 1));
        let device = trigger
            .device
            .map(|device| device.to_string())
            .unwrap_or_else(|| "any".to_string());

        println!(
            "{} {} {}",
            label.cyan().bold(),
            format!("[{}]", device).dimmed(),
            trigger.to_string().green()
        );
    }

    println!("\n{} Total: {} triggers", "✓".green(), triggers.len());

    Ok(())
}

fn load_or_report(path: &Path) -> anyhow::Result<Vec<TriggerDefinition>> {
    config::load_file(path).map_err(|e| {
        report_load_error(path, &e);
        anyhow!("Failed to load {}", path.display())
    })
}

/// Feed a motion script through a handler and print what fired
fn replay(config_path: &Path, device_type: InputDeviceType, events: &Path) -> anyhow::Result<()> {
    let path = expand(config_path)?;
    let triggers = load_or_report(&path)?;

    let script_path = expand(events)?;
    let script = fs::read_to_string(&script_path)
        .with_context(|| format!("Failed to read {}", script_path.display()))?;
    let steps = parse_script(&script)?;

    let executor = Arc::new(RecordingExecutor::new());
    let variables = Arc::new(VariableManager::new());
    let mut manager = HandlerManager::new(triggers, executor.clone(), variables.clone());
    let device = InputDevice::new("replay", device_type);
    manager.attach_device(device.clone());

    println!(
        "{} Replaying {} steps on a {}",
        "→".cyan(),
        steps.len(),
        device_type
    );

    let mut fired = 0;
    for (line, step) in steps {
        match step {
            ScriptStep::Motion(delta) => {
                manager.handle_motion(&device, delta);
            }
            ScriptStep::End => manager.end_gesture(&device.name),
            ScriptStep::Set(name, value) => variables.set(&name, value),
        }

        for action in executor.take() {
            fired += 1;
            println!(
                "  {} {}",
                format!("line {}:", line).dimmed(),
                action.to_string().green()
            );
        }
    }

    println!("\n{} {} action(s) fired", "✓".green(), fired);
    Ok(())
}

/// Parse a replay script; `#` starts a comment
fn parse_script(script: &str) -> anyhow::Result<Vec<(usize, ScriptStep)>> {
    let mut steps = Vec::new();

    for (index, raw_line) in script.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let words: Vec<&str> = line.split_whitespace().collect();

        let step = match words.as_slice() {
            ["pointer", dx, dy] => ScriptStep::Motion(MotionDelta::Pointer {
                dx: parse_number(dx, line_number)?,
                dy: parse_number(dy, line_number)?,
            }),
            ["pinch", scale, angle] => ScriptStep::Motion(MotionDelta::Pinch {
                scale: parse_number(scale, line_number)?,
                angle: parse_number(angle, line_number)?,
            }),
            ["wheel", dx, dy] => ScriptStep::Motion(MotionDelta::Wheel {
                dx: parse_number(dx, line_number)?,
                dy: parse_number(dy, line_number)?,
            }),
            ["hold", elapsed] => ScriptStep::Motion(MotionDelta::Hold {
                elapsed_ms: parse_number(elapsed, line_number)?,
            }),
            ["end"] => ScriptStep::End,
            ["set", name, value @ ..] if !value.is_empty() => {
                ScriptStep::Set(name.to_string(), VariableValue::parse(&value.join(" ")))
            }
            _ => bail!("line {}: cannot understand '{}'", line_number, line),
        };
        steps.push((line_number, step));
    }

    Ok(steps)
}

fn parse_number(word: &str, line_number: usize) -> anyhow::Result<f64> {
    word.parse::<f64>()
        .with_context(|| format!("line {}: '{}' is not a number", line_number, word))
}

/// Validate now, then again after every modification
fn watch_config(config_path: &Path) -> anyhow::Result<()> {
    let path = expand(config_path)?;
    let watcher = ConfigWatcher::new(&path)?;

    println!(
        "{} Watching {} (Ctrl+C to stop)",
        "→".cyan(),
        watcher.path().display()
    );
    report_validation(&path);

    loop {
        if watcher.wait_for_change(Duration::from_secs(1))? {
            report_validation(&path);
        }
    }
}

fn report_validation(path: &Path) {
    match config::load_file(path) {
        Ok(triggers) => println!("{} {} triggers valid", "✓".green().bold(), triggers.len()),
        Err(e) => report_load_error(path, &e),
    }
}
