// Copyright 2025 bakri (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Action execution with defence-in-depth validation
//!
//! # Safety Modes
//!
//! `ProcessExecutor` operates in two modes:
//! - **DryRun** (default): Validates and logs, never spawns a process
//! - **Live**: Spawns `qdbus` or `sh` (requires explicit opt-in)
//!
//! Tests default to DryRun mode for safety.
//!
//! # Example
//! ```
//! use gesture_actions::actions::{Action, ActionExecutor, ExecutorMode, ProcessExecutor};
//!
//! // Safe: DryRun mode validates but never spawns anything
//! let executor = ProcessExecutor::new(ExecutorMode::DryRun);
//!
//! let action = Action::PlasmaShortcut {
//!     component: "kwin".to_string(),
//!     shortcut: "Overview".to_string(),
//! };
//! assert!(executor.execute(&action).is_ok());
//!
//! // Rejected before anything could run
//! let action = Action::PlasmaShortcut {
//!     component: "kwin;reboot".to_string(),
//!     shortcut: "Overview".to_string(),
//! };
//! assert!(executor.execute(&action).is_err());
//! ```

use std::process::{Command, Stdio};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::actions::Action;
use crate::core::validator;

/// Failures while dispatching an action
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Action rejected: {0}")]
    Rejected(String),
}

/// Backend that carries out fired actions
///
/// Execution is fire-and-forget: implementations must not block on the
/// effect of the action.
pub trait ActionExecutor: Send + Sync {
    fn execute(&self, action: &Action) -> Result<(), ExecutionError>;

    /// Run the actions of a group in order
    ///
    /// A `sleep` delays the actions after it, never the caller.
    fn execute_all(&self, actions: &[Action]) -> Result<(), ExecutionError> {
        actions.iter().try_for_each(|action| self.execute(action))
    }
}

/// Executor operation mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutorMode {
    /// Validation only - NEVER spawns processes (default for tests)
    #[default]
    DryRun,

    /// Full access - requires explicit opt-in
    Live,
}

/// Executes actions by spawning the desktop's command line tools
///
/// # Defence-in-Depth Security
///
/// Before any process is spawned, the action passes through:
/// 1. **Injection validation** - the same checks the config parser ran
/// 2. **Command building** - arguments passed as argv, never interpolated
/// 3. **Mode check** - DryRun/Live enforcement
#[derive(Debug, Default)]
pub struct ProcessExecutor {
    mode: ExecutorMode,
}

impl ProcessExecutor {
    pub fn new(mode: ExecutorMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ExecutorMode {
        self.mode
    }

    /// Builds the process invocation for `action` after re-validating it
    pub fn build_command(&self, action: &Action) -> Result<Command, ExecutionError> {
        let rejected = |e: validator::ValidationError| ExecutionError::Rejected(e.to_string());

        let command = match action {
            Action::PlasmaShortcut { component, shortcut } => {
                validator::validate_component(component).map_err(rejected)?;
                validator::validate_shortcut(shortcut).map_err(rejected)?;

                let mut command = Command::new("qdbus");
                command
                    .arg("org.kde.kglobalaccel")
                    .arg(format!("/component/{}", component))
                    .arg("invokeShortcut")
                    .arg(shortcut);
                command
            }
            Action::Command { command: line } => {
                validator::validate_command(line).map_err(rejected)?;
                let expanded = shellexpand::full(line)
                    .map_err(|e| ExecutionError::Rejected(format!("Failed to expand '{}': {}", line, e)))?;

                let mut command = Command::new("sh");
                command.arg("-c").arg(expanded.as_ref());
                command
            }
            Action::Sleep { .. } => {
                return Err(ExecutionError::Rejected(format!("'{}' does not run a process", action)))
            }
        };

        Ok(command)
    }

    fn prepare(&self, action: &Action) -> Result<Step, ExecutionError> {
        match action {
            Action::Sleep { milliseconds } => Ok(Step::Sleep(Duration::from_millis(*milliseconds))),
            _ => self.build_command(action).map(Step::Spawn),
        }
    }
}

/// One prepared action of a group
enum Step {
    Spawn(Command),
    Sleep(Duration),
}

/// Spawn without waiting; the child is reaped in the background
fn spawn(mut command: Command) -> Result<(), ExecutionError> {
    let program = command.get_program().to_string_lossy().into_owned();
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| ExecutionError::Spawn {
            program: program.clone(),
            source,
        })?;

    debug!(%program, pid = child.id(), "spawned action process");

    std::thread::spawn(move || match child.wait() {
        Ok(status) if !status.success() => warn!(%program, %status, "action process failed"),
        Ok(_) => {}
        Err(e) => warn!(%program, error = %e, "failed to wait for action process"),
    });

    Ok(())
}

impl ActionExecutor for ProcessExecutor {
    fn execute(&self, action: &Action) -> Result<(), ExecutionError> {
        self.execute_all(std::slice::from_ref(action))
    }

    /// Every action is validated before the first one runs
    fn execute_all(&self, actions: &[Action]) -> Result<(), ExecutionError> {
        let steps = actions
            .iter()
            .map(|action| self.prepare(action))
            .collect::<Result<Vec<_>, _>>()?;

        if self.mode == ExecutorMode::DryRun {
            for action in actions {
                info!(%action, "dry run: action not executed");
            }
            return Ok(());
        }

        if !steps.iter().any(|step| matches!(step, Step::Sleep(_))) {
            for step in steps {
                if let Step::Spawn(command) = step {
                    spawn(command)?;
                }
            }
            return Ok(());
        }

        // Sleeps must not block the handler, so the group runs on its own thread
        std::thread::spawn(move || {
            for step in steps {
                match step {
                    Step::Sleep(duration) => std::thread::sleep(duration),
                    Step::Spawn(command) => {
                        if let Err(e) = spawn(command) {
                            warn!(error = %e, "failed to run grouped action");
                        }
                    }
                }
            }
        });

        Ok(())
    }
}

/// Records actions instead of executing them
///
/// Used by `replay` and by tests to observe what fired.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    executed: Mutex<Vec<Action>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Actions executed so far, in order
    pub fn executed(&self) -> Vec<Action> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes and returns the recorded actions
    pub fn take(&self) -> Vec<Action> {
        std::mem::take(&mut *self.executed.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl ActionExecutor for RecordingExecutor {
    fn execute(&self, action: &Action) -> Result<(), ExecutionError> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(action.clone());
        Ok(())
    }
}
