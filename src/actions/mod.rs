// Copyright 2025 Eric Jingryd (tidynest@proton.me)
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

//! Actions and the tag-based action registry
//!
//! An action is declared as `<tag>: <arguments>`. The tag selects a parser
//! from the `ActionRegistry`; the parser receives the arguments as a
//! positioned sub-value, so every error points at the exact offending
//! argument in the original line.
//!
//! # Example
//! ```
//! use gesture_actions::actions::Action;
//! use gesture_actions::core::parser::parse_value;
//!
//! let action: Action = parse_value("plasma_shortcut: kwin,Overview")?.parse_as()?;
//! assert_eq!(
//!     action,
//!     Action::PlasmaShortcut {
//!         component: "kwin".to_string(),
//!         shortcut: "Overview".to_string(),
//!     }
//! );
//! # Ok::<(), gesture_actions::core::ConfigError>(())
//! ```

pub mod executor;
pub mod lifecycle;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{LazyLock, PoisonError, RwLock};

use crate::core::convert::FromValue;
use crate::core::error::ConfigError;
use crate::core::validator::{self, ValidationError};
use crate::core::value::Value;

pub use executor::{ActionExecutor, ExecutionError, ExecutorMode, ProcessExecutor, RecordingExecutor};
pub use lifecycle::{ActionGroup, ActionInterval, ActionItem, ActionPoint, GroupMode, IntervalDirection, TriggerAction};

/// Longest pause a `sleep` action may request
pub const MAX_SLEEP_MS: u64 = 60_000;

/// A dispatchable effect, holding only what it needs to execute
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Invoke a Plasma global shortcut through kglobalaccel
    PlasmaShortcut { component: String, shortcut: String },

    /// Run a shell command
    Command { command: String },

    /// Pause before the next action of the same group
    Sleep { milliseconds: u64 },
}

impl Action {
    /// Registry tag this action is declared with
    pub fn tag(&self) -> &'static str {
        match self {
            Action::PlasmaShortcut { .. } => "plasma_shortcut",
            Action::Command { .. } => "command",
            Action::Sleep { .. } => "sleep",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::PlasmaShortcut { component, shortcut } => {
                write!(f, "{}: {},{}", self.tag(), component, shortcut)
            }
            Action::Command { command } => write!(f, "{}: {}", self.tag(), command),
            Action::Sleep { milliseconds } => write!(f, "{}: {}", self.tag(), milliseconds),
        }
    }
}

/// Parses the argument part of an action declaration
pub type ActionParser = fn(&Value) -> Result<Action, ConfigError>;

/// Map from action tag to argument parser
#[derive(Clone)]
pub struct ActionRegistry {
    parsers: HashMap<String, ActionParser>,
}

static GLOBAL_REGISTRY: LazyLock<RwLock<ActionRegistry>> =
    LazyLock::new(|| RwLock::new(ActionRegistry::with_builtins()));

impl ActionRegistry {
    /// Registry without any tags
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Registry with `plasma_shortcut`, `command` and `sleep`
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("plasma_shortcut", parse_plasma_shortcut);
        registry.register("command", parse_command);
        registry.register("sleep", parse_sleep);
        registry
    }

    /// Add or replace the parser for `tag`
    pub fn register(&mut self, tag: &str, parser: ActionParser) {
        self.parsers.insert(tag.to_string(), parser);
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.parsers.contains_key(tag)
    }

    /// Registered tags, sorted
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Parse a full `<tag>: <arguments>` declaration
    pub fn parse(&self, value: &Value) -> Result<Action, ConfigError> {
        let text = value.as_scalar()?;
        let Some((tag, arguments)) = text.split_once(':') else {
            return Err(ConfigError::invalid_value(
                value,
                "Expected an action of the form '<tag>: <arguments>'.",
            ));
        };

        let tag = tag.trim();
        if tag.is_empty() {
            return Err(ConfigError::invalid_value(value, "Action tag is empty."));
        }
        let tag_value = value.subslice(tag)?;

        let parser = self.parsers.get(tag).ok_or_else(|| ConfigError::UnknownActionTag {
            position: tag_value.position(),
            span: tag_value.span(),
            tag: tag.to_string(),
        })?;

        parser(&value.subslice(arguments.trim())?)
    }

    /// Register a parser in the process-wide registry used by `FromValue`
    ///
    /// Must happen before configuration is loaded.
    pub fn register_global(tag: &str, parser: ActionParser) {
        GLOBAL_REGISTRY
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(tag, parser);
    }

    /// Parse with the process-wide registry
    pub fn parse_global(value: &Value) -> Result<Action, ConfigError> {
        GLOBAL_REGISTRY
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .parse(value)
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

impl FromValue for Action {
    fn from_value(value: &Value) -> Result<Self, ConfigError> {
        ActionRegistry::parse_global(value)
    }
}

fn invalid(value: &Value, error: ValidationError) -> ConfigError {
    ConfigError::invalid_value(value, error.to_string())
}

/// `plasma_shortcut: <component>,<shortcut>`
pub fn parse_plasma_shortcut(arguments: &Value) -> Result<Action, ConfigError> {
    let text = arguments.as_scalar()?;
    let fields: Vec<&str> = text.split(',').collect();
    let [component, shortcut] = fields[..] else {
        return Err(ConfigError::invalid_value(
            arguments,
            "Expected exactly two values separated by ','.",
        ));
    };

    let component_value = arguments.subslice(component)?;
    validator::validate_component(component).map_err(|e| invalid(&component_value, e))?;

    let shortcut_value = arguments.subslice(shortcut)?;
    validator::validate_shortcut(shortcut).map_err(|e| invalid(&shortcut_value, e))?;

    Ok(Action::PlasmaShortcut {
        component: component.to_string(),
        shortcut: shortcut.to_string(),
    })
}

/// `command: <shell command>`
pub fn parse_command(arguments: &Value) -> Result<Action, ConfigError> {
    let command = arguments.as_scalar()?;
    validator::validate_command(command).map_err(|e| invalid(arguments, e))?;

    Ok(Action::Command {
        command: command.to_string(),
    })
}

/// `sleep: <milliseconds>`
pub fn parse_sleep(arguments: &Value) -> Result<Action, ConfigError> {
    let milliseconds: u32 = arguments.parse_as()?;
    if u64::from(milliseconds) > MAX_SLEEP_MS {
        return Err(ConfigError::invalid_value(
            arguments,
            format!("Sleep of {} ms exceeds the maximum of {} ms.", milliseconds, MAX_SLEEP_MS),
        ));
    }

    Ok(Action::Sleep {
        milliseconds: u64::from(milliseconds),
    })
}

#[cfg(test)]
mod tests;
