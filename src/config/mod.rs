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

//! Trigger configuration files
//!
//! A configuration file is a list of `[trigger]` sections made of
//! `key = value` lines:
//!
//! ```text
//! # Switch desktops with a fast three-finger swipe
//! [trigger]
//! id = desktop-left
//! device = touchpad
//! type = swipe
//! direction = left
//! speed = fast
//! threshold = 100-400
//! conditions = [ fingers == 3 ]
//! action = plasma_shortcut: kwin,Switch One Desktop to the Left
//! ```
//!
//! `action` is shorthand for a single action run when the trigger begins.
//! Actions bound to other points of the gesture follow their trigger as
//! `[action]` sections, and a group of actions lists its members as
//! `[action.item]` sections:
//!
//! ```text
//! [trigger]
//! type = pinch
//! direction = in
//!
//! [action]
//! on = update
//! interval = 0.1
//! action = plasma_shortcut: kwin,view_zoom_out
//!
//! [action]
//! on = end
//! mode = one
//!
//! [action.item]
//! conditions = [ fingers == 3 ]
//! action = command: notify-send zoomed
//!
//! [action.item]
//! action = sleep: 100
//! ```
//!
//! Values follow the value grammar of [`crate::core::parser`] and are
//! converted with [`FromValue`], so every error points at the exact
//! line and column of the offending text. The first error aborts loading.
//!
//! # Example
//!
//! ```no_run
//! use gesture_actions::config;
//!
//! let triggers = config::load_file(&config::expand_path("~/.config/gesture-actions.conf"))?;
//! println!("{} triggers loaded", triggers.len());
//! # Ok::<(), config::LoadError>(())
//! ```

pub mod watcher;

use nom::Offset;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::actions::{
    Action, ActionGroup, ActionInterval, ActionItem, ActionPoint, GroupMode, TriggerAction,
};
use crate::core::condition::{condition_from_groups, Condition};
use crate::core::convert::FromValue;
use crate::core::error::{ConfigError, Span, TextPosition};
use crate::core::parser::{parse_key_value, parse_section_header, parse_value_at, strip_comment};
use crate::core::types::{InputDeviceType, Range, TriggerDirection, TriggerSpeed, TriggerType};
use crate::core::value::Value;
use crate::handlers::TriggerDefinition;

pub use watcher::{ConfigWatcher, WatchError};

const TRIGGER_SECTION: &str = "trigger";
const ACTION_SECTION: &str = "action";
const ITEM_SECTION: &str = "action.item";

/// Errors that can occur while loading a configuration file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Configuration file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Generic I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file was read but its contents are invalid.
    #[error("{}", ConfigError::render(.0))]
    Config(#[from] ConfigError),
}

/// Expand `~` and return the path to use
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Read and load the trigger definitions of a configuration file
pub fn load_file(path: &Path) -> Result<Vec<TriggerDefinition>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let triggers = load_str(&content)?;
    info!(path = %path.display(), triggers = triggers.len(), "configuration loaded");
    Ok(triggers)
}

/// Load trigger definitions from configuration text
///
/// Sections become definitions in file order, which is also the order
/// handlers try them in.
pub fn load_str(content: &str) -> Result<Vec<TriggerDefinition>, ConfigError> {
    let mut triggers = Vec::new();
    let mut section: Option<TriggerSection> = None;

    for (line_number, raw_line) in content.lines().enumerate() {
        let line = strip_comment(raw_line);
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let column = raw_line.offset(trimmed);

        if trimmed.starts_with('[') {
            let header = Value::scalar(
                trimmed,
                Span::new(column, column + trimmed.len()),
                TextPosition::new(line_number, column),
            );
            let name = match parse_section_header(trimmed) {
                Ok((rest, name)) if rest.trim().is_empty() => name,
                _ => {
                    return Err(ConfigError::parse(
                        header.position(),
                        header.span(),
                        "Expected a section header such as '[trigger]'.",
                    ))
                }
            };
            let name_value = header.substring(trimmed.offset(name), name.len())?;

            match name {
                TRIGGER_SECTION => {
                    if let Some(finished) = section.take() {
                        triggers.push(finished.build()?);
                    }
                    section = Some(TriggerSection::new(header));
                }
                ACTION_SECTION | ITEM_SECTION => {
                    let Some(current) = section.as_mut() else {
                        return Err(ConfigError::invalid_value(
                            &name_value,
                            format!("[{}] must follow a [{}] section.", name, TRIGGER_SECTION),
                        ));
                    };
                    if name == ACTION_SECTION {
                        current.open_action(header)?;
                    } else {
                        current.open_item(header, &name_value)?;
                    }
                }
                _ => {
                    return Err(ConfigError::invalid_value(
                        &name_value,
                        format!(
                            "Unknown section '{}' (expected '{}', '{}' or '{}').",
                            name, TRIGGER_SECTION, ACTION_SECTION, ITEM_SECTION
                        ),
                    ))
                }
            }
            continue;
        }

        let Ok((_, (key, raw_value))) = parse_key_value(trimmed) else {
            return Err(ConfigError::parse(
                TextPosition::new(line_number, column),
                Span::new(column, column + trimmed.len()),
                "Expected 'key = value'.",
            ));
        };

        let key_column = raw_line.offset(key);
        let key_value = Value::scalar(
            key,
            Span::new(key_column, key_column + key.len()),
            TextPosition::new(line_number, key_column),
        );
        let Some(current) = section.as_mut() else {
            return Err(ConfigError::invalid_value(
                &key_value,
                format!("Key '{}' outside of a [{}] section.", key, TRIGGER_SECTION),
            ));
        };
        current.check_key(&key_value)?;

        let value = parse_value_at(raw_value, line_number, raw_line.offset(raw_value))?;
        current.set(&key_value, value)?;
    }

    if let Some(finished) = section.take() {
        triggers.push(finished.build()?);
    }

    debug!(triggers = triggers.len(), "configuration parsed");
    Ok(triggers)
}

/// A section whose keys are converted as they are read
trait Section {
    /// Keys this section accepts
    const KEYS: &'static [&'static str];

    fn contains(&self, key: &str) -> bool;

    /// Store a key already accepted by `check_key`
    fn set(&mut self, key: &Value, name: &str, value: Value) -> Result<(), ConfigError>;

    /// Reject unknown and repeated keys before their value is looked at
    fn check_key(&self, key: &Value) -> Result<(), ConfigError> {
        let name = key.as_scalar()?;
        if !Self::KEYS.contains(&name) {
            return Err(ConfigError::invalid_value(key, format!("Unknown key '{}'.", name)));
        }
        if self.contains(name) {
            return Err(ConfigError::invalid_value(
                key,
                format!("Duplicate key '{}' in this section.", name),
            ));
        }
        Ok(())
    }
}

/// The three condition keys shared by every section
#[derive(Default)]
struct ConditionKeys {
    all: Option<Value>,
    any: Option<Value>,
    none: Option<Value>,
}

impl ConditionKeys {
    fn slot(&mut self, key: &str) -> Option<&mut Option<Value>> {
        match key {
            "conditions" => Some(&mut self.all),
            "any_conditions" => Some(&mut self.any),
            "none_conditions" => Some(&mut self.none),
            _ => None,
        }
    }

    fn contains(&self, key: &str) -> bool {
        match key {
            "conditions" => self.all.is_some(),
            "any_conditions" => self.any.is_some(),
            "none_conditions" => self.none.is_some(),
            _ => false,
        }
    }

    /// Returns false if `key` is not a condition key
    fn set(&mut self, key: &str, value: Value) -> Result<bool, ConfigError> {
        let Some(slot) = self.slot(key) else {
            return Ok(false);
        };
        *slot = Some(checked_conditions(value)?);
        Ok(true)
    }

    fn build(&self) -> Result<Option<Condition>, ConfigError> {
        condition_from_groups(self.all.as_ref(), self.any.as_ref(), self.none.as_ref())
    }
}

fn unknown_key(key: &Value, name: &str) -> ConfigError {
    ConfigError::invalid_value(key, format!("Unknown key '{}'.", name))
}

fn missing(header: &Value, property: &str) -> ConfigError {
    ConfigError::MissingProperty {
        position: header.position(),
        span: header.span(),
        property: property.to_string(),
    }
}

/// One `[trigger]` section and the action sections that follow it
struct TriggerSection {
    header: Value,
    id: Option<String>,
    device: Option<Option<InputDeviceType>>,
    trigger_type: Option<TriggerType>,
    direction: Option<(Value, TriggerDirection)>,
    speed: Option<TriggerSpeed>,
    threshold: Option<Range<f64>>,
    conditions: ConditionKeys,
    action: Option<Action>,
    /// Finished `[action]` sections
    actions: Vec<TriggerAction>,
    open_action: Option<ActionSection>,
}

impl TriggerSection {
    fn new(header: Value) -> Self {
        Self {
            header,
            id: None,
            device: None,
            trigger_type: None,
            direction: None,
            speed: None,
            threshold: None,
            conditions: ConditionKeys::default(),
            action: None,
            actions: Vec::new(),
            open_action: None,
        }
    }

    fn open_action(&mut self, header: Value) -> Result<(), ConfigError> {
        if let Some(finished) = self.open_action.take() {
            self.actions.push(finished.build()?);
        }
        self.open_action = Some(ActionSection::new(header));
        Ok(())
    }

    fn open_item(&mut self, header: Value, name: &Value) -> Result<(), ConfigError> {
        let Some(action) = self.open_action.as_mut() else {
            return Err(ConfigError::invalid_value(
                name,
                format!("[{}] must follow an [{}] section.", ITEM_SECTION, ACTION_SECTION),
            ));
        };
        action.open_item(header, name)
    }

    /// Keys belong to the innermost open section
    fn check_key(&self, key: &Value) -> Result<(), ConfigError> {
        match &self.open_action {
            Some(action) => match &action.open_item {
                Some(item) => item.check_key(key),
                None => action.check_key(key),
            },
            None => Section::check_key(self, key),
        }
    }

    fn set(&mut self, key: &Value, value: Value) -> Result<(), ConfigError> {
        let name = key.as_scalar()?;
        match self.open_action.as_mut() {
            Some(action) => match action.open_item.as_mut() {
                Some(item) => item.set(key, name, value),
                None => action.set(key, name, value),
            },
            None => Section::set(self, key, name, value),
        }
    }

    fn build(mut self) -> Result<TriggerDefinition, ConfigError> {
        if let Some(finished) = self.open_action.take() {
            self.actions.push(finished.build()?);
        }

        let trigger_type = self.trigger_type.ok_or_else(|| missing(&self.header, "type"))?;

        let direction = match self.direction {
            Some((value, direction)) => {
                if !direction.trigger_types().intersects(trigger_type) {
                    return Err(ConfigError::invalid_value(
                        &value,
                        format!(
                            "Direction '{}' does not apply to trigger type '{}'.",
                            direction, trigger_type
                        ),
                    ));
                }
                direction
            }
            None => TriggerDirection::Any,
        };

        let mut actions = Vec::with_capacity(self.actions.len() + 1);
        if let Some(action) = self.action {
            actions.push(TriggerAction::on_begin(action));
        }
        actions.append(&mut self.actions);
        if actions.is_empty() {
            return Err(missing(&self.header, "action"));
        }

        Ok(TriggerDefinition {
            id: self.id,
            device: self.device.flatten(),
            trigger_type,
            direction,
            speed: self.speed.unwrap_or_default(),
            threshold: self.threshold,
            condition: self.conditions.build()?,
            actions,
        })
    }
}

impl Section for TriggerSection {
    const KEYS: &'static [&'static str] = &[
        "id",
        "device",
        "type",
        "direction",
        "speed",
        "threshold",
        "conditions",
        "any_conditions",
        "none_conditions",
        "action",
    ];

    fn contains(&self, key: &str) -> bool {
        match key {
            "id" => self.id.is_some(),
            "device" => self.device.is_some(),
            "type" => self.trigger_type.is_some(),
            "direction" => self.direction.is_some(),
            "speed" => self.speed.is_some(),
            "threshold" => self.threshold.is_some(),
            "action" => self.action.is_some(),
            _ => self.conditions.contains(key),
        }
    }

    fn set(&mut self, key: &Value, name: &str, value: Value) -> Result<(), ConfigError> {
        match name {
            "id" => self.id = Some(String::from_value(&value)?),
            "device" => self.device = Some(parse_device(&value)?),
            "type" => self.trigger_type = Some(value.parse_as()?),
            "direction" => {
                let direction = value.parse_as()?;
                self.direction = Some((value, direction));
            }
            "speed" => self.speed = Some(value.parse_as()?),
            "threshold" => self.threshold = Some(value.parse_as()?),
            "action" => self.action = Some(value.parse_as()?),
            _ => {
                if !self.conditions.set(name, value)? {
                    return Err(unknown_key(key, name));
                }
            }
        }
        Ok(())
    }
}

/// One `[action]` section: when to run, and what
struct ActionSection {
    header: Value,
    on: Option<ActionPoint>,
    interval: Option<(Value, ActionInterval)>,
    mode: Option<GroupMode>,
    conditions: ConditionKeys,
    action: Option<Action>,
    /// Finished `[action.item]` sections
    items: Vec<ActionItem>,
    open_item: Option<ItemSection>,
}

impl ActionSection {
    fn new(header: Value) -> Self {
        Self {
            header,
            on: None,
            interval: None,
            mode: None,
            conditions: ConditionKeys::default(),
            action: None,
            items: Vec::new(),
            open_item: None,
        }
    }

    fn open_item(&mut self, header: Value, name: &Value) -> Result<(), ConfigError> {
        if self.action.is_some() {
            return Err(ConfigError::invalid_value(
                name,
                format!(
                    "An [{}] section with an 'action' key cannot have [{}] sections.",
                    ACTION_SECTION, ITEM_SECTION
                ),
            ));
        }
        if let Some(finished) = self.open_item.take() {
            self.items.push(finished.build()?);
        }
        self.open_item = Some(ItemSection::new(header));
        Ok(())
    }

    fn build(mut self) -> Result<TriggerAction, ConfigError> {
        if let Some(finished) = self.open_item.take() {
            self.items.push(finished.build()?);
        }

        let on = self.on.unwrap_or_default();
        let items = match self.action {
            Some(action) => vec![ActionItem::new(action)],
            None if self.items.is_empty() => return Err(missing(&self.header, "action")),
            None => self.items,
        };

        let mut trigger_action = TriggerAction::new(on, ActionGroup::new(self.mode.unwrap_or_default(), items));
        if let Some((value, interval)) = self.interval {
            if on != ActionPoint::Update {
                return Err(ConfigError::invalid_value(
                    &value,
                    format!("An interval only applies to update actions, not '{}'.", on),
                ));
            }
            trigger_action = trigger_action.with_interval(interval);
        }
        if let Some(condition) = self.conditions.build()? {
            trigger_action = trigger_action.with_condition(condition);
        }

        Ok(trigger_action)
    }
}

impl Section for ActionSection {
    const KEYS: &'static [&'static str] = &[
        "on",
        "interval",
        "mode",
        "conditions",
        "any_conditions",
        "none_conditions",
        "action",
    ];

    fn contains(&self, key: &str) -> bool {
        match key {
            "on" => self.on.is_some(),
            "interval" => self.interval.is_some(),
            "mode" => self.mode.is_some(),
            "action" => self.action.is_some(),
            _ => self.conditions.contains(key),
        }
    }

    fn set(&mut self, key: &Value, name: &str, value: Value) -> Result<(), ConfigError> {
        match name {
            "on" => self.on = Some(value.parse_as()?),
            "interval" => {
                let interval = value.parse_as()?;
                self.interval = Some((value, interval));
            }
            "mode" => self.mode = Some(value.parse_as()?),
            "action" => self.action = Some(value.parse_as()?),
            _ => {
                if !self.conditions.set(name, value)? {
                    return Err(unknown_key(key, name));
                }
            }
        }
        Ok(())
    }
}

/// One `[action.item]` section: a group member with its own condition
struct ItemSection {
    header: Value,
    conditions: ConditionKeys,
    action: Option<Action>,
}

impl ItemSection {
    fn new(header: Value) -> Self {
        Self {
            header,
            conditions: ConditionKeys::default(),
            action: None,
        }
    }

    fn build(self) -> Result<ActionItem, ConfigError> {
        let action = self.action.ok_or_else(|| missing(&self.header, "action"))?;
        let item = ActionItem::new(action);
        Ok(match self.conditions.build()? {
            Some(condition) => item.with_condition(condition),
            None => item,
        })
    }
}

impl Section for ItemSection {
    const KEYS: &'static [&'static str] = &["conditions", "any_conditions", "none_conditions", "action"];

    fn contains(&self, key: &str) -> bool {
        match key {
            "action" => self.action.is_some(),
            _ => self.conditions.contains(key),
        }
    }

    fn set(&mut self, key: &Value, name: &str, value: Value) -> Result<(), ConfigError> {
        match name {
            "action" => self.action = Some(value.parse_as()?),
            _ => {
                if !self.conditions.set(name, value)? {
                    return Err(unknown_key(key, name));
                }
            }
        }
        Ok(())
    }
}

/// `any` means every device class
fn parse_device(value: &Value) -> Result<Option<InputDeviceType>, ConfigError> {
    if value.as_scalar()? == "any" {
        return Ok(None);
    }
    value.parse_as().map(Some)
}

/// Validate a condition group now so errors surface in file order
fn checked_conditions(value: Value) -> Result<Value, ConfigError> {
    condition_from_groups(Some(&value), None, None)?;
    Ok(value)
}

#[cfg(test)]
mod tests;
