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

//! src/core/variables.rs
//!
//! Runtime variables read by conditions
//!
//! The host publishes state (`fingers`, `window_class`, ...) here and
//! comparison leaves read it during evaluation.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

/// A runtime variable value
#[derive(Clone, Debug, PartialEq)]
pub enum VariableValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl VariableValue {
    /// Infer the type of a textual value: booleans, then numbers, then text
    pub fn parse(text: &str) -> Self {
        match text {
            "true" => return VariableValue::Bool(true),
            "false" => return VariableValue::Bool(false),
            _ => {}
        }
        match text.parse::<f64>() {
            Ok(number) if number.is_finite() => VariableValue::Number(number),
            _ => VariableValue::Text(text.to_string()),
        }
    }

    /// Interpret `text` as the same type as `self`, or `None` if it cannot be
    pub fn parse_like(&self, text: &str) -> Option<Self> {
        match self {
            VariableValue::Bool(_) => match text {
                "true" => Some(VariableValue::Bool(true)),
                "false" => Some(VariableValue::Bool(false)),
                _ => None,
            },
            VariableValue::Number(_) => text
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(VariableValue::Number),
            VariableValue::Text(_) => Some(VariableValue::Text(text.to_string())),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            VariableValue::Bool(_) => "bool",
            VariableValue::Number(_) => "number",
            VariableValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Bool(value) => write!(f, "{}", value),
            VariableValue::Number(value) => write!(f, "{}", value),
            VariableValue::Text(value) => write!(f, "{}", value),
        }
    }
}

impl From<bool> for VariableValue {
    fn from(value: bool) -> Self {
        VariableValue::Bool(value)
    }
}

impl From<f64> for VariableValue {
    fn from(value: f64) -> Self {
        VariableValue::Number(value)
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        VariableValue::Text(value.to_string())
    }
}

/// Thread-safe map of named runtime variables
#[derive(Debug, Default)]
pub struct VariableManager {
    variables: RwLock<HashMap<String, VariableValue>>,
}

impl VariableManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace a variable
    pub fn set(&self, name: &str, value: impl Into<VariableValue>) {
        let mut variables = self.variables.write().unwrap_or_else(PoisonError::into_inner);
        variables.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<VariableValue> {
        let variables = self.variables.read().unwrap_or_else(PoisonError::into_inner);
        variables.get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<VariableValue> {
        let mut variables = self.variables.write().unwrap_or_else(PoisonError::into_inner);
        variables.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        let variables = self.variables.read().unwrap_or_else(PoisonError::into_inner);
        variables.contains_key(name)
    }

    /// Variable names, sorted
    pub fn names(&self) -> Vec<String> {
        let variables = self.variables.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = variables.keys().cloned().collect();
        names.sort();
        names
    }
}
