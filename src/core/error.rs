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

//! Positioned configuration errors
//!
//! Every error produced while parsing or converting configuration values
//! carries the position of the offending text, so a misconfigured trigger
//! can be pointed out to the user instead of silently ignored.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::core::value::{Value, ValueType};

/// Zero-based line and column of a value within its source
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct TextPosition {
    pub line: usize,
    pub column: usize,
}

impl TextPosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for TextPosition {
    /// Human-readable `line:column`, both starting at 1
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// Byte offsets `[start, end)` of a value within its line
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Configuration errors with source position
///
/// The first error encountered wins; converters never return partial
/// results alongside an error.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Text does not follow the value grammar (e.g. unterminated `[`)
    #[error("{position}: {message}")]
    Parse {
        position: TextPosition,
        span: Span,
        message: String,
    },

    /// Value is present but fails type or grammar validation
    #[error("{position}: {message}")]
    InvalidValue {
        position: TextPosition,
        span: Span,
        message: String,
    },

    /// Value is a scalar where a sequence was expected, or vice versa
    #[error("{position}: expected {expected}, found {actual}")]
    InvalidValueType {
        position: TextPosition,
        span: Span,
        expected: ValueType,
        actual: ValueType,
    },

    /// Action declaration uses a tag with no registered parser
    #[error("{position}: no such action type '{tag}'")]
    UnknownActionTag {
        position: TextPosition,
        span: Span,
        tag: String,
    },

    /// The same item appears twice in a set-like sequence
    #[error("{position}: duplicate item at index {index}")]
    DuplicateItem {
        position: TextPosition,
        span: Span,
        index: usize,
    },

    /// A required configuration key is absent
    #[error("{position}: missing required property '{property}'")]
    MissingProperty {
        position: TextPosition,
        span: Span,
        property: String,
    },
}

impl ConfigError {
    pub fn parse(position: TextPosition, span: Span, message: impl Into<String>) -> Self {
        ConfigError::Parse {
            position,
            span,
            message: message.into(),
        }
    }

    /// Invalid value error located at `value`
    pub fn invalid_value(value: &Value, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            position: value.position(),
            span: value.span(),
            message: message.into(),
        }
    }

    pub fn invalid_type(value: &Value, expected: ValueType) -> Self {
        ConfigError::InvalidValueType {
            position: value.position(),
            span: value.span(),
            expected,
            actual: value.value_type(),
        }
    }

    pub fn position(&self) -> TextPosition {
        match self {
            ConfigError::Parse { position, .. }
            | ConfigError::InvalidValue { position, .. }
            | ConfigError::InvalidValueType { position, .. }
            | ConfigError::UnknownActionTag { position, .. }
            | ConfigError::DuplicateItem { position, .. }
            | ConfigError::MissingProperty { position, .. } => *position,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ConfigError::Parse { span, .. }
            | ConfigError::InvalidValue { span, .. }
            | ConfigError::InvalidValueType { span, .. }
            | ConfigError::UnknownActionTag { span, .. }
            | ConfigError::DuplicateItem { span, .. }
            | ConfigError::MissingProperty { span, .. } => *span,
        }
    }

    /// The error text without its position
    pub fn message(&self) -> String {
        match self {
            ConfigError::Parse { message, .. } | ConfigError::InvalidValue { message, .. } => {
                message.clone()
            }
            ConfigError::InvalidValueType { expected, actual, .. } => {
                format!("expected {}, found {}", expected, actual)
            }
            ConfigError::UnknownActionTag { tag, .. } => format!("no such action type '{}'", tag),
            ConfigError::DuplicateItem { index, .. } => format!("duplicate item at index {}", index),
            ConfigError::MissingProperty { property, .. } => {
                format!("missing required property '{}'", property)
            }
        }
    }

    /// Compiler-style rendering: `<line>:<column>: error: <message>`
    pub fn render(&self) -> String {
        format!("{}: error: {}", self.position(), self.message())
    }
}
