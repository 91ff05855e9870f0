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

//! src/core/value.rs
//!
//! Parsed configuration values
//!
//! A `Value` is either a scalar or an ordered sequence of scalars. Every
//! value remembers where it came from (`Span` and `TextPosition`), which is
//! what allows converters to report errors at the exact offending text,
//! including substrings of a scalar such as individual action arguments.

use std::fmt;

use crate::core::convert::FromValue;
use crate::core::error::{ConfigError, Span, TextPosition};

/// Shape of a value, used in type mismatch errors
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueType {
    Scalar,
    Sequence,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Scalar => write!(f, "scalar"),
            ValueType::Sequence => write!(f, "sequence"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValueKind {
    Scalar(String),
    Sequence(Vec<Value>),
}

/// A configuration value tagged with its source location
#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    kind: ValueKind,
    span: Span,
    position: TextPosition,
}

impl Value {
    pub fn scalar(text: &str, span: Span, position: TextPosition) -> Self {
        Self {
            kind: ValueKind::Scalar(text.to_string()),
            span,
            position,
        }
    }

    pub fn sequence(items: Vec<Value>, span: Span, position: TextPosition) -> Self {
        Self {
            kind: ValueKind::Sequence(items),
            span,
            position,
        }
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn position(&self) -> TextPosition {
        self.position
    }

    pub fn value_type(&self) -> ValueType {
        match self.kind {
            ValueKind::Scalar(_) => ValueType::Scalar,
            ValueKind::Sequence(_) => ValueType::Sequence,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, ValueKind::Scalar(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, ValueKind::Sequence(_))
    }

    /// Scalar text, or `InvalidValueType` if this is a sequence
    pub fn as_scalar(&self) -> Result<&str, ConfigError> {
        match &self.kind {
            ValueKind::Scalar(text) => Ok(text),
            ValueKind::Sequence(_) => Err(ConfigError::invalid_type(self, ValueType::Scalar)),
        }
    }

    /// Sequence items, or `InvalidValueType` if this is a scalar
    pub fn items(&self) -> Result<&[Value], ConfigError> {
        match &self.kind {
            ValueKind::Sequence(items) => Ok(items),
            ValueKind::Scalar(_) => Err(ConfigError::invalid_type(self, ValueType::Sequence)),
        }
    }

    /// Items of a sequence, or this value alone if it is a scalar
    pub fn items_or_self(&self) -> Vec<&Value> {
        match &self.kind {
            ValueKind::Sequence(items) => items.iter().collect(),
            ValueKind::Scalar(_) => vec![self],
        }
    }

    /// Builds a scalar covering `len` bytes of this scalar starting at `offset`
    ///
    /// The returned value keeps absolute positions, so errors reported on
    /// it point into the original line rather than into the substring.
    pub fn substring(&self, offset: usize, len: usize) -> Result<Value, ConfigError> {
        let text = self.as_scalar()?;
        let part = text
            .get(offset..offset + len)
            .ok_or_else(|| ConfigError::invalid_value(self, "Substring out of bounds."))?;

        Ok(Value::scalar(
            part,
            Span::new(self.span.start + offset, self.span.start + offset + len),
            TextPosition::new(self.position.line, self.position.column + offset),
        ))
    }

    /// Same as `substring`, but locates `part` by its address inside this scalar
    ///
    /// `part` must be a slice borrowed from this value's own text.
    pub fn subslice(&self, part: &str) -> Result<Value, ConfigError> {
        let text = self.as_scalar()?;
        let base = text.as_ptr() as usize;
        let address = part.as_ptr() as usize;
        if address < base || address + part.len() > base + text.len() {
            return Err(ConfigError::invalid_value(self, "Substring out of bounds."));
        }
        self.substring(address - base, part.len())
    }

    /// Converts this value into `T` using its `FromValue` implementation
    ///
    /// # Example
    /// ```
    /// use gesture_actions::core::parser::parse_value;
    ///
    /// let value = parse_value("[ aaa, 123 ]")?;
    /// let items: Vec<String> = value.parse_as()?;
    /// assert_eq!(items, vec!["aaa", "123"]);
    /// # Ok::<(), gesture_actions::core::ConfigError>(())
    /// ```
    pub fn parse_as<T: FromValue>(&self) -> Result<T, ConfigError> {
        T::from_value(self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValueKind::Scalar(text) => write!(f, "{}", text),
            ValueKind::Sequence(items) => {
                let items = items
                    .iter()
                    .map(|item| item.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "[ {} ]", items)
            }
        }
    }
}
