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

//! src/core/convert.rs
//!
//! Typed conversion of configuration values
//!
//! New target types plug in by implementing `FromValue`; the parser never
//! needs to know about them. Every converter reports failures at the
//! position of the value (or sub-value) that caused them.

use regex::Regex;

use crate::core::error::ConfigError;
use crate::core::types::{InputDeviceType, Range, TriggerDirection, TriggerSpeed, TriggerType};
use crate::core::value::Value;

/// Conversion from a parsed configuration value
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ConfigError>;
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ConfigError> {
        value.as_scalar().map(str::to_string)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    /// Converts element-wise; the first failing element wins
    fn from_value(value: &Value) -> Result<Self, ConfigError> {
        value.items()?.iter().map(T::from_value).collect()
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let text = value.as_scalar()?;
        match text.parse::<f64>() {
            Ok(number) if number.is_finite() => Ok(number),
            _ => Err(ConfigError::invalid_value(
                value,
                format!("'{}' is not a valid number.", text),
            )),
        }
    }
}

impl FromValue for u32 {
    fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let text = value.as_scalar()?;
        text.parse::<u32>().map_err(|_| {
            ConfigError::invalid_value(value, format!("'{}' is not a valid unsigned integer.", text))
        })
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ConfigError> {
        match value.as_scalar()? {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(ConfigError::invalid_value(
                value,
                format!("'{}' is not a valid boolean (expected true or false).", other),
            )),
        }
    }
}

impl FromValue for Range<f64> {
    /// `a-b` is `[a, b]`, a lone `a` is `[a, +inf]`
    fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let text = value.as_scalar()?;

        // A leading minus and an exponent sign (`1e-5`) are part of a number
        let separator = text
            .char_indices()
            .skip(1)
            .find(|&(index, c)| c == '-' && !text[..index].ends_with(['e', 'E']))
            .map(|(index, _)| index);

        let Some(separator) = separator else {
            return Ok(Range::at_least(f64::from_value(value)?));
        };

        let (min, max) = separated_pair(value, separator, 1)?;
        let (min, max) = (f64::from_value(&min)?, f64::from_value(&max)?);
        if min > max {
            return Err(ConfigError::invalid_value(
                value,
                format!("Range minimum {} is greater than maximum {}.", min, max),
            ));
        }

        Ok(Range::new(min, max))
    }
}

impl FromValue for TriggerType {
    /// A name or a sequence of names, OR'ed together
    fn from_value(value: &Value) -> Result<Self, ConfigError> {
        if value.is_scalar() {
            return trigger_type_name(value);
        }

        let mut result = TriggerType::NONE;
        let mut seen = Vec::new();
        for (index, item) in value.items()?.iter().enumerate() {
            let flag = trigger_type_name(item)?;
            if seen.contains(&flag) {
                return Err(ConfigError::DuplicateItem {
                    position: item.position(),
                    span: item.span(),
                    index,
                });
            }
            seen.push(flag);
            result |= flag;
        }

        Ok(result)
    }
}

fn trigger_type_name(value: &Value) -> Result<TriggerType, ConfigError> {
    let name = value.as_scalar()?;
    TriggerType::from_config_name(name)
        .ok_or_else(|| ConfigError::invalid_value(value, format!("Unknown trigger type '{}'.", name)))
}

impl FromValue for TriggerSpeed {
    fn from_value(value: &Value) -> Result<Self, ConfigError> {
        match value.as_scalar()? {
            "any" => Ok(TriggerSpeed::Any),
            "slow" => Ok(TriggerSpeed::Slow),
            "fast" => Ok(TriggerSpeed::Fast),
            other => Err(ConfigError::invalid_value(
                value,
                format!("Unknown speed '{}' (expected any, slow or fast).", other),
            )),
        }
    }
}

impl FromValue for TriggerDirection {
    fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let name = value.as_scalar()?;
        TriggerDirection::from_config_name(name)
            .ok_or_else(|| ConfigError::invalid_value(value, format!("Unknown direction '{}'.", name)))
    }
}

impl FromValue for InputDeviceType {
    fn from_value(value: &Value) -> Result<Self, ConfigError> {
        match value.as_scalar()? {
            "touchpad" => Ok(InputDeviceType::Touchpad),
            "mouse" => Ok(InputDeviceType::Mouse),
            "touchscreen" => Ok(InputDeviceType::Touchscreen),
            other => Err(ConfigError::invalid_value(
                value,
                format!("Unknown device type '{}'.", other),
            )),
        }
    }
}

impl FromValue for Regex {
    fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let pattern = value.as_scalar()?;
        Regex::new(pattern)
            .map_err(|e| ConfigError::invalid_value(value, format!("Invalid regular expression: {}", e)))
    }
}

/// Split a scalar at byte `index` into two trimmed, positioned halves
///
/// `separator_len` bytes starting at `index` are dropped. Both halves must
/// be non-empty after trimming; an empty half is reported at the separator.
pub fn separated_pair(
    value: &Value,
    index: usize,
    separator_len: usize,
) -> Result<(Value, Value), ConfigError> {
    let text = value.as_scalar()?;
    let (left, right) = (&text[..index], &text[index + separator_len..]);
    let (left, right) = (left.trim(), right.trim());

    if left.is_empty() || right.is_empty() {
        let separator = value.substring(index, separator_len)?;
        return Err(ConfigError::invalid_value(
            &separator,
            "Expected a value on both sides of the separator.",
        ));
    }

    Ok((value.subslice(left)?, value.subslice(right)?))
}
