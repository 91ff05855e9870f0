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

//! src/core/parser.rs
//!
//! Value and configuration line parser
//!
//! This module turns text into spanned `Value`s. It handles:
//! - Scalars (`swipe`, `plasma_shortcut: kwin,Overview`)
//! - Flat sequences (`[ swipe, pinch ]`, `[]`)
//! - Section headers (`[trigger]`, `[action.item]`) and `key = value` lines
//!
//! # Architecture
//! The parser uses nom combinators for the bracket and line grammar and
//! `nom::Offset` to recover where every fragment sits in the original
//! line, so positions stay absolute no matter how deep a converter slices.
//!
//! The parser only structures text. Interpreting a value as a trigger type,
//! a range or an action is the job of `FromValue` implementations.

use nom::{
    bytes::complete::{take_till, take_while1},
    character::complete::{char, space0},
    combinator::recognize,
    multi::{separated_list0, separated_list1},
    sequence::delimited,
    IResult, Offset, Parser,
};

use crate::core::error::{ConfigError, Span, TextPosition};
use crate::core::value::Value;

/// Parse a standalone value (line 0, column 0)
///
/// # Example
/// ```
/// use gesture_actions::core::parser::parse_value;
///
/// let value = parse_value("aaa123")?;
/// assert_eq!(value.as_scalar()?, "aaa123");
/// # Ok::<(), gesture_actions::core::ConfigError>(())
/// ```
pub fn parse_value(text: &str) -> Result<Value, ConfigError> {
    parse_value_at(text, 0, 0)
}

/// Parse a value that starts at `column_offset` on `line` of a larger file
///
/// Rules:
/// - `[ a, b ]` yields a sequence of trimmed scalars
/// - `[]` yields an empty sequence
/// - anything else yields one scalar spanning the trimmed text
/// - an unterminated `[`, nested brackets or an empty item fail with
///   `ConfigError::Parse`
pub fn parse_value_at(text: &str, line: usize, column_offset: usize) -> Result<Value, ConfigError> {
    let trimmed = text.trim();
    let start = column_offset + text.offset(trimmed);
    let span = Span::new(start, start + trimmed.len());
    let position = TextPosition::new(line, start);

    if !trimmed.starts_with('[') {
        return Ok(Value::scalar(trimmed, span, position));
    }

    if !trimmed.ends_with(']') || trimmed.len() < 2 {
        return Err(ConfigError::parse(
            position,
            Span::new(start, start + 1),
            "Unterminated '[': expected ']' at the end of the sequence.",
        ));
    }

    // Interior brackets would be nested sequences
    let inner = &trimmed[1..trimmed.len() - 1];
    if let Some(index) = inner.find(['[', ']']) {
        let column = start + 1 + index;
        return Err(ConfigError::parse(
            TextPosition::new(line, column),
            Span::new(column, column + 1),
            "Nested sequences are not supported.",
        ));
    }

    if inner.trim().is_empty() {
        return Ok(Value::sequence(Vec::new(), span, position));
    }

    let raw_items = match sequence_items(trimmed) {
        Ok(("", items)) => items,
        _ => {
            return Err(ConfigError::parse(position, span, "Malformed sequence."));
        }
    };

    let mut items = Vec::with_capacity(raw_items.len());
    for raw in raw_items {
        let item = raw.trim();
        let item_start = column_offset + text.offset(item);
        if item.is_empty() {
            // An empty slice may sit anywhere inside `raw`; point at the raw item
            let raw_start = column_offset + text.offset(raw);
            return Err(ConfigError::parse(
                TextPosition::new(line, raw_start),
                Span::new(raw_start, raw_start + raw.len()),
                "Empty sequence item.",
            ));
        }
        items.push(Value::scalar(
            item,
            Span::new(item_start, item_start + item.len()),
            TextPosition::new(line, item_start),
        ));
    }

    Ok(Value::sequence(items, span, position))
}

/// Bracketed, comma separated items with surrounding whitespace kept
fn sequence_items(input: &str) -> IResult<&str, Vec<&str>> {
    delimited(
        char('['),
        separated_list0(char(','), take_till(|c: char| c == ',' || c == ']')),
        char(']'),
    )
    .parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

/// Parse a section header such as `[trigger]`, returning the section name
///
/// Names may be dotted (`[action.item]`).
pub fn parse_section_header(input: &str) -> IResult<&str, &str> {
    let name = recognize(separated_list1(char('.'), identifier));
    delimited((char('['), space0), name, (space0, char(']'))).parse(input)
}

/// Parse `key = value`, returning the key and the raw value text
///
/// The value is returned untrimmed so callers can compute its column with
/// `nom::Offset` against the full line.
pub fn parse_key_value(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, key) = identifier(input)?;
    let (value, _) = (space0, char('='), space0).parse(input)?;
    Ok(("", (key, value)))
}

/// Strip a trailing `# comment` from a configuration line
///
/// A comment starts at a `#` that is the first character of the line or is
/// preceded by whitespace, so `#` inside words (`C#`) is kept.
pub fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (index, byte) in bytes.iter().enumerate() {
        if *byte == b'#' && (index == 0 || bytes[index - 1].is_ascii_whitespace()) {
            return &line[..index];
        }
    }
    line
}
