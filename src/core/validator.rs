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

//! Security-focused validation of action arguments
//!
//! Plasma shortcut components end up in a D-Bus object path handed to
//! `qdbus`, so they are restricted to an allow-list of characters rather
//! than screened for known-bad ones. Shortcut names are free text but may
//! not carry line breaks or padding.
//!
//! Free-form `command` actions run through a shell on purpose, so only
//! their size is bounded.

use thiserror::Error;

/// Maximum length of a command or argument string
pub const MAX_ARGUMENT_LENGTH: usize = 1000;

/// Validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Component name contains invalid characters
    #[error("Invalid component '{0}': expected letters, digits, '_', '.' or '-'")]
    InvalidComponent(String),

    /// Shortcut name is empty or padded with whitespace
    #[error("Invalid shortcut '{0}'")]
    InvalidShortcut(String),

    /// Argument exceeds maximum length
    #[error("Argument too long: {0} characters (max 1000)")]
    ArgumentTooLong(usize),

    #[error("Value must not be empty")]
    Empty,
}

/// Validates a Plasma global shortcut component name
///
/// Accepts D-Bus style names (`kwin`, `org.kde.krunner`, `plasma-desktop`).
/// Names made only of separators (`_`, `--`, `.`) are rejected even though
/// every character is allowed on its own.
pub fn validate_component(component: &str) -> Result<(), ValidationError> {
    let allowed = component
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    let only_separators = component.chars().all(|c| matches!(c, '_' | '-' | '.'));
    if !component.is_empty() && allowed && !only_separators {
        Ok(())
    } else {
        Err(ValidationError::InvalidComponent(component.to_string()))
    }
}

/// Validates a Plasma shortcut name (free text, but not blank or padded)
pub fn validate_shortcut(shortcut: &str) -> Result<(), ValidationError> {
    if shortcut.is_empty() {
        return Err(ValidationError::Empty);
    }
    if shortcut.trim() != shortcut || shortcut.contains(['\n', '\r']) {
        return Err(ValidationError::InvalidShortcut(shortcut.to_string()));
    }
    validate_length(shortcut)
}

/// Validates a shell command: non-empty and bounded
pub fn validate_command(command: &str) -> Result<(), ValidationError> {
    if command.trim().is_empty() {
        return Err(ValidationError::Empty);
    }
    validate_length(command)
}

fn validate_length(input: &str) -> Result<(), ValidationError> {
    let length = input.chars().count();
    if length > MAX_ARGUMENT_LENGTH {
        Err(ValidationError::ArgumentTooLong(length))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_components() {
        assert!(validate_component("kwin").is_ok());
        assert!(validate_component("org.kde.krunner.desktop").is_ok());
        assert!(validate_component("plasma-desktop_2").is_ok());
    }

    #[test]
    fn test_invalid_components() {
        assert!(validate_component("_").is_err());
        assert!(validate_component("-._").is_err());
        assert!(validate_component("").is_err());
        assert!(validate_component("kwin;reboot").is_err());
        assert!(validate_component("k win").is_err());
    }

    #[test]
    fn test_shortcut_rules() {
        assert!(validate_shortcut("Switch One Desktop to the Left").is_ok());
        assert_eq!(validate_shortcut(""), Err(ValidationError::Empty));
        assert!(validate_shortcut(" Overview").is_err());
    }

    #[test]
    fn test_argument_length_limit() {
        let long_command = "a".repeat(1001);
        assert_eq!(
            validate_command(&long_command),
            Err(ValidationError::ArgumentTooLong(1001))
        );
        assert!(validate_command(&"a".repeat(1000)).is_ok());
        assert_eq!(validate_command("   "), Err(ValidationError::Empty));
    }
}
