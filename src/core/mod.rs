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

//! src/core/mod.rs
//!
//! Core gesture model
//!
//! This module contains the fundamental data structures and algorithms
//! shared by the configuration layer and the trigger handlers, including:
//! - Trigger classification types (type mask, speed, magnitude range)
//! - The spanned configuration value model and its parser
//! - Typed conversion with positioned errors
//! - The condition engine and runtime variables
//! - Validation of action arguments
//!
//! Nothing here performs I/O, so all of it is unit tested without devices.

pub mod condition;
pub mod convert;
pub mod error;
pub mod parser;
pub mod types;
pub mod validator;
pub mod value;
pub mod variables;

pub use condition::{
    ComparisonOperator, Condition, ConditionContext, EvaluationError, LazyCondition, Predicate,
    VariableCondition,
};
pub use convert::FromValue;
pub use error::{ConfigError, Span, TextPosition};
pub use types::*;
pub use validator::ValidationError;
pub use value::{Value, ValueKind, ValueType};
pub use variables::{VariableManager, VariableValue};

#[cfg(test)]
mod tests;
