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

//! src/core/condition.rs
//!
//! Condition engine
//!
//! A `Condition` is a boolean tree evaluated against a `ConditionContext`
//! each time a trigger is about to fire. Leaves compare runtime variables
//! or run custom predicates; `And`, `Or` and `Not` combine them; `Lazy`
//! defers building a subtree until the context can support it.
//!
//! # Lazy conditions
//! A lazy node owns a builder and a write-once cache. Until the builder
//! returns a condition, evaluation fails with `EvaluationError::Unavailable`
//! and the next evaluation tries again. The first successful build is cached
//! for the lifetime of the node and the builder is never called again, even
//! if the inputs it looked at change later.
//!
//! Cloning a `Condition` shares lazy caches, so handlers on different
//! devices built from the same configuration bind together.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    IResult, Parser,
};
use regex::Regex;
use std::fmt;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

use crate::core::convert::FromValue;
use crate::core::error::ConfigError;
use crate::core::types::InputDevice;
use crate::core::value::Value;
use crate::core::variables::{VariableManager, VariableValue};

/// Runtime failures of condition evaluation
///
/// These never abort a handler; the trigger being evaluated simply does
/// not match.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EvaluationError {
    #[error("Condition is not available yet: {0}")]
    Unavailable(String),

    #[error("Cannot apply '{operator}' to variable '{variable}' of type {actual} with operand '{operand}'")]
    TypeMismatch {
        variable: String,
        operator: ComparisonOperator,
        actual: &'static str,
        operand: String,
    },

    #[error("Condition failed: {0}")]
    Failed(String),
}

/// Everything a condition may look at while being evaluated
pub struct ConditionContext<'a> {
    pub device: &'a InputDevice,
    pub variables: &'a VariableManager,
}

impl<'a> ConditionContext<'a> {
    pub fn new(device: &'a InputDevice, variables: &'a VariableManager) -> Self {
        Self { device, variables }
    }

    /// Look up a variable; `device_name` and `device_type` always exist
    pub fn variable(&self, name: &str) -> Option<VariableValue> {
        match name {
            "device_name" => Some(VariableValue::Text(self.device.name.clone())),
            "device_type" => Some(VariableValue::Text(self.device.device_type.to_string())),
            _ => self.variables.get(name),
        }
    }
}

/// Variables provided by the device itself rather than the host
pub const DEVICE_VARIABLES: [&str; 2] = ["device_name", "device_type"];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ComparisonOperator {
    EqualTo,
    NotEqualTo,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
    Matches,
}

impl ComparisonOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOperator::EqualTo => "==",
            ComparisonOperator::NotEqualTo => "!=",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterThanOrEqual => ">=",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessThanOrEqual => "<=",
            ComparisonOperator::Contains => "contains",
            ComparisonOperator::Matches => "matches",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let operator = match symbol {
            "==" => ComparisonOperator::EqualTo,
            "!=" => ComparisonOperator::NotEqualTo,
            ">" => ComparisonOperator::GreaterThan,
            ">=" => ComparisonOperator::GreaterThanOrEqual,
            "<" => ComparisonOperator::LessThan,
            "<=" => ComparisonOperator::LessThanOrEqual,
            "contains" => ComparisonOperator::Contains,
            "matches" => ComparisonOperator::Matches,
            _ => return None,
        };
        Some(operator)
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Comparison of one variable against a typed operand
#[derive(Clone, Debug)]
pub struct VariableCondition {
    variable: String,
    operator: ComparisonOperator,
    operand: VariableValue,
    pattern: Option<Regex>,
}

impl VariableCondition {
    pub fn new(variable: &str, operator: ComparisonOperator, operand: impl Into<VariableValue>) -> Self {
        Self {
            variable: variable.to_string(),
            operator,
            operand: operand.into(),
            pattern: None,
        }
    }

    /// Regex comparison; the pattern is compiled by the caller
    pub fn matching(variable: &str, pattern: Regex) -> Self {
        Self {
            variable: variable.to_string(),
            operator: ComparisonOperator::Matches,
            operand: VariableValue::Text(pattern.as_str().to_string()),
            pattern: Some(pattern),
        }
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn evaluate(&self, context: &ConditionContext) -> Result<bool, EvaluationError> {
        let current = context
            .variable(&self.variable)
            .ok_or_else(|| EvaluationError::Unavailable(format!("variable '{}' is not set", self.variable)))?;

        if let Some(pattern) = &self.pattern {
            return Ok(pattern.is_match(&current.to_string()));
        }

        use ComparisonOperator::*;
        use VariableValue::*;

        let result = match (&current, &self.operand, self.operator) {
            (Bool(left), Bool(right), EqualTo) => left == right,
            (Bool(left), Bool(right), NotEqualTo) => left != right,
            (Number(left), Number(right), EqualTo) => left == right,
            (Number(left), Number(right), NotEqualTo) => left != right,
            (Number(left), Number(right), GreaterThan) => left > right,
            (Number(left), Number(right), GreaterThanOrEqual) => left >= right,
            (Number(left), Number(right), LessThan) => left < right,
            (Number(left), Number(right), LessThanOrEqual) => left <= right,
            (Text(left), Text(right), EqualTo) => left == right,
            (Text(left), Text(right), NotEqualTo) => left != right,
            (Text(left), Text(right), Contains) => left.contains(right.as_str()),
            _ => {
                return Err(EvaluationError::TypeMismatch {
                    variable: self.variable.clone(),
                    operator: self.operator,
                    actual: current.type_name(),
                    operand: self.operand.to_string(),
                })
            }
        };

        Ok(result)
    }
}

pub type CustomPredicate = Arc<dyn Fn(&ConditionContext) -> Result<bool, EvaluationError> + Send + Sync>;

pub type ConditionBuilder = Arc<dyn Fn(&ConditionContext) -> Option<Condition> + Send + Sync>;

#[derive(Clone)]
pub enum Predicate {
    Variable(VariableCondition),
    Custom(CustomPredicate),
}

impl Predicate {
    pub fn evaluate(&self, context: &ConditionContext) -> Result<bool, EvaluationError> {
        match self {
            Predicate::Variable(condition) => condition.evaluate(context),
            Predicate::Custom(predicate) => predicate(context),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Variable(condition) => f.debug_tuple("Variable").field(condition).finish(),
            Predicate::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Condition built on first successful builder call, then cached
pub struct LazyCondition {
    builder: ConditionBuilder,
    cached: OnceLock<Condition>,
}

impl LazyCondition {
    pub fn new(builder: ConditionBuilder) -> Self {
        Self {
            builder,
            cached: OnceLock::new(),
        }
    }

    /// Whether the builder has succeeded
    pub fn is_built(&self) -> bool {
        self.cached.get().is_some()
    }

    pub fn evaluate(&self, context: &ConditionContext) -> Result<bool, EvaluationError> {
        if let Some(condition) = self.cached.get() {
            return condition.evaluate(context);
        }

        let built = (self.builder)(context)
            .ok_or_else(|| EvaluationError::Unavailable("lazy condition could not be built".to_string()))?;

        // Another handler may have won the race; its condition is the one kept
        self.cached.get_or_init(|| built).evaluate(context)
    }
}

impl fmt::Debug for LazyCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyCondition")
            .field("cached", &self.cached.get())
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub enum Condition {
    Leaf(Predicate),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
    Lazy(Arc<LazyCondition>),
}

impl Condition {
    /// Leaf running an arbitrary predicate
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&ConditionContext) -> Result<bool, EvaluationError> + Send + Sync + 'static,
    {
        Condition::Leaf(Predicate::Custom(Arc::new(predicate)))
    }

    pub fn lazy<F>(builder: F) -> Self
    where
        F: Fn(&ConditionContext) -> Option<Condition> + Send + Sync + 'static,
    {
        Condition::Lazy(Arc::new(LazyCondition::new(Arc::new(builder))))
    }

    pub fn variable(condition: VariableCondition) -> Self {
        Condition::Leaf(Predicate::Variable(condition))
    }

    pub fn negate(condition: Condition) -> Self {
        Condition::Not(Box::new(condition))
    }

    /// Evaluate against `context`
    ///
    /// `And` stops at the first `false` and `Or` at the first `true`.
    /// Errors met before stopping are returned as-is.
    pub fn evaluate(&self, context: &ConditionContext) -> Result<bool, EvaluationError> {
        match self {
            Condition::Leaf(predicate) => predicate.evaluate(context),
            Condition::And(children) => {
                for child in children {
                    if !child.evaluate(context)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Or(children) => {
                for child in children {
                    if child.evaluate(context)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Condition::Not(child) => Ok(!child.evaluate(context)?),
            Condition::Lazy(lazy) => lazy.evaluate(context),
        }
    }
}

/// A parsed `[!]<variable> [<operator> <operand>]` leaf
struct LeafSyntax<'a> {
    negated: bool,
    variable: &'a str,
    comparison: Option<(&'a str, &'a str)>,
}

fn leaf_syntax(input: &str) -> IResult<&str, LeafSyntax<'_>> {
    let (input, negated) = opt((char('!'), space0)).parse(input)?;
    let (input, variable) = take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)?;
    let (input, comparison) = opt((
        space0,
        alt((
            tag("=="),
            tag("!="),
            tag(">="),
            tag("<="),
            tag(">"),
            tag("<"),
            tag("contains"),
            tag("matches"),
        )),
        space0,
    ))
    .parse(input)?;

    let comparison = comparison.map(|(_, operator, _)| (operator, input));
    let rest = if comparison.is_some() { "" } else { input };

    Ok((
        rest,
        LeafSyntax {
            negated: negated.is_some(),
            variable,
            comparison,
        },
    ))
}

impl FromValue for Condition {
    /// Parses a comparison leaf such as `fingers >= 3` or `!fullscreen`
    ///
    /// Leaves on host variables are wrapped in a lazy node that binds the
    /// operand's type to the variable's runtime type once it exists.
    fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let text = value.as_scalar()?;
        let syntax = match leaf_syntax(text) {
            Ok(("", syntax)) => syntax,
            _ => {
                return Err(ConfigError::invalid_value(
                    value,
                    format!("Invalid condition '{}': expected '<variable> <operator> <value>'.", text),
                ))
            }
        };

        let variable = syntax.variable.to_string();
        let (operator, operand) = match syntax.comparison {
            Some((symbol, operand)) => {
                let operator = ComparisonOperator::from_symbol(symbol).ok_or_else(|| {
                    ConfigError::invalid_value(value, format!("Unknown operator '{}'.", symbol))
                })?;
                let operand = operand.trim();
                if operand.is_empty() {
                    return Err(ConfigError::invalid_value(
                        value,
                        format!("Missing value after '{}'.", symbol),
                    ));
                }
                (operator, Some(operand))
            }
            None => (ComparisonOperator::EqualTo, None),
        };

        let condition = if let (ComparisonOperator::Matches, Some(operand)) = (operator, operand) {
            let pattern = Regex::from_value(&value.subslice(operand)?)?;
            Condition::variable(VariableCondition::matching(&variable, pattern))
        } else {
            let operand = operand.unwrap_or("true").to_string();
            if DEVICE_VARIABLES.contains(&variable.as_str()) {
                Condition::variable(VariableCondition::new(&variable, operator, operand.as_str()))
            } else {
                Condition::lazy(move |context| {
                    let current = context.variable(&variable)?;
                    let typed = current
                        .parse_like(&operand)
                        .unwrap_or_else(|| VariableValue::Text(operand.clone()));
                    Some(Condition::variable(VariableCondition::new(&variable, operator, typed)))
                })
            }
        };

        Ok(if syntax.negated {
            Condition::negate(condition)
        } else {
            condition
        })
    }
}

/// Combine the `conditions`, `any_conditions` and `none_conditions` keys
///
/// Each key takes a list of leaves (a lone scalar counts as a list of one).
/// Present groups are ANDed; `None` when no key is present.
pub fn condition_from_groups(
    all: Option<&Value>,
    any: Option<&Value>,
    none: Option<&Value>,
) -> Result<Option<Condition>, ConfigError> {
    let mut groups = Vec::new();

    if let Some(value) = all {
        groups.push(Condition::And(leaves(value)?));
    }
    if let Some(value) = any {
        groups.push(Condition::Or(leaves(value)?));
    }
    if let Some(value) = none {
        groups.push(Condition::negate(Condition::Or(leaves(value)?)));
    }

    Ok(match groups.len() {
        0 => None,
        1 => groups.pop(),
        _ => Some(Condition::And(groups)),
    })
}

fn leaves(value: &Value) -> Result<Vec<Condition>, ConfigError> {
    value
        .items_or_self()
        .into_iter()
        .map(Condition::from_value)
        .collect()
}
