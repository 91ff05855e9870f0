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

//! When a trigger's actions run
//!
//! A trigger owns a list of `TriggerAction`s. Each one is bound to a point
//! of the gesture lifecycle:
//!
//! - **begin**: the trigger matched and became active
//! - **update**: every later step of the gesture, repeated per `interval`
//! - **end**: the gesture finished normally (fingers lifted)
//! - **cancel**: the gesture stopped matching (direction reversed, ...)
//! - **end_cancel**: either of the two above
//!
//! The effect itself is an `ActionGroup`: one or more actions with their
//! own conditions, run either all in order or only the first whose
//! condition holds.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::actions::Action;
use crate::core::condition::{Condition, ConditionContext};
use crate::core::convert::FromValue;
use crate::core::error::ConfigError;
use crate::core::value::Value;

/// Point of the gesture lifecycle an action is bound to
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ActionPoint {
    #[default]
    Begin,
    Update,
    End,
    Cancel,
    EndCancel,
}

impl ActionPoint {
    /// Whether an action bound to `self` runs when the gesture reaches `point`
    pub fn runs_at(self, point: ActionPoint) -> bool {
        match self {
            ActionPoint::EndCancel => matches!(point, ActionPoint::End | ActionPoint::Cancel),
            _ => self == point,
        }
    }
}

impl fmt::Display for ActionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionPoint::Begin => write!(f, "begin"),
            ActionPoint::Update => write!(f, "update"),
            ActionPoint::End => write!(f, "end"),
            ActionPoint::Cancel => write!(f, "cancel"),
            ActionPoint::EndCancel => write!(f, "end_cancel"),
        }
    }
}

impl FromValue for ActionPoint {
    fn from_value(value: &Value) -> Result<Self, ConfigError> {
        match value.as_scalar()? {
            "begin" => Ok(ActionPoint::Begin),
            "update" => Ok(ActionPoint::Update),
            "end" => Ok(ActionPoint::End),
            "cancel" => Ok(ActionPoint::Cancel),
            "end_cancel" => Ok(ActionPoint::EndCancel),
            other => Err(ConfigError::invalid_value(
                value,
                format!(
                    "Unknown action point '{}' (expected begin, update, end, cancel or end_cancel).",
                    other
                ),
            )),
        }
    }
}

/// Sign an update delta must have for an update action to count it
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum IntervalDirection {
    #[default]
    Any,
    Positive,
    Negative,
}

/// How often an update action repeats
///
/// A zero interval runs once per update whose delta has the right sign.
/// A non-zero interval runs once every time the accumulated delta grows
/// by `value` in its direction; reversing resets the accumulation.
///
/// # Example
/// ```
/// use gesture_actions::actions::ActionInterval;
///
/// let interval = ActionInterval::new(10.0);
/// let mut accumulated = 0.0;
/// assert_eq!(interval.advance(&mut accumulated, 25.0), 2);
/// assert_eq!(interval.advance(&mut accumulated, 5.0), 1);
/// assert_eq!(interval.advance(&mut accumulated, -30.0), 0);
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ActionInterval {
    value: f64,
    direction: IntervalDirection,
}

impl ActionInterval {
    /// Signed interval; the sign picks the direction, zero means every update
    pub fn new(value: f64) -> Self {
        let direction = if value > 0.0 {
            IntervalDirection::Positive
        } else if value < 0.0 {
            IntervalDirection::Negative
        } else {
            IntervalDirection::Any
        };
        Self {
            value: value.abs(),
            direction,
        }
    }

    /// Every update in `direction`
    pub fn every(direction: IntervalDirection) -> Self {
        Self {
            value: 0.0,
            direction,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn direction(&self) -> IntervalDirection {
        self.direction
    }

    /// Whether `delta` has the sign this interval counts
    pub fn matches(&self, delta: f64) -> bool {
        match self.direction {
            IntervalDirection::Any => true,
            IntervalDirection::Positive => delta > 0.0,
            IntervalDirection::Negative => delta < 0.0,
        }
    }

    /// Fold one update delta into `accumulated`; returns how many times to run
    pub fn advance(&self, accumulated: &mut f64, delta: f64) -> usize {
        if delta == 0.0 {
            return 0;
        }

        if accumulated.is_sign_negative() != delta.is_sign_negative() {
            *accumulated = delta;
        } else {
            *accumulated += delta;
        }

        if self.value == 0.0 {
            return usize::from(self.matches(delta));
        }

        let mut runs = 0;
        while self.matches(*accumulated) && accumulated.abs() >= self.value {
            runs += 1;
            *accumulated -= self.value.copysign(*accumulated);
        }
        runs
    }
}

impl fmt::Display for ActionInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.direction, self.value == 0.0) {
            (IntervalDirection::Any, _) => write!(f, "0"),
            (IntervalDirection::Positive, true) => write!(f, "+"),
            (IntervalDirection::Negative, true) => write!(f, "-"),
            (IntervalDirection::Positive, false) => write!(f, "{}", self.value),
            (IntervalDirection::Negative, false) => write!(f, "-{}", self.value),
        }
    }
}

impl FromValue for ActionInterval {
    /// `+`, `-` or a signed number
    fn from_value(value: &Value) -> Result<Self, ConfigError> {
        match value.as_scalar()? {
            "+" => Ok(Self::every(IntervalDirection::Positive)),
            "-" => Ok(Self::every(IntervalDirection::Negative)),
            _ => f64::from_value(value).map(Self::new),
        }
    }
}

/// Which members of a group run
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum GroupMode {
    /// Every member whose condition holds, in order
    #[default]
    All,
    /// Only the first member whose condition holds
    One,
}

impl FromValue for GroupMode {
    fn from_value(value: &Value) -> Result<Self, ConfigError> {
        match value.as_scalar()? {
            "all" => Ok(GroupMode::All),
            "one" => Ok(GroupMode::One),
            other => Err(ConfigError::invalid_value(
                value,
                format!("Unknown group mode '{}' (expected all or one).", other),
            )),
        }
    }
}

/// One member of an action group
#[derive(Clone, Debug)]
pub struct ActionItem {
    pub condition: Option<Condition>,
    pub action: Action,
}

impl ActionItem {
    pub fn new(action: Action) -> Self {
        Self {
            condition: None,
            action,
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// Actions run together at one lifecycle point
#[derive(Clone, Debug)]
pub struct ActionGroup {
    pub mode: GroupMode,
    pub items: Vec<ActionItem>,
}

impl ActionGroup {
    pub fn new(mode: GroupMode, items: Vec<ActionItem>) -> Self {
        Self { mode, items }
    }

    /// Group of one unconditional action
    pub fn single(action: Action) -> Self {
        Self::new(GroupMode::All, vec![ActionItem::new(action)])
    }

    /// Actions to run now, in order
    pub fn select(&self, context: &ConditionContext) -> Vec<Action> {
        let mut eligible = self
            .items
            .iter()
            .filter(|item| condition_holds(item.condition.as_ref(), context))
            .map(|item| item.action.clone());

        match self.mode {
            GroupMode::All => eligible.collect(),
            GroupMode::One => eligible.next().into_iter().collect(),
        }
    }
}

impl fmt::Display for ActionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [item] = self.items.as_slice() {
            return write!(f, "{}", item.action);
        }

        let mode = match self.mode {
            GroupMode::All => "all",
            GroupMode::One => "one",
        };
        let items: Vec<String> = self.items.iter().map(|item| item.action.to_string()).collect();
        write!(f, "{} of [{}]", mode, items.join("; "))
    }
}

/// An action group bound to a lifecycle point of its trigger
#[derive(Clone, Debug)]
pub struct TriggerAction {
    pub on: ActionPoint,
    /// Repetition of update actions; ignored at other points
    pub interval: ActionInterval,
    pub condition: Option<Condition>,
    pub group: ActionGroup,
}

impl TriggerAction {
    pub fn new(on: ActionPoint, group: ActionGroup) -> Self {
        Self {
            on,
            interval: ActionInterval::default(),
            condition: None,
            group,
        }
    }

    /// A single action run when the trigger begins
    pub fn on_begin(action: Action) -> Self {
        Self::new(ActionPoint::Begin, ActionGroup::single(action))
    }

    pub fn with_interval(mut self, interval: ActionInterval) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Actions to run now; empty if this action's own condition fails
    pub fn resolve(&self, context: &ConditionContext) -> Vec<Action> {
        if !condition_holds(self.condition.as_ref(), context) {
            return Vec::new();
        }
        self.group.select(context)
    }
}

impl fmt::Display for TriggerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "on {}", self.on)?;
        if self.on == ActionPoint::Update && self.interval != ActionInterval::default() {
            write!(f, " every {}", self.interval)?;
        }
        write!(f, ": {}", self.group)
    }
}

/// Evaluation errors count as "does not hold"
fn condition_holds(condition: Option<&Condition>, context: &ConditionContext) -> bool {
    let Some(condition) = condition else {
        return true;
    };
    match condition.evaluate(context) {
        Ok(satisfied) => satisfied,
        Err(e) => {
            warn!(error = %e, "action condition evaluation failed, skipping action");
            false
        }
    }
}
