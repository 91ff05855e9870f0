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

//! src/handlers/mod.rs
//!
//! Trigger handlers: from motion deltas to dispatched actions
//!
//! A `TriggerHandler` belongs to exactly one input device. For every delta
//! it updates the gesture in progress, asks its `GestureClassifier` what
//! the gesture looks like so far, and begins the first definition whose
//! type, direction, speed, magnitude range and condition all match.
//!
//! # Gesture lifecycle
//! 1. Deltas accumulate into `GestureState`
//! 2. While a candidate definition needs a direction the classifier has
//!    not decided yet, events are consumed without matching
//! 3. If a candidate cares about speed, the first `speed_samples` events
//!    only sample speed
//! 4. Definitions are tried in registration order; the first match begins
//!    and runs its begin actions
//! 5. A definition with update, end or cancel actions stays active and
//!    receives every later delta; one that stops matching is cancelled
//! 6. `end_gesture()` (fingers lifted), a discrete event (wheel click) or
//!    the classifier's sample limit ends the gesture and resets the state
//!
//! Once the matched definition has nothing left to run, the rest of the
//! gesture is passed through unconsumed.
//!
//! Device-specific behaviour lives in the classifiers (`touchpad`,
//! `mouse`); matching and dispatch are shared.

pub mod manager;
pub mod mouse;
pub mod touchpad;

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use crate::actions::{Action, ActionExecutor, ActionPoint, TriggerAction};
use crate::core::condition::{Condition, ConditionContext};
use crate::core::types::{
    InputDevice, InputDeviceType, MotionDelta, Range, TriggerDirection, TriggerSpeed, TriggerType,
};
use crate::core::variables::VariableManager;

pub use manager::HandlerManager;
pub use mouse::MouseClassifier;
pub use touchpad::TouchpadClassifier;

/// A configured rule: gesture classification plus condition, bound to actions
#[derive(Clone, Debug)]
pub struct TriggerDefinition {
    /// Optional identifier used in logs
    pub id: Option<String>,
    /// Device class the rule applies to; `None` means every device
    pub device: Option<InputDeviceType>,
    pub trigger_type: TriggerType,
    pub direction: TriggerDirection,
    pub speed: TriggerSpeed,
    /// Magnitude the gesture must have reached; `None` accepts any
    pub threshold: Option<Range<f64>>,
    pub condition: Option<Condition>,
    /// Run in order at their lifecycle points
    pub actions: Vec<TriggerAction>,
}

impl TriggerDefinition {
    /// Rule running a single action when it begins
    pub fn new(trigger_type: TriggerType, action: Action) -> Self {
        Self::from_actions(trigger_type, vec![TriggerAction::on_begin(action)])
    }

    pub fn from_actions(trigger_type: TriggerType, actions: Vec<TriggerAction>) -> Self {
        Self {
            id: None,
            device: None,
            trigger_type,
            direction: TriggerDirection::Any,
            speed: TriggerSpeed::Any,
            threshold: None,
            condition: None,
            actions,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_device(mut self, device: InputDeviceType) -> Self {
        self.device = Some(device);
        self
    }

    pub fn with_direction(mut self, direction: TriggerDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_speed(mut self, speed: TriggerSpeed) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_threshold(mut self, threshold: Range<f64>) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_action(mut self, action: TriggerAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Whether this rule should be loaded into a handler for `device_type`
    pub fn applies_to(&self, device_type: InputDeviceType) -> bool {
        self.device.is_none_or(|device| device == device_type)
    }

    /// Whether anything runs after the begin actions
    pub fn outlives_begin(&self) -> bool {
        self.actions.iter().any(|action| action.on != ActionPoint::Begin)
    }

    /// Whether the rule reacts to updates, which keeps discrete gestures open
    pub fn is_continuous(&self) -> bool {
        self.actions.iter().any(|action| action.on == ActionPoint::Update)
    }

    fn label(&self, index: usize) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("#{}", index + 1),
        }
    }
}

impl fmt::Display for TriggerDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.trigger_type)?;
        if self.direction != TriggerDirection::Any {
            write!(f, " {}", self.direction)?;
        }
        write!(f, " (speed: {}", self.speed)?;
        if let Some(threshold) = &self.threshold {
            write!(f, ", threshold: {}", threshold)?;
        }
        if self.condition.is_some() {
            write!(f, ", conditional")?;
        }
        write!(f, ") -> ")?;

        match self.actions.as_slice() {
            [action] if action.on == ActionPoint::Begin && action.condition.is_none() => {
                write!(f, "{}", action.group)
            }
            actions => {
                let actions: Vec<String> = actions.iter().map(ToString::to_string).collect();
                write!(f, "{}", actions.join(", "))
            }
        }
    }
}

/// Where a gesture stands relative to the definitions
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum GesturePhase {
    /// No definition has matched yet
    #[default]
    Pending,
    /// The definition at this index began and still has actions to run
    Active(usize),
    /// The matched definition is finished; the rest is passed through
    Done,
}

/// Motion accumulated since the gesture began
#[derive(Clone, Debug, PartialEq)]
pub struct GestureState {
    /// Deltas received, including ones no classifier recognized
    pub samples: usize,
    /// Summed pointer displacement
    pub dx: f64,
    pub dy: f64,
    /// Summed pointer path length
    pub path_length: f64,
    /// Latest absolute pinch scale (1.0 = unchanged)
    pub scale: f64,
    /// Signed scale change carried by the latest pinch delta
    pub scale_delta: f64,
    /// Summed rotation in degrees
    pub angle: f64,
    /// Summed scroll displacement
    pub wheel_dx: f64,
    pub wheel_dy: f64,
    /// Total hold time in milliseconds
    pub hold_ms: f64,
    pub phase: GesturePhase,

    speed: Option<TriggerSpeed>,
    speed_samples: usize,
    speed_total: f64,
    /// Made of discrete events (wheel clicks) rather than continuous motion
    discrete: bool,
    /// Accumulated update delta per action of the active definition
    progress: Vec<f64>,
}

impl Default for GestureState {
    fn default() -> Self {
        Self {
            samples: 0,
            dx: 0.0,
            dy: 0.0,
            path_length: 0.0,
            scale: 1.0,
            scale_delta: 0.0,
            angle: 0.0,
            wheel_dx: 0.0,
            wheel_dy: 0.0,
            hold_ms: 0.0,
            phase: GesturePhase::Pending,
            speed: None,
            speed_samples: 0,
            speed_total: 0.0,
            discrete: false,
            progress: Vec::new(),
        }
    }
}

impl GestureState {
    /// Fold one delta into the accumulated gesture
    pub fn accumulate(&mut self, delta: &MotionDelta) {
        self.samples += 1;
        match *delta {
            MotionDelta::Pointer { dx, dy } => {
                self.dx += dx;
                self.dy += dy;
                self.path_length += delta.hypot();
            }
            MotionDelta::Pinch { scale, angle } => {
                self.scale_delta = scale - self.scale;
                self.scale = scale;
                self.angle += angle;
            }
            MotionDelta::Wheel { dx, dy } => {
                self.wheel_dx += dx;
                self.wheel_dy += dy;
            }
            MotionDelta::Hold { elapsed_ms } => {
                self.hold_ms += elapsed_ms;
            }
        }
    }

    /// Speed decided for this gesture, if sampling has finished
    pub fn speed(&self) -> Option<TriggerSpeed> {
        self.speed
    }
}

/// What the gesture in progress looks like after the latest delta
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classification {
    /// Exactly one flag
    pub trigger_type: TriggerType,
    /// `None` while the classifier cannot tell yet, and for gestures
    /// without a direction
    pub direction: Option<TriggerDirection>,
    /// Gesture size so far, in the unit of the type
    pub magnitude: f64,
    /// Size of the latest delta alone, used for speed sampling
    pub event_magnitude: f64,
    /// Signed progress made by the latest delta, fed to update actions
    pub delta: f64,
}

/// Device-class strategy turning accumulated motion into a classification
pub trait GestureClassifier: Send + Sync {
    /// Classify the gesture after `delta` has been accumulated into `state`
    ///
    /// `None` means this device class does not produce gestures from
    /// `delta`, and the event is left for the caller.
    fn classify(&self, state: &GestureState, delta: &MotionDelta) -> Option<Classification>;

    /// Average per-event magnitude separating slow from fast
    ///
    /// `None` if the type has no threshold; such gestures count as fast.
    fn speed_threshold(&self, classification: &Classification) -> Option<f64>;

    /// Whether `delta` is a gesture on its own rather than part of a motion
    ///
    /// A discrete event begins, updates and ends its gesture immediately,
    /// unless the matched definition is continuous.
    fn is_discrete(&self, _delta: &MotionDelta) -> bool {
        false
    }

    /// Events sampled before the speed is decided
    fn speed_samples(&self) -> usize {
        3
    }

    /// Events after which any gesture is ended and the state reset
    fn max_samples(&self) -> usize {
        500
    }
}

/// Per-device state machine from deltas to dispatched actions
pub struct TriggerHandler {
    device: Arc<InputDevice>,
    definitions: Vec<TriggerDefinition>,
    classifier: Box<dyn GestureClassifier>,
    executor: Arc<dyn ActionExecutor>,
    variables: Arc<VariableManager>,
    state: GestureState,
}

impl TriggerHandler {
    pub fn new(
        device: Arc<InputDevice>,
        classifier: Box<dyn GestureClassifier>,
        executor: Arc<dyn ActionExecutor>,
        variables: Arc<VariableManager>,
    ) -> Self {
        Self {
            device,
            definitions: Vec::new(),
            classifier,
            executor,
            variables,
            state: GestureState::default(),
        }
    }

    pub fn device(&self) -> &InputDevice {
        &self.device
    }

    pub fn definitions(&self) -> &[TriggerDefinition] {
        &self.definitions
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// Swap the whole definition set, cancelling any gesture in progress
    pub fn replace_triggers(&mut self, definitions: Vec<TriggerDefinition>) {
        debug!(
            device = %self.device.name,
            count = definitions.len(),
            "replacing trigger definitions"
        );
        self.finish(ActionPoint::Cancel);
        self.definitions = definitions;
    }

    /// The gesture is over (fingers lifted, button released)
    pub fn end_gesture(&mut self) {
        trace!(device = %self.device.name, samples = self.state.samples, "gesture ended");
        self.finish(ActionPoint::End);
    }

    /// The gesture was interrupted (device removed, ...)
    pub fn cancel_gesture(&mut self) {
        trace!(device = %self.device.name, samples = self.state.samples, "gesture cancelled");
        self.finish(ActionPoint::Cancel);
    }

    /// Process one delta; returns true if the event was consumed
    ///
    /// An event is consumed when it advanced a gesture that some definition
    /// could still match, when it began a definition, or when it updated
    /// the active one.
    pub fn handle_motion(&mut self, device: &InputDevice, delta: MotionDelta) -> bool {
        if device.name != self.device.name {
            return false;
        }

        // Wheel clicks and continuous motion never share a gesture
        let discrete = self.classifier.is_discrete(&delta);
        if self.state.samples > 0 && self.state.discrete != discrete {
            self.finish(ActionPoint::End);
        }
        self.state.discrete = discrete;
        self.state.accumulate(&delta);

        let consumed = match self.classifier.classify(&self.state, &delta) {
            Some(classification) => match self.state.phase {
                GesturePhase::Pending => self.try_begin(&classification),
                GesturePhase::Active(index) => self.update_active(index, &classification),
                GesturePhase::Done => false,
            },
            None => false,
        };

        let stays_open = match self.state.phase {
            GesturePhase::Active(index) => self
                .definitions
                .get(index)
                .is_some_and(TriggerDefinition::is_continuous),
            _ => false,
        };
        if discrete && !stays_open {
            self.finish(ActionPoint::End);
        } else {
            self.check_lifetime();
        }

        consumed
    }

    fn try_begin(&mut self, classification: &Classification) -> bool {
        let (mut has_candidates, mut needs_speed, mut needs_direction) = (false, false, false);
        for definition in self
            .definitions
            .iter()
            .filter(|definition| definition.trigger_type.contains(classification.trigger_type))
        {
            has_candidates = true;
            needs_speed |= definition.speed != TriggerSpeed::Any;
            needs_direction |= definition.direction != TriggerDirection::Any;
        }
        if !has_candidates {
            return false;
        }

        if needs_direction && classification.direction.is_none() {
            trace!(gesture = %classification.trigger_type, "direction not decided yet");
            return true;
        }

        if needs_speed && self.state.speed.is_none() && !self.sample_speed(classification) {
            return true;
        }

        let matched = (0..self.definitions.len())
            .find(|&index| self.matches(index, &self.definitions[index], classification));
        if let Some(index) = matched {
            self.begin(index, classification);
        }
        true
    }

    /// Feed one event to the speed sampler; true once the speed is decided
    ///
    /// A discrete event is its own sample and decides at once.
    fn sample_speed(&mut self, classification: &Classification) -> bool {
        let Some(threshold) = self.classifier.speed_threshold(classification) else {
            warn!(
                gesture = %classification.trigger_type,
                "no speed threshold for gesture, assuming fast speed"
            );
            self.state.speed = Some(TriggerSpeed::Fast);
            return true;
        };

        let average = if self.state.discrete {
            classification.event_magnitude.abs()
        } else {
            let samples = self.classifier.speed_samples().max(1);
            if self.state.speed_samples < samples {
                self.state.speed_samples += 1;
                self.state.speed_total += classification.event_magnitude.abs();
                trace!(
                    event = self.state.speed_samples,
                    of = samples,
                    total = self.state.speed_total,
                    threshold,
                    "determining speed"
                );
                return false;
            }
            self.state.speed_total / samples as f64
        };

        let speed = if average >= threshold {
            TriggerSpeed::Fast
        } else {
            TriggerSpeed::Slow
        };
        debug!(%speed, average, threshold, "speed determined");
        self.state.speed = Some(speed);
        true
    }

    fn matches(&self, index: usize, definition: &TriggerDefinition, classification: &Classification) -> bool {
        if !definition.trigger_type.contains(classification.trigger_type)
            || !definition.direction.matches(classification.direction)
        {
            return false;
        }

        if definition.speed != TriggerSpeed::Any
            && !self.state.speed.is_some_and(|speed| definition.speed.matches(speed))
        {
            return false;
        }

        if let Some(threshold) = &definition.threshold {
            if !threshold.contains(classification.magnitude) {
                return false;
            }
        }

        let Some(condition) = &definition.condition else {
            return true;
        };

        let context = ConditionContext::new(&self.device, &self.variables);
        match condition.evaluate(&context) {
            Ok(satisfied) => satisfied,
            Err(e) => {
                warn!(
                    trigger = %definition.label(index),
                    error = %e,
                    "condition evaluation failed, treating as no match"
                );
                false
            }
        }
    }

    fn begin(&mut self, index: usize, classification: &Classification) {
        let Some(definition) = self.definitions.get(index) else {
            return;
        };
        info!(
            trigger = %definition.label(index),
            device = %self.device.name,
            gesture = %classification.trigger_type,
            direction = ?classification.direction,
            magnitude = classification.magnitude,
            "trigger began"
        );

        self.state.progress = vec![0.0; definition.actions.len()];
        self.state.phase = if definition.outlives_begin() {
            GesturePhase::Active(index)
        } else {
            GesturePhase::Done
        };

        self.run(index, ActionPoint::Begin);
        self.update(index, classification.delta);
    }

    fn update_active(&mut self, index: usize, classification: &Classification) -> bool {
        let Some(definition) = self.definitions.get(index) else {
            self.state.phase = GesturePhase::Done;
            return false;
        };

        if !definition.trigger_type.contains(classification.trigger_type)
            || !definition.direction.matches(classification.direction)
        {
            debug!(
                trigger = %definition.label(index),
                gesture = %classification.trigger_type,
                direction = ?classification.direction,
                "gesture no longer matches, cancelling trigger"
            );
            self.run(index, ActionPoint::Cancel);
            self.state.phase = GesturePhase::Done;
            return false;
        }

        self.update(index, classification.delta);
        true
    }

    /// Run the update actions of the definition at `index` for one delta
    fn update(&mut self, index: usize, delta: f64) {
        let Some(definition) = self.definitions.get(index) else {
            return;
        };
        let delta = definition.direction.orient(delta);
        let context = ConditionContext::new(&self.device, &self.variables);
        let label = definition.label(index);

        for (slot, action) in definition.actions.iter().enumerate() {
            if action.on != ActionPoint::Update {
                continue;
            }
            let Some(accumulated) = self.state.progress.get_mut(slot) else {
                continue;
            };
            for _ in 0..action.interval.advance(accumulated, delta) {
                dispatch(self.executor.as_ref(), &label, action, &context);
            }
        }
    }

    fn run(&self, index: usize, point: ActionPoint) {
        let Some(definition) = self.definitions.get(index) else {
            return;
        };
        let context = ConditionContext::new(&self.device, &self.variables);
        let label = definition.label(index);

        for action in definition.actions.iter().filter(|action| action.on.runs_at(point)) {
            dispatch(self.executor.as_ref(), &label, action, &context);
        }
    }

    /// Run `point` actions of the active definition, if any, then reset
    fn finish(&mut self, point: ActionPoint) {
        if let GesturePhase::Active(index) = self.state.phase {
            debug!(device = %self.device.name, %point, "trigger finished");
            self.run(index, point);
        }
        self.state = GestureState::default();
    }

    fn check_lifetime(&mut self) {
        if self.state.samples >= self.classifier.max_samples() {
            debug!(
                device = %self.device.name,
                samples = self.state.samples,
                phase = ?self.state.phase,
                "gesture reached its sample limit, ending"
            );
            self.finish(ActionPoint::End);
        }
    }
}

fn dispatch(
    executor: &dyn ActionExecutor,
    label: &str,
    action: &TriggerAction,
    context: &ConditionContext,
) {
    let actions = action.resolve(context);
    if actions.is_empty() {
        return;
    }

    debug!(trigger = label, on = %action.on, count = actions.len(), "running actions");
    if let Err(e) = executor.execute_all(&actions) {
        warn!(trigger = label, error = %e, "failed to execute action");
    }
}

impl fmt::Debug for TriggerHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerHandler")
            .field("device", &self.device)
            .field("definitions", &self.definitions.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
