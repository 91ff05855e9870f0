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

//! src/core/types.rs
//!
//! Core type definitions for gesture classification
//!
//! This module defines the fundamental types used throughout the crate:
//! - `TriggerType`: Bitmask of gesture categories (pinch, swipe, ...)
//! - `TriggerSpeed`: Velocity tier of a performed gesture
//! - `TriggerDirection`: Direction of a swipe, scroll, pinch or rotation
//! - `Range`: Closed interval used to gate gesture magnitudes
//! - `InputDevice`: Identity of the device a gesture is performed on
//! - `MotionDelta`: A single motion sample delivered by a device
//!
//! None of these types perform I/O; they are plain values shared by the
//! configuration layer and the trigger handlers.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Gesture categories a trigger can react to
    ///
    /// A runtime classification always produces exactly one flag. A trigger
    /// definition carries a mask and matches when the classified flag is a
    /// subset of it, so compound masks like `PINCH_ROTATE` match either.
    #[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
    pub struct TriggerType: u32 {
        /// Two fingers moving towards or away from each other
        const PINCH = 1 << 0;
        /// Fingers resting on the surface without moving
        const PRESS = 1 << 1;
        /// Two fingers rotating around their centre
        const ROTATE = 1 << 2;
        /// Free-form pointer path (mouse gestures)
        const STROKE = 1 << 3;
        /// Straight multi-finger motion along one axis
        const SWIPE = 1 << 4;
        /// Scroll wheel or two-finger scroll
        const WHEEL = 1 << 5;

        const PINCH_ROTATE = Self::PINCH.bits() | Self::ROTATE.bits();
        const STROKE_SWIPE = Self::STROKE.bits() | Self::SWIPE.bits();
    }
}

impl TriggerType {
    /// No gesture category
    pub const NONE: Self = Self::empty();
    /// Every gesture category
    pub const ALL: Self = Self::all();

    /// Single-flag categories with their configuration names
    pub const SINGLE: [(TriggerType, &'static str); 6] = [
        (Self::PINCH, "pinch"),
        (Self::PRESS, "press"),
        (Self::ROTATE, "rotate"),
        (Self::STROKE, "stroke"),
        (Self::SWIPE, "swipe"),
        (Self::WHEEL, "wheel"),
    ];

    /// Looks up a configuration name (`swipe`, `pinch_rotate`, `all`, ...)
    pub fn from_config_name(name: &str) -> Option<Self> {
        let value = match name {
            "pinch" => Self::PINCH,
            "press" | "hold" => Self::PRESS,
            "rotate" => Self::ROTATE,
            "stroke" => Self::STROKE,
            "swipe" => Self::SWIPE,
            "wheel" => Self::WHEEL,
            "pinch_rotate" => Self::PINCH_ROTATE,
            "stroke_swipe" => Self::STROKE_SWIPE,
            "all" => Self::ALL,
            "none" => Self::NONE,
            _ => return None,
        };
        Some(value)
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        if *self == Self::ALL {
            return write!(f, "all");
        }

        let names = Self::SINGLE
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect::<Vec<_>>()
            .join("|");
        write!(f, "{}", names)
    }
}

/// Velocity tier of a gesture
///
/// `Any` is only meaningful on a trigger definition; runtime classification
/// always yields `Slow` or `Fast`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum TriggerSpeed {
    /// Matches every classified speed
    #[default]
    Any,
    /// Average per-event magnitude below the device threshold
    Slow,
    /// Average per-event magnitude at or above the device threshold
    Fast,
}

impl TriggerSpeed {
    /// Whether a definition with this speed accepts the classified speed
    pub fn matches(self, classified: TriggerSpeed) -> bool {
        self == TriggerSpeed::Any || self == classified
    }
}

impl fmt::Display for TriggerSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerSpeed::Any => write!(f, "any"),
            TriggerSpeed::Slow => write!(f, "slow"),
            TriggerSpeed::Fast => write!(f, "fast"),
        }
    }
}

/// Direction of a gesture
///
/// Runtime classification yields a single direction (`Left`, `In`,
/// `Clockwise`, ...). Definitions may also use `Any` and the two-way
/// `LeftRight`/`UpDown`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum TriggerDirection {
    #[default]
    Any,
    Left,
    Right,
    Up,
    Down,
    LeftRight,
    UpDown,
    /// Pinch with the fingers moving together
    In,
    /// Pinch with the fingers moving apart
    Out,
    Clockwise,
    Counterclockwise,
}

impl TriggerDirection {
    /// Every direction with its configuration name
    pub const NAMED: [(TriggerDirection, &'static str); 11] = [
        (Self::Any, "any"),
        (Self::Left, "left"),
        (Self::Right, "right"),
        (Self::Up, "up"),
        (Self::Down, "down"),
        (Self::LeftRight, "left_right"),
        (Self::UpDown, "up_down"),
        (Self::In, "in"),
        (Self::Out, "out"),
        (Self::Clockwise, "clockwise"),
        (Self::Counterclockwise, "counterclockwise"),
    ];

    pub fn from_config_name(name: &str) -> Option<Self> {
        Self::NAMED
            .iter()
            .find(|(_, candidate)| *candidate == name)
            .map(|(direction, _)| *direction)
    }

    /// Whether a definition with this direction accepts the classified one
    ///
    /// An undecided direction (`None`) is only accepted by `Any`.
    pub fn matches(self, classified: Option<TriggerDirection>) -> bool {
        use TriggerDirection::*;

        let Some(classified) = classified else {
            return self == Any;
        };
        match self {
            Any => true,
            LeftRight => matches!(classified, Left | Right),
            UpDown => matches!(classified, Up | Down),
            _ => self == classified,
        }
    }

    /// Sign `delta` so that motion in this direction counts as positive
    ///
    /// Two-way directions keep the raw sign: right, down, out and clockwise
    /// are positive.
    pub fn orient(self, delta: f64) -> f64 {
        use TriggerDirection::*;

        match self {
            Left | Up | In | Counterclockwise => -delta,
            _ => delta,
        }
    }

    /// Gesture types this direction can be classified for
    pub fn trigger_types(self) -> TriggerType {
        use TriggerDirection::*;

        match self {
            Any => TriggerType::ALL,
            Left | Right | Up | Down | LeftRight | UpDown => TriggerType::SWIPE | TriggerType::WHEEL,
            In | Out => TriggerType::PINCH,
            Clockwise | Counterclockwise => TriggerType::ROTATE,
        }
    }
}

impl fmt::Display for TriggerDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = Self::NAMED
            .iter()
            .find(|(direction, _)| direction == self)
            .map_or("any", |(_, name)| *name);
        write!(f, "{}", name)
    }
}

/// A closed interval `[min, max]`
///
/// # Example
/// ```
/// use gesture_actions::core::Range;
///
/// let range = Range::new(10.0, 20.0);
/// assert!(range.contains(10.0));
/// assert!(range.contains(20.0));
/// assert!(!range.contains(20.1));
/// ```
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Range<T> {
    min: T,
    max: T,
}

impl<T: PartialOrd + Copy> Range<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn min(&self) -> T {
        self.min
    }

    pub fn max(&self) -> T {
        self.max
    }

    /// True iff `min <= value <= max`
    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }
}

impl Range<f64> {
    /// Interval with no upper bound
    pub fn at_least(min: f64) -> Self {
        Self {
            min,
            max: f64::INFINITY,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Range<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Kind of physical device a handler is attached to
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum InputDeviceType {
    Touchpad,
    Mouse,
    Touchscreen,
}

impl fmt::Display for InputDeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputDeviceType::Touchpad => write!(f, "touchpad"),
            InputDeviceType::Mouse => write!(f, "mouse"),
            InputDeviceType::Touchscreen => write!(f, "touchscreen"),
        }
    }
}

/// An input device as seen by the trigger handlers
///
/// The device is owned by the input backend; handlers only read its
/// identity for routing and condition evaluation.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct InputDevice {
    /// Device name as reported by the backend, used as its identity
    pub name: String,
    pub device_type: InputDeviceType,
}

impl InputDevice {
    pub fn new(name: &str, device_type: InputDeviceType) -> Self {
        Self {
            name: name.to_string(),
            device_type,
        }
    }
}

/// One motion sample delivered by a device
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MotionDelta {
    /// Finger or pointer displacement
    Pointer { dx: f64, dy: f64 },
    /// Absolute scale since the gesture began and rotation delta in degrees
    Pinch { scale: f64, angle: f64 },
    /// Scroll displacement
    Wheel { dx: f64, dy: f64 },
    /// Time spent holding without motion since the previous sample
    Hold { elapsed_ms: f64 },
}

impl MotionDelta {
    /// Euclidean length of the displacement carried by this sample
    pub fn hypot(&self) -> f64 {
        match *self {
            MotionDelta::Pointer { dx, dy } | MotionDelta::Wheel { dx, dy } => dx.hypot(dy),
            MotionDelta::Pinch { angle, .. } => angle.abs(),
            MotionDelta::Hold { elapsed_ms } => elapsed_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound_aliases() {
        assert_eq!(TriggerType::PINCH_ROTATE, TriggerType::PINCH | TriggerType::ROTATE);
        assert_eq!(TriggerType::STROKE_SWIPE, TriggerType::STROKE | TriggerType::SWIPE);
    }

    #[test]
    fn test_trigger_type_display() {
        assert_eq!(format!("{}", TriggerType::SWIPE), "swipe");
        assert_eq!(format!("{}", TriggerType::PINCH_ROTATE), "pinch|rotate");
        assert_eq!(format!("{}", TriggerType::ALL), "all");
        assert_eq!(format!("{}", TriggerType::NONE), "none");
    }

    #[test]
    fn test_delta_hypot() {
        let delta = MotionDelta::Pointer { dx: 3.0, dy: 4.0 };
        assert_eq!(delta.hypot(), 5.0);
    }
}
