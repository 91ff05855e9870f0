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

//! Touchpad and touchscreen gesture classification
//!
//! - Finger motion is a swipe; its magnitude is the displacement along the
//!   dominant axis, and its direction is decided once two deltas are in
//! - Pinch events are a pinch or a rotation, whichever dominates: a scale
//!   change of 0.1 weighs as much as 10 degrees of rotation
//! - Pinching in or out and rotating either way each have a direction
//! - Holding still is a press; its magnitude is the time held

use crate::core::types::{MotionDelta, TriggerDirection, TriggerType};
use crate::handlers::{Classification, GestureClassifier, GestureState};

/// Scale change (times 100) compared against degrees of rotation
const PINCH_ROTATE_WEIGHT: f64 = 100.0;

/// Deltas needed before a swipe direction is trusted
const SWIPE_DIRECTION_SAMPLES: usize = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct TouchpadClassifier {
    /// Average per-event displacement separating slow and fast swipes
    pub swipe_speed: f64,
    /// Average per-event rotation in degrees
    pub rotate_speed: f64,
    /// Average per-event scale change when pinching in
    pub pinch_in_speed: f64,
    /// Average per-event scale change when pinching out
    pub pinch_out_speed: f64,
    pub speed_samples: usize,
    pub max_samples: usize,
}

impl Default for TouchpadClassifier {
    fn default() -> Self {
        Self {
            swipe_speed: 20.0,
            rotate_speed: 5.0,
            pinch_in_speed: 0.04,
            pinch_out_speed: 0.08,
            speed_samples: 3,
            max_samples: 500,
        }
    }
}

impl GestureClassifier for TouchpadClassifier {
    fn classify(&self, state: &GestureState, delta: &MotionDelta) -> Option<Classification> {
        let classification = match *delta {
            MotionDelta::Pointer { dx, dy } => {
                let horizontal = state.dx.abs() >= state.dy.abs();
                Classification {
                    trigger_type: TriggerType::SWIPE,
                    direction: swipe_direction(state, horizontal),
                    magnitude: state.dx.abs().max(state.dy.abs()),
                    event_magnitude: delta.hypot(),
                    delta: if horizontal { dx } else { dy },
                }
            }
            MotionDelta::Pinch { angle, .. } => {
                let scale_change = (state.scale - 1.0).abs();
                if scale_change * PINCH_ROTATE_WEIGHT >= state.angle.abs() {
                    let direction = if state.scale < 1.0 {
                        Some(TriggerDirection::In)
                    } else if state.scale > 1.0 {
                        Some(TriggerDirection::Out)
                    } else {
                        None
                    };
                    Classification {
                        trigger_type: TriggerType::PINCH,
                        direction,
                        magnitude: scale_change,
                        event_magnitude: state.scale_delta.abs(),
                        delta: state.scale_delta,
                    }
                } else {
                    let direction = if state.angle > 0.0 {
                        TriggerDirection::Clockwise
                    } else {
                        TriggerDirection::Counterclockwise
                    };
                    Classification {
                        trigger_type: TriggerType::ROTATE,
                        direction: Some(direction),
                        magnitude: state.angle.abs(),
                        event_magnitude: angle.abs(),
                        delta: angle,
                    }
                }
            }
            MotionDelta::Hold { elapsed_ms } => Classification {
                trigger_type: TriggerType::PRESS,
                direction: None,
                magnitude: state.hold_ms,
                event_magnitude: elapsed_ms,
                delta: elapsed_ms,
            },
            MotionDelta::Wheel { .. } => return None,
        };

        Some(classification)
    }

    fn speed_threshold(&self, classification: &Classification) -> Option<f64> {
        let trigger_type = classification.trigger_type;
        if trigger_type == TriggerType::SWIPE {
            Some(self.swipe_speed)
        } else if trigger_type == TriggerType::ROTATE {
            Some(self.rotate_speed)
        } else if trigger_type == TriggerType::PINCH {
            Some(match classification.direction {
                Some(TriggerDirection::In) => self.pinch_in_speed,
                _ => self.pinch_out_speed,
            })
        } else {
            None
        }
    }

    fn speed_samples(&self) -> usize {
        self.speed_samples
    }

    fn max_samples(&self) -> usize {
        self.max_samples
    }
}

/// Sign of the accumulated displacement on the dominant axis
fn swipe_direction(state: &GestureState, horizontal: bool) -> Option<TriggerDirection> {
    if state.samples < SWIPE_DIRECTION_SAMPLES {
        return None;
    }

    let direction = match (horizontal, state.dx, state.dy) {
        (true, dx, _) if dx < 0.0 => TriggerDirection::Left,
        (true, dx, _) if dx > 0.0 => TriggerDirection::Right,
        (false, _, dy) if dy < 0.0 => TriggerDirection::Up,
        (false, _, dy) if dy > 0.0 => TriggerDirection::Down,
        _ => return None,
    };
    Some(direction)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(deltas: &[MotionDelta]) -> Option<Classification> {
        let classifier = TouchpadClassifier::default();
        let mut state = GestureState::default();
        let mut last = None;
        for delta in deltas {
            state.accumulate(delta);
            last = classifier.classify(&state, delta);
        }
        last
    }

    #[test]
    fn test_swipe_uses_dominant_axis() {
        let result = classify(&[
            MotionDelta::Pointer { dx: -30.0, dy: 4.0 },
            MotionDelta::Pointer { dx: -30.0, dy: 4.0 },
        ])
        .unwrap();

        assert_eq!(result.trigger_type, TriggerType::SWIPE);
        assert_eq!(result.magnitude, 60.0);
    }

    #[test]
    fn test_pinch_versus_rotate() {
        let pinch = classify(&[MotionDelta::Pinch { scale: 0.8, angle: 2.0 }]).unwrap();
        assert_eq!(pinch.trigger_type, TriggerType::PINCH);
        assert!((pinch.magnitude - 0.2).abs() < 1e-9);

        let rotate = classify(&[MotionDelta::Pinch { scale: 1.01, angle: 15.0 }]).unwrap();
        assert_eq!(rotate.trigger_type, TriggerType::ROTATE);
        assert_eq!(rotate.magnitude, 15.0);
    }

    #[test]
    fn test_hold_is_press() {
        let result = classify(&[
            MotionDelta::Hold { elapsed_ms: 100.0 },
            MotionDelta::Hold { elapsed_ms: 150.0 },
        ])
        .unwrap();

        assert_eq!(result.trigger_type, TriggerType::PRESS);
        assert_eq!(result.magnitude, 250.0);
    }

    #[test]
    fn test_wheel_not_classified() {
        assert!(classify(&[MotionDelta::Wheel { dx: 0.0, dy: 10.0 }]).is_none());
    }

    #[test]
    fn test_swipe_direction_needs_two_deltas() {
        let first = classify(&[MotionDelta::Pointer { dx: -10.0, dy: 1.0 }]).unwrap();
        assert_eq!(first.direction, None);

        let left = classify(&[
            MotionDelta::Pointer { dx: -10.0, dy: 1.0 },
            MotionDelta::Pointer { dx: -10.0, dy: 1.0 },
        ])
        .unwrap();
        assert_eq!(left.direction, Some(TriggerDirection::Left));
        assert_eq!(left.delta, -10.0);

        let down = classify(&[
            MotionDelta::Pointer { dx: 1.0, dy: 10.0 },
            MotionDelta::Pointer { dx: 1.0, dy: 10.0 },
        ])
        .unwrap();
        assert_eq!(down.direction, Some(TriggerDirection::Down));
        assert_eq!(down.delta, 10.0);
    }

    #[test]
    fn test_pinch_and_rotate_directions() {
        let pinch_in = classify(&[MotionDelta::Pinch { scale: 0.8, angle: 0.0 }]).unwrap();
        assert_eq!(pinch_in.direction, Some(TriggerDirection::In));
        assert!(pinch_in.delta < 0.0);

        let pinch_out = classify(&[MotionDelta::Pinch { scale: 1.3, angle: 0.0 }]).unwrap();
        assert_eq!(pinch_out.direction, Some(TriggerDirection::Out));

        let rotate = classify(&[MotionDelta::Pinch { scale: 1.0, angle: -20.0 }]).unwrap();
        assert_eq!(rotate.direction, Some(TriggerDirection::Counterclockwise));
        assert_eq!(rotate.delta, -20.0);
    }

    #[test]
    fn test_pinch_threshold_depends_on_direction() {
        let classifier = TouchpadClassifier::default();

        let pinch_in = classify(&[MotionDelta::Pinch { scale: 0.9, angle: 0.0 }]).unwrap();
        assert_eq!(classifier.speed_threshold(&pinch_in), Some(0.04));

        let pinch_out = classify(&[MotionDelta::Pinch { scale: 1.2, angle: 0.0 }]).unwrap();
        assert_eq!(classifier.speed_threshold(&pinch_out), Some(0.08));

        let press = classify(&[MotionDelta::Hold { elapsed_ms: 10.0 }]).unwrap();
        assert_eq!(classifier.speed_threshold(&press), None);
    }
}
