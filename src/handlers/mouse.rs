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

//! Mouse gesture classification: pointer strokes and wheel scrolling
//!
//! Every wheel event is a gesture of its own with the direction of that
//! event.

use crate::core::types::{MotionDelta, TriggerDirection, TriggerType};
use crate::handlers::{Classification, GestureClassifier, GestureState};

#[derive(Clone, Debug, PartialEq)]
pub struct MouseClassifier {
    pub stroke_speed: f64,
    pub wheel_speed: f64,
    pub speed_samples: usize,
    pub max_samples: usize,
}

impl Default for MouseClassifier {
    fn default() -> Self {
        Self {
            stroke_speed: 20.0,
            wheel_speed: 20.0,
            speed_samples: 3,
            max_samples: 500,
        }
    }
}

impl GestureClassifier for MouseClassifier {
    fn classify(&self, state: &GestureState, delta: &MotionDelta) -> Option<Classification> {
        match *delta {
            MotionDelta::Pointer { .. } => Some(Classification {
                trigger_type: TriggerType::STROKE,
                direction: None,
                magnitude: state.path_length,
                event_magnitude: delta.hypot(),
                delta: delta.hypot(),
            }),
            MotionDelta::Wheel { dx, dy } => Some(Classification {
                trigger_type: TriggerType::WHEEL,
                direction: wheel_direction(dx, dy),
                magnitude: state.wheel_dx.hypot(state.wheel_dy),
                event_magnitude: delta.hypot(),
                delta: if dx != 0.0 { dx } else { dy },
            }),
            MotionDelta::Pinch { .. } | MotionDelta::Hold { .. } => None,
        }
    }

    fn speed_threshold(&self, classification: &Classification) -> Option<f64> {
        let trigger_type = classification.trigger_type;
        if trigger_type == TriggerType::STROKE {
            Some(self.stroke_speed)
        } else if trigger_type == TriggerType::WHEEL {
            Some(self.wheel_speed)
        } else {
            None
        }
    }

    fn is_discrete(&self, delta: &MotionDelta) -> bool {
        matches!(delta, MotionDelta::Wheel { .. })
    }

    fn speed_samples(&self) -> usize {
        self.speed_samples
    }

    fn max_samples(&self) -> usize {
        self.max_samples
    }
}

/// Horizontal scrolling takes precedence
fn wheel_direction(dx: f64, dy: f64) -> Option<TriggerDirection> {
    let direction = if dx > 0.0 {
        TriggerDirection::Right
    } else if dx < 0.0 {
        TriggerDirection::Left
    } else if dy > 0.0 {
        TriggerDirection::Down
    } else if dy < 0.0 {
        TriggerDirection::Up
    } else {
        return None;
    };
    Some(direction)
}
