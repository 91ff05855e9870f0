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

//! Trigger handler tests
//!
//! All handlers record actions instead of executing them.

use std::sync::Arc;

use crate::{
    actions::{
        Action, ActionExecutor, ActionGroup, ActionInterval, ActionItem, ActionPoint, ExecutionError,
        GroupMode, RecordingExecutor, TriggerAction,
    },
    core::{
        condition::{ComparisonOperator, Condition, EvaluationError, VariableCondition},
        types::{
            InputDevice, InputDeviceType, MotionDelta, Range, TriggerDirection, TriggerSpeed,
            TriggerType,
        },
        variables::VariableManager,
    },
    handlers::{
        GestureClassifier, GesturePhase, MouseClassifier, TouchpadClassifier, TriggerDefinition,
        TriggerHandler,
    },
};

fn command(text: &str) -> Action {
    Action::Command {
        command: text.to_string(),
    }
}

fn swipe(dx: f64) -> MotionDelta {
    MotionDelta::Pointer { dx, dy: 0.0 }
}

fn wheel(dy: f64) -> MotionDelta {
    MotionDelta::Wheel { dx: 0.0, dy }
}

fn touchpad() -> InputDevice {
    InputDevice::new("Test Touchpad", InputDeviceType::Touchpad)
}

fn on(point: ActionPoint, text: &str) -> TriggerAction {
    TriggerAction::new(point, ActionGroup::single(command(text)))
}

fn every(interval: f64, text: &str) -> TriggerAction {
    on(ActionPoint::Update, text).with_interval(ActionInterval::new(interval))
}

struct Fixture {
    handler: TriggerHandler,
    executor: Arc<RecordingExecutor>,
    variables: Arc<VariableManager>,
    device: InputDevice,
}

impl Fixture {
    fn with_classifier(
        definitions: Vec<TriggerDefinition>,
        classifier: impl GestureClassifier + 'static,
        device: InputDevice,
    ) -> Self {
        let executor = Arc::new(RecordingExecutor::new());
        let variables = Arc::new(VariableManager::new());
        let mut handler = TriggerHandler::new(
            Arc::new(device.clone()),
            Box::new(classifier),
            executor.clone(),
            variables.clone(),
        );
        handler.replace_triggers(definitions);

        Self {
            handler,
            executor,
            variables,
            device,
        }
    }

    fn new(definitions: Vec<TriggerDefinition>) -> Self {
        Self::with_classifier(definitions, TouchpadClassifier::default(), touchpad())
    }

    fn mouse(definitions: Vec<TriggerDefinition>) -> Self {
        Self::with_classifier(
            definitions,
            MouseClassifier::default(),
            InputDevice::new("Test Mouse", InputDeviceType::Mouse),
        )
    }

    fn send(&mut self, delta: MotionDelta) -> bool {
        self.handler.handle_motion(&self.device, delta)
    }

    /// Number of events consumed out of `count` copies of `delta`
    fn send_many(&mut self, delta: MotionDelta, count: usize) -> usize {
        (0..count).filter(|_| self.send(delta)).count()
    }

    fn executed_count(&self, text: &str) -> usize {
        let expected = command(text);
        self.executor
            .executed()
            .iter()
            .filter(|action| **action == expected)
            .count()
    }
}

#[test]
fn test_first_match_fires_once() {
    let mut fixture = Fixture::new(vec![
        TriggerDefinition::new(TriggerType::SWIPE, command("first")),
        TriggerDefinition::new(TriggerType::SWIPE, command("second")),
    ]);

    assert!(fixture.send(swipe(10.0)));
    assert_eq!(fixture.handler.state().phase, GesturePhase::Done);

    // Nothing is left to run, so the rest of the gesture passes through
    assert!(!fixture.send(swipe(10.0)));
    assert!(!fixture.send(swipe(10.0)));

    assert_eq!(fixture.executor.executed(), vec![command("first")]);
}

#[test]
fn test_mask_matches_any_contained_type() {
    let mut fixture = Fixture::new(vec![
        TriggerDefinition::new(TriggerType::PINCH, command("pinch")),
        TriggerDefinition::new(TriggerType::STROKE_SWIPE, command("swipe or stroke")),
    ]);

    assert!(fixture.send(swipe(10.0)));
    assert_eq!(fixture.executor.executed(), vec![command("swipe or stroke")]);
}

#[test]
fn test_threshold_gates_firing() {
    let mut fixture = Fixture::new(vec![TriggerDefinition::new(TriggerType::SWIPE, command("far"))
        .with_threshold(Range::new(100.0, 200.0))]);

    assert!(fixture.send(swipe(60.0)));
    assert!(fixture.executor.executed().is_empty());

    assert!(fixture.send(swipe(60.0)));
    assert_eq!(fixture.executor.executed(), vec![command("far")]);
}

#[test]
fn test_overshooting_threshold_never_fires() {
    let mut fixture = Fixture::new(vec![TriggerDefinition::new(TriggerType::SWIPE, command("near"))
        .with_threshold(Range::new(10.0, 20.0))]);

    assert!(fixture.send(swipe(50.0)));
    assert!(fixture.send(swipe(50.0)));
    assert!(fixture.executor.executed().is_empty());
}

#[test]
fn test_condition_error_counts_as_no_match() {
    let failing = Condition::custom(|_| Err(EvaluationError::Failed("backend gone".to_string())));
    let mut fixture = Fixture::new(vec![
        TriggerDefinition::new(TriggerType::SWIPE, command("guarded")).with_condition(failing),
        TriggerDefinition::new(TriggerType::SWIPE, command("fallback")),
    ]);

    assert!(fixture.send(swipe(10.0)));
    assert_eq!(fixture.executor.executed(), vec![command("fallback")]);
}

#[test]
fn test_condition_sees_host_variables() {
    let fingers = Condition::variable(VariableCondition::new(
        "fingers",
        ComparisonOperator::EqualTo,
        3.0,
    ));
    let mut fixture = Fixture::new(vec![
        TriggerDefinition::new(TriggerType::SWIPE, command("three")).with_condition(fingers)
    ]);

    // Unset variable: evaluation fails, nothing fires
    assert!(fixture.send(swipe(10.0)));
    assert!(fixture.executor.executed().is_empty());

    fixture.variables.set("fingers", 3.0);
    assert!(fixture.send(swipe(10.0)));
    assert_eq!(fixture.executor.executed(), vec![command("three")]);
}

#[test]
fn test_condition_sees_device() {
    let on_mouse = Condition::variable(VariableCondition::new(
        "device_type",
        ComparisonOperator::EqualTo,
        "mouse",
    ));
    let mut fixture = Fixture::new(vec![
        TriggerDefinition::new(TriggerType::SWIPE, command("mouse only")).with_condition(on_mouse),
    ]);

    assert!(fixture.send(swipe(10.0)));
    assert!(fixture.executor.executed().is_empty());
}

#[test]
fn test_fast_matched_only_after_sampling() {
    let mut fixture = Fixture::new(vec![TriggerDefinition::new(TriggerType::SWIPE, command("fast"))
        .with_speed(TriggerSpeed::Fast)]);

    for _ in 0..3 {
        assert!(fixture.send(swipe(30.0)));
        assert!(fixture.executor.executed().is_empty());
        assert_eq!(fixture.handler.state().speed(), None);
    }

    assert!(fixture.send(swipe(30.0)));
    assert_eq!(fixture.handler.state().speed(), Some(TriggerSpeed::Fast));
    assert_eq!(fixture.executor.executed(), vec![command("fast")]);
}

#[test]
fn test_slow_gesture_skips_fast_definition() {
    let mut fixture = Fixture::new(vec![
        TriggerDefinition::new(TriggerType::SWIPE, command("fast")).with_speed(TriggerSpeed::Fast),
        TriggerDefinition::new(TriggerType::SWIPE, command("slow")).with_speed(TriggerSpeed::Slow),
    ]);

    for _ in 0..4 {
        assert!(fixture.send(swipe(5.0)));
    }

    assert_eq!(fixture.handler.state().speed(), Some(TriggerSpeed::Slow));
    assert_eq!(fixture.executor.executed(), vec![command("slow")]);
}

#[test]
fn test_any_speed_does_not_sample() {
    let mut fixture = Fixture::new(vec![TriggerDefinition::new(TriggerType::SWIPE, command("any"))]);

    assert!(fixture.send(swipe(1.0)));
    assert_eq!(fixture.handler.state().speed(), None);
    assert_eq!(fixture.executor.executed(), vec![command("any")]);
}

#[test]
fn test_abandoned_gesture_resets_after_lifetime() {
    let classifier = TouchpadClassifier {
        max_samples: 5,
        ..TouchpadClassifier::default()
    };
    let mut fixture = Fixture::with_classifier(
        vec![TriggerDefinition::new(TriggerType::SWIPE, command("far"))
            .with_threshold(Range::new(1000.0, 2000.0))],
        classifier,
        touchpad(),
    );

    for _ in 0..4 {
        fixture.send(swipe(1.0));
    }
    assert_eq!(fixture.handler.state().samples, 4);
    assert_eq!(fixture.handler.state().dx, 4.0);

    fixture.send(swipe(1.0));
    assert_eq!(fixture.handler.state().samples, 0);
    assert_eq!(fixture.handler.state().dx, 0.0);
}

#[test]
fn test_end_gesture_allows_next_fire() {
    let mut fixture = Fixture::new(vec![TriggerDefinition::new(TriggerType::SWIPE, command("swipe"))]);

    fixture.send(swipe(10.0));
    fixture.send(swipe(10.0));
    fixture.handler.end_gesture();
    assert_eq!(fixture.handler.state().phase, GesturePhase::Pending);

    fixture.send(swipe(10.0));
    assert_eq!(fixture.executor.executed().len(), 2);
}

#[test]
fn test_replace_triggers_resets_progress() {
    let mut fixture = Fixture::new(vec![TriggerDefinition::new(TriggerType::SWIPE, command("old"))
        .with_threshold(Range::new(100.0, 200.0))]);

    fixture.send(swipe(60.0));
    assert_eq!(fixture.handler.state().dx, 60.0);

    fixture
        .handler
        .replace_triggers(vec![TriggerDefinition::new(TriggerType::SWIPE, command("new"))
            .with_threshold(Range::new(100.0, 200.0))]);
    assert_eq!(fixture.handler.state().samples, 0);

    // 60 accumulated before the swap no longer counts
    fixture.send(swipe(60.0));
    assert!(fixture.executor.executed().is_empty());
    fixture.send(swipe(60.0));
    assert_eq!(fixture.executor.executed(), vec![command("new")]);
}

#[test]
fn test_other_device_not_consumed() {
    let mut fixture = Fixture::new(vec![TriggerDefinition::new(TriggerType::SWIPE, command("swipe"))]);
    let other = InputDevice::new("Other Touchpad", InputDeviceType::Touchpad);

    assert!(!fixture.handler.handle_motion(&other, swipe(10.0)));
    assert_eq!(fixture.handler.state().samples, 0);
}

#[test]
fn test_without_candidates_event_passes_through() {
    let mut fixture = Fixture::new(vec![TriggerDefinition::new(TriggerType::PINCH, command("pinch"))]);

    assert!(!fixture.send(swipe(10.0)));
    assert!(!fixture.send(MotionDelta::Wheel { dx: 0.0, dy: 5.0 }));
    assert!(fixture.executor.executed().is_empty());
}

#[test]
fn test_press_fires_after_hold_time() {
    let mut fixture = Fixture::new(vec![TriggerDefinition::new(TriggerType::PRESS, command("press"))
        .with_threshold(Range::at_least(300.0))]);

    assert!(fixture.send(MotionDelta::Hold { elapsed_ms: 200.0 }));
    assert!(fixture.executor.executed().is_empty());
    assert!(fixture.send(MotionDelta::Hold { elapsed_ms: 200.0 }));
    assert_eq!(fixture.executor.executed(), vec![command("press")]);
}

struct FailingExecutor;

impl ActionExecutor for FailingExecutor {
    fn execute(&self, _action: &Action) -> Result<(), ExecutionError> {
        Err(ExecutionError::Rejected("not allowed".to_string()))
    }
}

#[test]
fn test_failed_execution_still_finishes_trigger() {
    let device = touchpad();
    let mut handler = TriggerHandler::new(
        Arc::new(device.clone()),
        Box::new(TouchpadClassifier::default()),
        Arc::new(FailingExecutor),
        Arc::new(VariableManager::new()),
    );
    handler.replace_triggers(vec![TriggerDefinition::new(TriggerType::SWIPE, command("swipe"))]);

    assert!(handler.handle_motion(&device, swipe(10.0)));
    assert_eq!(handler.state().phase, GesturePhase::Done);
}

#[test]
fn test_sample_limit_applies_after_firing() {
    let classifier = TouchpadClassifier {
        max_samples: 5,
        ..TouchpadClassifier::default()
    };
    let mut fixture = Fixture::with_classifier(
        vec![TriggerDefinition::new(TriggerType::SWIPE, command("swipe"))],
        classifier,
        touchpad(),
    );

    assert_eq!(fixture.send_many(swipe(1.0), 5), 1);
    assert_eq!(fixture.handler.state().samples, 0);

    // A fresh gesture after the limit matches again
    assert!(fixture.send(swipe(1.0)));
    assert_eq!(fixture.executed_count("swipe"), 2);
}

#[test]
fn test_mouse_wheel_fires_per_event_and_strokes_pass_through() {
    let mut fixture = Fixture::mouse(vec![
        TriggerDefinition::new(TriggerType::WHEEL, command("wheel"))
            .with_threshold(Range::at_least(10.0)),
        TriggerDefinition::new(TriggerType::STROKE, command("stroke"))
            .with_threshold(Range::new(100.0, 200.0)),
    ]);

    assert_eq!(fixture.send_many(wheel(15.0), 2000), 2000);
    assert_eq!(fixture.executed_count("wheel"), 2000);
    assert_eq!(fixture.handler.state().samples, 0);

    // Each 500-sample stroke fires at 100 units of path, then passes through
    let pointer = MotionDelta::Pointer { dx: 1.0, dy: 0.0 };
    assert_eq!(fixture.send_many(pointer, 2000), 400);
    assert_eq!(fixture.executed_count("stroke"), 4);
}

#[test]
fn test_small_wheel_event_does_not_fire() {
    let mut fixture = Fixture::mouse(vec![TriggerDefinition::new(TriggerType::WHEEL, command("wheel"))
        .with_threshold(Range::at_least(10.0))]);

    assert!(fixture.send(wheel(5.0)));
    assert!(fixture.send(wheel(5.0)));
    assert!(fixture.executor.executed().is_empty());
}

#[test]
fn test_wheel_speed_decided_per_event() {
    let mut fixture = Fixture::mouse(vec![
        TriggerDefinition::new(TriggerType::WHEEL, command("fast")).with_speed(TriggerSpeed::Fast),
        TriggerDefinition::new(TriggerType::WHEEL, command("slow")).with_speed(TriggerSpeed::Slow),
    ]);

    assert!(fixture.send(wheel(30.0)));
    assert!(fixture.send(wheel(5.0)));
    assert_eq!(fixture.executor.executed(), vec![command("fast"), command("slow")]);
}

#[test]
fn test_continuous_wheel_stays_open_until_other_motion() {
    let mut fixture = Fixture::mouse(vec![TriggerDefinition::from_actions(
        TriggerType::WHEEL,
        vec![
            on(ActionPoint::Begin, "begin"),
            every(30.0, "step"),
            on(ActionPoint::End, "end"),
        ],
    )
    .with_direction(TriggerDirection::Down)]);

    assert_eq!(fixture.send_many(wheel(15.0), 4), 4);
    assert_eq!(
        fixture.executor.executed(),
        vec![command("begin"), command("step"), command("step")]
    );

    assert!(!fixture.send(MotionDelta::Pointer { dx: 5.0, dy: 0.0 }));
    assert_eq!(fixture.executed_count("end"), 1);
}

#[test]
fn test_direction_selects_definition() {
    let mut fixture = Fixture::new(vec![
        TriggerDefinition::new(TriggerType::SWIPE, command("left"))
            .with_direction(TriggerDirection::Left),
        TriggerDefinition::new(TriggerType::SWIPE, command("right"))
            .with_direction(TriggerDirection::Right),
    ]);

    // One delta is not enough to tell the direction
    assert!(fixture.send(swipe(-10.0)));
    assert!(fixture.executor.executed().is_empty());

    assert!(fixture.send(swipe(-10.0)));
    assert_eq!(fixture.executor.executed(), vec![command("left")]);
}

#[test]
fn test_any_direction_waits_for_directional_candidates() {
    let mut fixture = Fixture::new(vec![
        TriggerDefinition::new(TriggerType::SWIPE, command("up"))
            .with_direction(TriggerDirection::Up),
        TriggerDefinition::new(TriggerType::SWIPE, command("any")),
    ]);

    assert!(fixture.send(swipe(10.0)));
    assert!(fixture.executor.executed().is_empty());

    assert!(fixture.send(swipe(10.0)));
    assert_eq!(fixture.executor.executed(), vec![command("any")]);
}

#[test]
fn test_pinch_speed_threshold_follows_direction() {
    let definitions = || {
        vec![
            TriggerDefinition::new(TriggerType::PINCH, command("fast")).with_speed(TriggerSpeed::Fast),
            TriggerDefinition::new(TriggerType::PINCH, command("slow")).with_speed(TriggerSpeed::Slow),
        ]
    };

    // Same per-event change of 0.05: fast when pinching in, slow when out
    let mut pinch_in = Fixture::new(definitions());
    for scale in [0.95, 0.9, 0.85, 0.8] {
        pinch_in.send(MotionDelta::Pinch { scale, angle: 0.0 });
    }
    assert_eq!(pinch_in.executor.executed(), vec![command("fast")]);

    let mut pinch_out = Fixture::new(definitions());
    for scale in [1.05, 1.1, 1.15, 1.2] {
        pinch_out.send(MotionDelta::Pinch { scale, angle: 0.0 });
    }
    assert_eq!(pinch_out.executor.executed(), vec![command("slow")]);
}

#[test]
fn test_update_interval_and_end_actions() {
    let mut fixture = Fixture::new(vec![TriggerDefinition::from_actions(
        TriggerType::SWIPE,
        vec![
            on(ActionPoint::Begin, "begin"),
            every(10.0, "step"),
            on(ActionPoint::End, "end"),
        ],
    )]);

    assert!(fixture.send(swipe(5.0)));
    assert!(matches!(fixture.handler.state().phase, GesturePhase::Active(0)));
    assert!(fixture.send(swipe(12.0)));
    assert!(fixture.send(swipe(3.0)));
    fixture.handler.end_gesture();

    assert_eq!(
        fixture.executor.executed(),
        vec![command("begin"), command("step"), command("step"), command("end")]
    );
}

#[test]
fn test_left_swipe_updates_count_leftward_motion() {
    let mut fixture = Fixture::new(vec![TriggerDefinition::from_actions(
        TriggerType::SWIPE,
        vec![every(10.0, "step")],
    )
    .with_direction(TriggerDirection::Left)]);

    assert!(fixture.send(swipe(-6.0)));
    assert!(fixture.send(swipe(-6.0)));
    assert!(fixture.executor.executed().is_empty());
    assert!(fixture.send(swipe(-6.0)));
    assert_eq!(fixture.executor.executed(), vec![command("step")]);
}

#[test]
fn test_reversed_swipe_is_cancelled() {
    let mut fixture = Fixture::new(vec![TriggerDefinition::from_actions(
        TriggerType::SWIPE,
        vec![
            on(ActionPoint::Begin, "begin"),
            on(ActionPoint::Cancel, "cancel"),
            on(ActionPoint::EndCancel, "cleanup"),
            on(ActionPoint::End, "end"),
        ],
    )
    .with_direction(TriggerDirection::Right)]);

    fixture.send(swipe(10.0));
    assert!(fixture.send(swipe(10.0)));
    assert!(!fixture.send(swipe(-30.0)));
    assert_eq!(fixture.handler.state().phase, GesturePhase::Done);
    assert!(!fixture.send(swipe(-5.0)));
    fixture.handler.end_gesture();

    assert_eq!(
        fixture.executor.executed(),
        vec![command("begin"), command("cancel"), command("cleanup")]
    );
}

#[test]
fn test_replace_triggers_cancels_active_gesture() {
    let mut fixture = Fixture::new(vec![TriggerDefinition::from_actions(
        TriggerType::SWIPE,
        vec![on(ActionPoint::Begin, "begin"), on(ActionPoint::Cancel, "cancel")],
    )]);

    fixture.send(swipe(10.0));
    fixture.handler.replace_triggers(Vec::new());

    assert_eq!(fixture.executor.executed(), vec![command("begin"), command("cancel")]);
    assert_eq!(fixture.handler.state().phase, GesturePhase::Pending);
}

#[test]
fn test_group_modes() {
    let four_fingers = || {
        Condition::variable(VariableCondition::new("fingers", ComparisonOperator::EqualTo, 4.0))
    };
    let items = || {
        vec![
            ActionItem::new(command("four")).with_condition(four_fingers()),
            ActionItem::new(command("fallback")),
        ]
    };
    let mut fixture = Fixture::new(vec![
        TriggerDefinition::from_actions(
            TriggerType::SWIPE,
            vec![TriggerAction::new(ActionPoint::Begin, ActionGroup::new(GroupMode::One, items()))],
        ),
    ]);

    // Unset variable: the conditional item is skipped
    fixture.send(swipe(10.0));
    fixture.handler.end_gesture();
    fixture.variables.set("fingers", 4.0);
    fixture.send(swipe(10.0));
    fixture.handler.end_gesture();
    assert_eq!(fixture.executor.take(), vec![command("fallback"), command("four")]);

    fixture.handler.replace_triggers(vec![TriggerDefinition::from_actions(
        TriggerType::SWIPE,
        vec![TriggerAction::new(ActionPoint::Begin, ActionGroup::new(GroupMode::All, items()))],
    )]);
    fixture.send(swipe(10.0));
    assert_eq!(fixture.executor.executed(), vec![command("four"), command("fallback")]);
}

#[test]
fn test_action_condition_gates_its_group() {
    let never = Condition::custom(|_| Ok(false));
    let mut fixture = Fixture::new(vec![TriggerDefinition::from_actions(
        TriggerType::SWIPE,
        vec![
            on(ActionPoint::Begin, "guarded").with_condition(never),
            on(ActionPoint::Begin, "open"),
        ],
    )]);

    fixture.send(swipe(10.0));
    assert_eq!(fixture.executor.executed(), vec![command("open")]);
}

#[test]
fn test_group_runs_as_one_batch() {
    let mut fixture = Fixture::new(vec![TriggerDefinition::from_actions(
        TriggerType::SWIPE,
        vec![TriggerAction::new(
            ActionPoint::Begin,
            ActionGroup::new(
                GroupMode::All,
                vec![
                    ActionItem::new(command("first")),
                    ActionItem::new(Action::Sleep { milliseconds: 20 }),
                    ActionItem::new(command("second")),
                ],
            ),
        )],
    )]);

    fixture.send(swipe(10.0));
    assert_eq!(
        fixture.executor.executed(),
        vec![command("first"), Action::Sleep { milliseconds: 20 }, command("second")]
    );
}
