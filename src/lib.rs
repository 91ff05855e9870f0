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

//! Gesture Actions
//!
//! Declarative bindings from touchpad, mouse and touchscreen gestures to
//! desktop actions, with positioned configuration errors.
//!
//! # Features
//!
//! - **Gesture Classification:** Swipe, pinch, rotate, press, stroke and wheel
//!   gestures with magnitude ranges and slow/fast speed tiers
//! - **Conditions:** Boolean rules over host and device variables, built
//!   lazily when a variable only becomes known at runtime
//! - **Actions:** Plasma global shortcuts, shell commands and pauses,
//!   bound to the begin, update, end or cancel of a gesture and grouped
//!   with their own conditions; extensible through a tag registry
//! - **Precise Errors:** Every configuration error carries its line and column
//!
//! # Architecture
//!
//! - **`core`:** Gesture model, value parser, typed conversion, conditions,
//!   variables and input validation
//! - **`actions`:** Action types, tag registry and executors
//! - **`handlers`:** Per-device trigger handlers and gesture classifiers
//! - **`config`:** Configuration file loading and watching
//!
//! # Security
//!
//! - **Argument validation:** Plasma component and shortcut names are
//!   checked at load time and again before execution
//! - **No shell for shortcuts:** `qdbus` is spawned directly with its
//!   arguments; only `command` actions go through `sh -c`
//! - **Memory-safe:** 100% safe Rust (no unsafe blocks)
//!
//! # Examples
//!
//! ## Loading a configuration
//!
//! ```no_run
//! use gesture_actions::config::{expand_path, load_file};
//!
//! let triggers = load_file(&expand_path("~/.config/gesture-actions.conf"))?;
//! for trigger in &triggers {
//!     println!("{}", trigger);
//! }
//! # Ok::<(), gesture_actions::config::LoadError>(())
//! ```
//!
//! ## Feeding motion to a handler
//!
//! ```
//! use std::sync::Arc;
//! use gesture_actions::actions::{Action, RecordingExecutor};
//! use gesture_actions::core::{InputDevice, InputDeviceType, MotionDelta, TriggerType, VariableManager};
//! use gesture_actions::handlers::{HandlerManager, TriggerDefinition};
//!
//! let executor = Arc::new(RecordingExecutor::new());
//! let swipe = TriggerDefinition::new(
//!     TriggerType::SWIPE,
//!     Action::Command { command: "notify-send swiped".to_string() },
//! );
//! let mut manager = HandlerManager::new(vec![swipe], executor.clone(), Arc::new(VariableManager::new()));
//!
//! let touchpad = InputDevice::new("Touchpad", InputDeviceType::Touchpad);
//! manager.attach_device(touchpad.clone());
//! assert!(manager.handle_motion(&touchpad, MotionDelta::Pointer { dx: 12.0, dy: 0.0 }));
//! assert_eq!(executor.executed().len(), 1);
//! ```

pub mod actions;
pub mod config;
pub mod core;
pub mod handlers;

// Re-export commonly used types for convenience
pub use self::actions::Action;
pub use self::core::{ConfigError, TriggerSpeed, TriggerType, Value};
pub use self::handlers::{TriggerDefinition, TriggerHandler};
