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

//! One trigger handler per attached device
//!
//! The manager owns the loaded definitions and hands each new device the
//! subset that applies to its class. Reconfiguration replaces the definition
//! set of every handler at once.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::actions::ActionExecutor;
use crate::core::types::{InputDevice, InputDeviceType, MotionDelta};
use crate::core::variables::VariableManager;
use crate::handlers::{
    GestureClassifier, MouseClassifier, TouchpadClassifier, TriggerDefinition, TriggerHandler,
};

pub struct HandlerManager {
    definitions: Vec<TriggerDefinition>,
    handlers: HashMap<String, TriggerHandler>,
    executor: Arc<dyn ActionExecutor>,
    variables: Arc<VariableManager>,
}

impl HandlerManager {
    pub fn new(
        definitions: Vec<TriggerDefinition>,
        executor: Arc<dyn ActionExecutor>,
        variables: Arc<VariableManager>,
    ) -> Self {
        Self {
            definitions,
            handlers: HashMap::new(),
            executor,
            variables,
        }
    }

    /// Create a handler for `device`, replacing any handler with the same name
    pub fn attach_device(&mut self, device: InputDevice) {
        let device_type = device.device_type;
        let mut handler = TriggerHandler::new(
            Arc::new(device),
            classifier_for(device_type),
            Arc::clone(&self.executor),
            Arc::clone(&self.variables),
        );
        handler.replace_triggers(self.definitions_for(device_type));

        info!(
            device = %handler.device().name,
            kind = %device_type,
            triggers = handler.definitions().len(),
            "device attached"
        );
        self.handlers.insert(handler.device().name.clone(), handler);
    }

    /// Drop the handler of the named device; returns false if none existed
    ///
    /// A gesture in progress on the device is cancelled.
    pub fn detach_device(&mut self, name: &str) -> bool {
        let Some(mut handler) = self.handlers.remove(name) else {
            return false;
        };
        handler.cancel_gesture();
        info!(device = name, "device detached");
        true
    }

    /// Route a delta to the handler of `device`
    ///
    /// Returns false for unknown devices and for events the handler did not
    /// consume.
    pub fn handle_motion(&mut self, device: &InputDevice, delta: MotionDelta) -> bool {
        match self.handlers.get_mut(&device.name) {
            Some(handler) => handler.handle_motion(device, delta),
            None => {
                debug!(device = %device.name, "motion from unattached device ignored");
                false
            }
        }
    }

    pub fn end_gesture(&mut self, name: &str) {
        if let Some(handler) = self.handlers.get_mut(name) {
            handler.end_gesture();
        }
    }

    /// Replace the definitions of every handler
    pub fn reconfigure(&mut self, definitions: Vec<TriggerDefinition>) {
        self.definitions = definitions;
        for handler in self.handlers.values_mut() {
            let device_type = handler.device().device_type;
            let subset = self
                .definitions
                .iter()
                .filter(|definition| definition.applies_to(device_type))
                .cloned()
                .collect();
            handler.replace_triggers(subset);
        }
        info!(
            triggers = self.definitions.len(),
            devices = self.handlers.len(),
            "configuration applied"
        );
    }

    pub fn handler(&self, name: &str) -> Option<&TriggerHandler> {
        self.handlers.get(name)
    }

    /// Names of attached devices, sorted
    pub fn devices(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn definitions(&self) -> &[TriggerDefinition] {
        &self.definitions
    }

    pub fn variables(&self) -> &VariableManager {
        &self.variables
    }

    fn definitions_for(&self, device_type: InputDeviceType) -> Vec<TriggerDefinition> {
        self.definitions
            .iter()
            .filter(|definition| definition.applies_to(device_type))
            .cloned()
            .collect()
    }
}

fn classifier_for(device_type: InputDeviceType) -> Box<dyn GestureClassifier> {
    match device_type {
        InputDeviceType::Mouse => Box::new(MouseClassifier::default()),
        InputDeviceType::Touchpad | InputDeviceType::Touchscreen => {
            Box::new(TouchpadClassifier::default())
        }
    }
}
