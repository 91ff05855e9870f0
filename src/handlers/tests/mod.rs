//! Handler module tests
//!
//! - Matching, firing and speed sampling of a single `TriggerHandler`
//! - Device routing and reconfiguration through `HandlerManager`

#[cfg(test)]
mod handler_tests;
