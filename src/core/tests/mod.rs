//! Core module tests
//!
//! Contains test suites for core functionality:
//! - Type tests (TriggerType, TriggerSpeed, Range)
//! - Value parser tests
//! - Typed conversion tests
//! - Condition engine tests
