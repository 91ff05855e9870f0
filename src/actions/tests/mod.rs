//! Actions module tests
//!
//! Contains test suites for action parsing and execution:
//! - Tag lookup and argument parsing with absolute error positions
//! - Executor validation in DryRun mode
