//! Config module tests
//!
//! - Loader grammar, error positions and rendering
//! - File loading through the filesystem (tempfile)
//! - File watching

#[cfg(test)]
mod watcher_tests;
