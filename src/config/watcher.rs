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

//! File system watcher for live configuration reloads
//!
//! Uses OS-level file watching (Linux inotify) via the notify crate. The
//! parent directory is watched rather than the file itself, so editors that
//! save by writing a new file and renaming it over the old one are seen too.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::{
    path::{Path, PathBuf},
    sync::mpsc::{channel, Receiver, RecvTimeoutError},
    time::Duration,
};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Cannot watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("File watcher stopped")]
    Disconnected,
}

/// Watches one configuration file for modifications
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    path: PathBuf,
}

impl ConfigWatcher {
    pub fn new(path: &Path) -> Result<Self, WatchError> {
        let (tx, rx) = channel();
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let watch_error = |source| WatchError::Watch {
            path: directory.clone(),
            source,
        };

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )
        .map_err(watch_error)?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(watch_error)?;
        debug!(path = %path.display(), "watching configuration file");

        Ok(ConfigWatcher {
            _watcher: watcher,
            rx,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checks for file modification events (non-blocking)
    pub fn check_for_changes(&self) -> bool {
        let mut changed = false;
        while let Ok(event_result) = self.rx.try_recv() {
            changed |= self.is_change(event_result);
        }
        changed
    }

    /// Blocks until the file changes or `timeout` elapses
    ///
    /// Events queued behind the first change are drained, so one save
    /// reports one change.
    pub fn wait_for_change(&self, timeout: Duration) -> Result<bool, WatchError> {
        loop {
            match self.rx.recv_timeout(timeout) {
                Ok(event_result) => {
                    if self.is_change(event_result) {
                        self.check_for_changes();
                        return Ok(true);
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Ok(false),
                Err(RecvTimeoutError::Disconnected) => return Err(WatchError::Disconnected),
            }
        }
    }

    fn is_change(&self, event_result: notify::Result<Event>) -> bool {
        match event_result {
            Ok(event) => {
                matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
                    && event.paths.iter().any(|changed| self.is_watched(changed))
            }
            Err(e) => {
                warn!(error = %e, "file watcher error");
                false
            }
        }
    }

    fn is_watched(&self, changed: &Path) -> bool {
        changed == self.path || changed.file_name() == self.path.file_name()
    }
}
