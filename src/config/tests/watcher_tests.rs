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

//! Configuration watcher tests

use std::fs;
use std::time::Duration;
use tempfile::TempDir;

use crate::config::ConfigWatcher;

#[test]
fn test_no_change_times_out() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gestures.conf");
    fs::write(&config_path, "").unwrap();

    let watcher = ConfigWatcher::new(&config_path).unwrap();
    assert_eq!(watcher.path(), config_path.as_path());
    assert!(!watcher.wait_for_change(Duration::from_millis(100)).unwrap());
    assert!(!watcher.check_for_changes());
}

#[test]
fn test_write_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gestures.conf");
    fs::write(&config_path, "").unwrap();

    let watcher = ConfigWatcher::new(&config_path).unwrap();
    fs::write(&config_path, "[trigger]\n").unwrap();

    assert!(watcher.wait_for_change(Duration::from_secs(5)).unwrap());
}

#[test]
fn test_other_files_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("gestures.conf");
    fs::write(&config_path, "").unwrap();

    let watcher = ConfigWatcher::new(&config_path).unwrap();
    fs::write(temp_dir.path().join("unrelated.txt"), "hello").unwrap();

    assert!(!watcher.wait_for_change(Duration::from_millis(300)).unwrap());
}

#[test]
fn test_missing_directory_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("absent").join("gestures.conf");

    assert!(ConfigWatcher::new(&config_path).is_err());
}
