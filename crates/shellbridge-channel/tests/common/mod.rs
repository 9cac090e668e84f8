//! Shared fixtures for gateway integration tests.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use shellbridge_channel::{ShellInfo, VersionInfo};

/// Thread-safe log of received argument lists.
pub type Received = Arc<Mutex<Vec<Vec<Value>>>>;

pub fn shell_info() -> ShellInfo {
    ShellInfo::current(VersionInfo {
        host_runtime: "1.0.0".to_string(),
        rendering_engine: "webkit-test".to_string(),
        shell: "0.1.0".to_string(),
    })
}

pub fn received() -> Received {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn snapshot(received: &Received) -> Vec<Vec<Value>> {
    received.lock().expect("received lock should work").clone()
}
