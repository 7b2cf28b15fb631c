/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
//! The `WarningSink` external-collaborator interface: schema diagnostics are written here, never
//! to a process-wide logger this crate owns.
use std::sync::Mutex;

/// Receives one warning per failed schema operation, together with the dotted path of the node
/// that failed.
pub trait WarningSink: Send + Sync {
    /// Record a warning. `logger_path` is a dotted walk such as `root.records.foo.bar[3]`.
    fn warn(&self, logger_path: &str, message: &str);
}

/// A `WarningSink` that discards every warning. The default when no sink is supplied.
#[derive(Debug, Default, Copy, Clone)]
pub struct NullSink;

impl WarningSink for NullSink {
    fn warn(&self, _logger_path: &str, _message: &str) {}
}

/// A `WarningSink` that collects warnings into a `Vec`, for test assertions.
#[derive(Debug, Default)]
pub struct VecSink {
    warnings: Mutex<Vec<(String, String)>>,
}

impl VecSink {
    /// A fresh, empty sink.
    pub fn new() -> Self {
        VecSink {
            warnings: Mutex::new(Vec::new()),
        }
    }

    /// Every `(logger_path, message)` pair recorded so far.
    pub fn warnings(&self) -> Vec<(String, String)> {
        self.warnings.lock().unwrap().clone()
    }
}

impl WarningSink for VecSink {
    fn warn(&self, logger_path: &str, message: &str) {
        self.warnings
            .lock()
            .unwrap()
            .push((logger_path.to_string(), message.to_string()));
    }
}
