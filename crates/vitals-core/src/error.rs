// Copyright 2025 eraflo
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

//! Error types shared across the workspace.
//!
//! Very little in the engine is allowed to fail: bad configuration is clamped,
//! missing capabilities degrade to no-ops, and callback failures are isolated.
//! What remains are the few places where the host has to be told something
//! went wrong, such as an unparsable config document or a stopped service.

use std::fmt::{self, Display};

/// A specialized `Result` type for fallible `vitals` operations.
pub type VitalsResult<T> = Result<T, VitalsError>;

/// An error surfaced to the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VitalsError {
    /// A configuration document could not be parsed.
    Config(String),
    /// The background service is not running.
    ServiceStopped,
    /// A command or reply channel was disconnected.
    ChannelClosed,
    /// The background worker could not be started.
    Spawn(String),
}

impl Display for VitalsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VitalsError::Config(msg) => write!(f, "Invalid configuration: {msg}"),
            VitalsError::ServiceStopped => write!(f, "Engine service is not running"),
            VitalsError::ChannelClosed => write!(f, "Engine channel closed"),
            VitalsError::Spawn(msg) => write!(f, "Failed to start engine worker: {msg}"),
        }
    }
}

impl std::error::Error for VitalsError {}

impl From<serde_json::Error> for VitalsError {
    fn from(err: serde_json::Error) -> Self {
        VitalsError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            VitalsError::Config("bad".into()).to_string(),
            "Invalid configuration: bad"
        );
        assert_eq!(
            VitalsError::ServiceStopped.to_string(),
            "Engine service is not running"
        );
    }

    #[test]
    fn test_from_serde_error() {
        let err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: VitalsError = err.into();
        assert!(matches!(err, VitalsError::Config(_)));
    }
}
