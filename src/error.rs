// Copyright 2025 coScene
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

// Error taxonomy shared by every backend adapter

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unsupported configuration, raised at construction time
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{resource} '{id}' not found")]
    NotFound { resource: String, id: String },

    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode backend payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("document store error: {0}")]
    Document(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Error::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::Status { status, .. } => *status == 404,
            _ => false,
        }
    }
}

/// Failure delivered to every observer of a collection change feed.
///
/// Cloneable so the same failure reaches each observer of a shared feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionError {
    pub collection: String,
    pub message: String,
}

impl fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "subscription to '{}' failed: {}",
            self.collection, self.message
        )
    }
}

impl std::error::Error for SubscriptionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        assert!(Error::not_found("people", "1").is_not_found());
        assert!(Error::Status {
            status: 404,
            body: String::new()
        }
        .is_not_found());
        assert!(!Error::Status {
            status: 500,
            body: String::new()
        }
        .is_not_found());
        assert!(!Error::config("x").is_not_found());
    }

    #[test]
    fn test_subscription_error_display() {
        let err = SubscriptionError {
            collection: "people".to_string(),
            message: "permission denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "subscription to 'people' failed: permission denied"
        );
    }
}
