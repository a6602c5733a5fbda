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

// Real-time collection change feeds

mod document;

pub use document::DocumentCollectionSubscription;

use crate::error::{Result, SubscriptionError};
use crate::models::CollectionChange;
use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;

/// Item delivered to observers of a collection
pub type ChangeEvent<T> = std::result::Result<CollectionChange<T>, SubscriptionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Unsubscribed,
    /// Backend listener is being attached
    Subscribing,
    Active,
    /// The backend listener failed; a fresh `subscribe` starts over
    Error,
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubscriptionState::Unsubscribed => "unsubscribed",
            SubscriptionState::Subscribing => "subscribing",
            SubscriptionState::Active => "active",
            SubscriptionState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Receiving half of a collection feed
pub struct ChangeStream<T> {
    collection: String,
    receiver: mpsc::UnboundedReceiver<ChangeEvent<T>>,
}

impl<T> ChangeStream<T> {
    pub(crate) fn new(
        collection: impl Into<String>,
        receiver: mpsc::UnboundedReceiver<ChangeEvent<T>>,
    ) -> Self {
        Self {
            collection: collection.into(),
            receiver,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Next change, an error once if the listener failed, or `None` once the
    /// feed has completed
    pub async fn recv(&mut self) -> Option<ChangeEvent<T>> {
        self.receiver.recv().await
    }
}

#[async_trait]
pub trait CollectionSubscription<T>: Send + Sync {
    async fn subscribe(&self, collection: &str) -> Result<ChangeStream<T>>;

    /// Detach the backend listener and complete every stream of `collection`
    fn unsubscribe(&self, collection: &str);

    /// Unsubscribe every collection
    fn close(&self);

    fn state(&self, collection: &str) -> SubscriptionState;

    fn observer_count(&self, collection: &str) -> usize;
}
