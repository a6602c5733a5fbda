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

// Change feeds over document store listeners

use super::{ChangeEvent, ChangeStream, CollectionSubscription, SubscriptionState};
use crate::docstore::{DocumentChange, DocumentStore, ListenerRegistration};
use crate::error::{Result, SubscriptionError};
use crate::mapping::DocumentMapping;
use crate::models::{ChangeKind, CollectionChange, Entity};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

type Observer<T> = mpsc::UnboundedSender<ChangeEvent<T>>;

struct Channel<T> {
    /// One unbounded sender per observer so no event is ever dropped
    observers: Vec<Observer<T>>,
    state: SubscriptionState,
    task: Option<JoinHandle<()>>,
    generation: u64,
}

impl<T: Clone> Channel<T> {
    /// Deliver to every live observer, forgetting the ones that went away
    fn publish(&mut self, event: ChangeEvent<T>) {
        self.observers
            .retain(|observer| observer.send(event.clone()).is_ok());
    }
}

type Channels<T> = Arc<DashMap<String, Channel<T>>>;

pub struct DocumentCollectionSubscription<T, M> {
    store: Arc<dyn DocumentStore>,
    mapping: Arc<M>,
    channels: Channels<T>,
    next_generation: AtomicU64,
}

impl<T: Entity, M: DocumentMapping<T>> DocumentCollectionSubscription<T, M> {
    pub fn new(store: Arc<dyn DocumentStore>, mapping: M) -> Self {
        Self {
            store,
            mapping: Arc::new(mapping),
            channels: Arc::new(DashMap::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Report the failure once, then drop every observer so their streams complete
    fn fail(channels: &Channels<T>, collection: &str, generation: u64, message: String) {
        if let Some(mut channel) = channels.get_mut(collection) {
            if channel.generation == generation {
                channel.publish(Err(SubscriptionError {
                    collection: collection.to_string(),
                    message,
                }));
                channel.observers.clear();
                channel.state = SubscriptionState::Error;
                channel.task = None;
            }
        }
    }

    fn to_change(mapping: &M, change: DocumentChange) -> CollectionChange<T> {
        let id = change.document.id.clone();
        match change.kind {
            ChangeKind::Added => CollectionChange::Added {
                id,
                data: mapping.get_added(change.document),
            },
            ChangeKind::Modified => CollectionChange::Modified {
                id,
                data: mapping.get_updated(change.document),
            },
            ChangeKind::Removed => CollectionChange::Removed { id },
        }
    }

    fn spawn_forwarder(
        &self,
        collection: String,
        generation: u64,
        mut registration: ListenerRegistration,
    ) -> JoinHandle<()> {
        let mapping = self.mapping.clone();
        let channels = self.channels.clone();

        tokio::spawn(async move {
            loop {
                match registration.next().await {
                    Some(Ok(batch)) => {
                        debug!("{} change(s) on '{}'", batch.len(), collection);
                        let Some(mut channel) = channels.get_mut(&collection) else {
                            break;
                        };
                        if channel.generation != generation {
                            break;
                        }
                        for change in batch {
                            channel.publish(Ok(Self::to_change(&mapping, change)));
                        }
                    }
                    Some(Err(e)) => {
                        error!("Listener on '{}' failed: {}", collection, e);
                        Self::fail(&channels, &collection, generation, e.to_string());
                        break;
                    }
                    None => {
                        info!("Listener on '{}' ended", collection);
                        channels.remove_if(&collection, |_, channel| {
                            channel.generation == generation
                        });
                        break;
                    }
                }
            }
        })
    }
}

#[async_trait]
impl<T, M> CollectionSubscription<T> for DocumentCollectionSubscription<T, M>
where
    T: Entity,
    M: DocumentMapping<T>,
{
    async fn subscribe(&self, collection: &str) -> Result<ChangeStream<T>> {
        let (observer, receiver) = mpsc::unbounded_channel();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        match self.channels.entry(collection.to_string()) {
            Entry::Occupied(mut occupied) if occupied.get().state != SubscriptionState::Error => {
                debug!("Sharing existing listener on '{}'", collection);
                occupied.get_mut().observers.push(observer);
                return Ok(ChangeStream::new(collection, receiver));
            }
            entry => {
                entry.insert(Channel {
                    observers: vec![observer],
                    state: SubscriptionState::Subscribing,
                    task: None,
                    generation,
                });
            }
        }

        let registration = match self.store.listen(collection).await {
            Ok(registration) => registration,
            Err(e) => {
                error!("Failed to attach listener on '{}': {}", collection, e);
                Self::fail(&self.channels, collection, generation, e.to_string());
                return Err(e);
            }
        };

        let task = self.spawn_forwarder(collection.to_string(), generation, registration);
        match self.channels.get_mut(collection) {
            Some(mut channel) if channel.generation == generation => {
                channel.state = SubscriptionState::Active;
                channel.task = Some(task);
                info!("Subscribed to '{}'", collection);
            }
            _ => {
                // Unsubscribed while the listener was being attached
                debug!("Dropping listener on '{}' attached after unsubscribe", collection);
                task.abort();
            }
        }

        Ok(ChangeStream::new(collection, receiver))
    }

    fn unsubscribe(&self, collection: &str) {
        if let Some((_, channel)) = self.channels.remove(collection) {
            if let Some(task) = channel.task {
                task.abort();
            }
            info!("Unsubscribed from '{}'", collection);
        }
    }

    fn close(&self) {
        let names: Vec<String> = self
            .channels
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for name in names {
            self.unsubscribe(&name);
        }
    }

    fn state(&self, collection: &str) -> SubscriptionState {
        self.channels
            .get(collection)
            .map_or(SubscriptionState::Unsubscribed, |channel| channel.state)
    }

    fn observer_count(&self, collection: &str) -> usize {
        self.channels.get(collection).map_or(0, |channel| {
            channel
                .observers
                .iter()
                .filter(|observer| !observer.is_closed())
                .count()
        })
    }
}

impl<T, M> Drop for DocumentCollectionSubscription<T, M> {
    fn drop(&mut self) {
        for mut entry in self.channels.iter_mut() {
            if let Some(task) = entry.task.take() {
                task.abort();
            }
        }
        self.channels.clear();
    }
}
