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

// In-process document store
//
// Backs the firebase backend when no remote project is configured and
// serves as the reference behaviour for the REST client.

use super::{
    Document, DocumentChange, DocumentStore, Fields, ListenerBatch, ListenerRegistration, Query,
};
use crate::error::{Error, Result};
use crate::models::ChangeKind;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::debug;

type Collection = BTreeMap<String, Fields>;

struct Listener {
    id: u64,
    sender: mpsc::UnboundedSender<ListenerBatch>,
}

#[derive(Default)]
struct Inner {
    // Lock order: `collections` shard before `listeners` shard
    collections: DashMap<String, Collection>,
    listeners: DashMap<String, Vec<Listener>>,
    next_listener: AtomicU64,
    listen_calls: AtomicUsize,
}

impl Inner {
    fn notify(&self, collection: &str, changes: Vec<DocumentChange>) {
        if let Some(mut listeners) = self.listeners.get_mut(collection) {
            listeners.retain(|listener| listener.sender.send(Ok(changes.clone())).is_ok());
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<Inner>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `listen` calls served so far
    pub fn listen_calls(&self) -> usize {
        self.inner.listen_calls.load(Ordering::Relaxed)
    }

    /// Listeners currently attached to `collection`
    pub fn active_listeners(&self, collection: &str) -> usize {
        self.inner
            .listeners
            .get(collection)
            .map(|l| l.iter().filter(|l| !l.sender.is_closed()).count())
            .unwrap_or(0)
    }

    fn detach(inner: Weak<Inner>, collection: String, id: u64) {
        if let Some(inner) = inner.upgrade() {
            if let Some(mut listeners) = inner.listeners.get_mut(&collection) {
                listeners.retain(|l| l.id != id);
            }
            debug!("Detached listener {} from '{}'", id, collection);
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        Ok(self
            .inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id).cloned())
            .map(|fields| Document::new(id, fields)))
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let mut docs = self.inner.collections.entry(collection.to_string()).or_default();
        docs.insert(id.clone(), fields.clone());
        self.inner.notify(
            collection,
            vec![DocumentChange {
                kind: ChangeKind::Added,
                document: Document::new(id.clone(), fields),
            }],
        );
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let mut docs = self
            .inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| Error::not_found(collection, id))?;
        let stored = docs
            .get_mut(id)
            .ok_or_else(|| Error::not_found(collection, id))?;
        stored.extend(fields);
        let document = Document::new(id, stored.clone());
        self.inner.notify(
            collection,
            vec![DocumentChange {
                kind: ChangeKind::Modified,
                document,
            }],
        );
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        if let Some(mut docs) = self.inner.collections.get_mut(collection) {
            if let Some(fields) = docs.remove(id) {
                self.inner.notify(
                    collection,
                    vec![DocumentChange {
                        kind: ChangeKind::Removed,
                        document: Document::new(id, fields),
                    }],
                );
            }
        }
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
        let Some(docs) = self.inner.collections.get(collection) else {
            return Ok(Vec::new());
        };
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(docs
            .iter()
            .filter(|(id, _)| {
                query
                    .start_after
                    .as_deref()
                    .map_or(true, |cursor| id.as_str() > cursor)
            })
            .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
            .filter(|doc| query.matches(doc))
            .take(limit)
            .collect())
    }

    async fn count(&self, collection: &str, query: &Query) -> Result<u64> {
        let Some(docs) = self.inner.collections.get(collection) else {
            return Ok(0);
        };
        let count = docs
            .iter()
            .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
            .filter(|doc| query.matches(doc))
            .count();
        Ok(count as u64)
    }

    async fn listen(&self, collection: &str) -> Result<ListenerRegistration> {
        self.inner.listen_calls.fetch_add(1, Ordering::Relaxed);
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();

        // Hold the collection while registering so no write slips between
        // the initial snapshot and the first notification
        let docs = self.inner.collections.entry(collection.to_string()).or_default();
        let snapshot: Vec<DocumentChange> = docs
            .iter()
            .map(|(doc_id, fields)| DocumentChange {
                kind: ChangeKind::Added,
                document: Document::new(doc_id.clone(), fields.clone()),
            })
            .collect();
        let _ = sender.send(Ok(snapshot));
        self.inner
            .listeners
            .entry(collection.to_string())
            .or_default()
            .push(Listener { id, sender });
        drop(docs);

        debug!("Attached listener {} to '{}'", id, collection);
        let inner = Arc::downgrade(&self.inner);
        let collection = collection.to_string();
        Ok(ListenerRegistration::new(receiver, move || {
            Self::detach(inner, collection, id)
        }))
    }

    fn store_type(&self) -> &str {
        "memory"
    }
}
