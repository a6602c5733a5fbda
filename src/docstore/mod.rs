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

// Document database abstraction
//
// Models the subset of a Firestore-like SDK the repositories need:
// collection-scoped CRUD, equality queries ordered by document id with a
// start-after cursor, a count aggregate, and a snapshot listener.

mod firestore;
mod memory;
mod value;

pub use firestore::FirestoreRest;
pub use memory::MemoryDocumentStore;
pub use value::{DocumentRef, FieldValue, Fields};

use crate::error::Result;
use crate::models::ChangeKind;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// A stored document: its id plus top-level fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(FieldValue::as_i64)
    }

    pub fn get_ref(&self, name: &str) -> Option<&DocumentRef> {
        self.get(name).and_then(FieldValue::as_reference)
    }
}

/// Query over one collection, always ordered by document id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Equality constraints, combined with AND
    pub filters: Vec<(String, FieldValue)>,
    /// Resume after this document id
    pub start_after: Option<String>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.filters.push((field.into(), value));
        self
    }

    pub fn start_after(mut self, id: impl Into<String>) -> Self {
        self.start_after = Some(id.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `document` satisfies every equality constraint
    pub fn matches(&self, document: &Document) -> bool {
        self.filters
            .iter()
            .all(|(field, value)| document.get(field) == Some(value))
    }
}

/// One change reported by a snapshot listener
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChange {
    pub kind: ChangeKind,
    pub document: Document,
}

type ListenerBatch = Result<Vec<DocumentChange>>;

/// Live listener on a collection.
///
/// The first batch describes the current contents as `Added` changes.
/// Dropping the registration detaches the listener from the backend.
pub struct ListenerRegistration {
    receiver: mpsc::UnboundedReceiver<ListenerBatch>,
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerRegistration {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<ListenerBatch>,
        detach: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            receiver,
            detach: Some(Box::new(detach)),
        }
    }

    /// Next batch of changes; `None` once the backend stops the listener
    pub async fn next(&mut self) -> Option<ListenerBatch> {
        self.receiver.recv().await
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Create a document with a generated id and return that id
    async fn add(&self, collection: &str, fields: Fields) -> Result<String>;

    /// Overwrite only the given fields; fails with `NotFound` if the document is missing
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>>;

    /// Number of documents matching the query's filters, ignoring cursor and limit
    async fn count(&self, collection: &str, query: &Query) -> Result<u64>;

    async fn listen(&self, collection: &str) -> Result<ListenerRegistration>;

    fn store_type(&self) -> &str;
}
