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

// Uniform asynchronous data access over every supported backend

mod document;
mod http;
mod json_server;
mod local;
mod strapi;

pub use document::DocumentRepository;
pub use http::HttpRepository;
pub use json_server::JsonServerRepository;
pub use local::LocalStorageRepository;
pub use strapi::StrapiRepository;

use crate::error::Result;
use crate::models::{Entity, Listing};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

/// Equality constraints on canonical field names, combined with AND
pub type Filters = BTreeMap<String, Value>;

/// Data-access contract shared by every backend
///
/// Pages are 1-based. Transport, status and decode failures surface as
/// errors; repositories never retry.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn get_all(&self, page: u32, page_size: u32, filters: &Filters) -> Result<Listing<T>>;

    /// `None` when the record does not exist
    async fn get_by_id(&self, id: &str) -> Result<Option<T>>;

    /// Persist a new record and return it with its assigned id
    async fn add(&self, entity: T) -> Result<T>;

    /// Apply a partial update and return the merged, persisted record
    async fn update(&self, id: &str, patch: T::Patch) -> Result<T>;

    /// Remove a record and return it as it was just before removal
    async fn delete(&self, id: &str) -> Result<T>;

    fn backend_type(&self) -> &str;
}

/// Render a filter value as a query-string parameter
pub(crate) fn query_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Number of records preceding a 1-based page
pub(crate) fn page_offset(page: u32, page_size: u32) -> usize {
    page.saturating_sub(1) as usize * page_size as usize
}
