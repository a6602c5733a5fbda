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

// json-server v1 backend

use super::{query_param, Filters, Repository};
use crate::config::EntityConfig;
use crate::error::{Error, Result};
use crate::mapping::Mapping;
use crate::models::{Entity, Listing};
use crate::transport::{join_url, record_url, HttpTransport};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::marker::PhantomData;
use tracing::debug;

/// Paged list response. The `first`/`prev`/`next`/`last` links are ignored
/// since pages are addressed by number.
#[derive(Debug, Deserialize)]
pub struct JsonServerPage<R> {
    #[serde(default)]
    pub pages: u32,
    /// Total number of matching records
    #[serde(default)]
    pub items: u64,
    pub data: Vec<R>,
}

pub struct JsonServerRepository<T, M> {
    transport: HttpTransport,
    resource: String,
    base_url: String,
    mapping: M,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity, M: Mapping<T>> JsonServerRepository<T, M> {
    pub fn new(transport: HttpTransport, config: &EntityConfig, mapping: M) -> Self {
        Self {
            transport,
            resource: config.resource.clone(),
            base_url: join_url(&config.api_url, &[&config.resource]),
            mapping,
            _entity: PhantomData,
        }
    }

    fn record_url(&self, id: &str) -> String {
        record_url(&self.base_url, id)
    }

    fn missing(&self, id: &str) -> Error {
        Error::not_found(&self.resource, id)
    }
}

#[async_trait]
impl<T, M> Repository<T> for JsonServerRepository<T, M>
where
    T: Entity,
    M: Mapping<T>,
    M::Raw: DeserializeOwned,
{
    async fn get_all(&self, page: u32, page_size: u32, filters: &Filters) -> Result<Listing<T>> {
        let mut params = vec![
            ("_page".to_string(), page.to_string()),
            ("_per_page".to_string(), page_size.to_string()),
        ];
        for (field, value) in filters {
            let (field, value) = self.mapping.set_filter(field, value);
            params.push((field, query_param(&value)));
        }

        let request = self
            .transport
            .request(Method::GET, &self.base_url)
            .query(&params);
        let response: JsonServerPage<M::Raw> = self.transport.send(request).await?;
        debug!(
            "Fetched page {}/{} of {} ({} total)",
            page, response.pages, self.resource, response.items
        );

        Ok(Listing::Paginated(self.mapping.get_paginated(
            page,
            page_size,
            response.items,
            response.data,
        )))
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<T>> {
        let request = self.transport.request(Method::GET, &self.record_url(id));
        let raw: Option<M::Raw> = self.transport.send_optional(request).await?;
        Ok(raw.map(|raw| self.mapping.get_one(raw)))
    }

    async fn add(&self, entity: T) -> Result<T> {
        let request = self
            .transport
            .request(Method::POST, &self.base_url)
            .json(&self.mapping.set_add(&entity));
        let created: M::Raw = self.transport.send(request).await?;
        Ok(self.mapping.get_added(created))
    }

    async fn update(&self, id: &str, patch: T::Patch) -> Result<T> {
        let request = self
            .transport
            .request(Method::PATCH, &self.record_url(id))
            .json(&self.mapping.set_update(&patch));
        let updated: Option<M::Raw> = self.transport.send_optional(request).await?;
        updated
            .map(|raw| self.mapping.get_updated(raw))
            .ok_or_else(|| self.missing(id))
    }

    async fn delete(&self, id: &str) -> Result<T> {
        // json-server echoes the removed record
        let request = self.transport.request(Method::DELETE, &self.record_url(id));
        let deleted: Option<M::Raw> = self.transport.send_optional(request).await?;
        deleted
            .map(|raw| self.mapping.get_deleted(raw))
            .ok_or_else(|| self.missing(id))
    }

    fn backend_type(&self) -> &str {
        "json-server"
    }
}
