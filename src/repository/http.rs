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

// Plain REST backend: flat JSON records, no paging metadata

use super::{query_param, Filters, Repository};
use crate::config::EntityConfig;
use crate::error::{Error, Result};
use crate::mapping::Mapping;
use crate::models::{Entity, Listing};
use crate::transport::{join_url, record_url, HttpTransport};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use tracing::debug;

pub struct HttpRepository<T, M> {
    transport: HttpTransport,
    resource: String,
    base_url: String,
    mapping: M,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity, M: Mapping<T>> HttpRepository<T, M> {
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

    async fn fetch(&self, id: &str) -> Result<Option<M::Raw>>
    where
        M::Raw: DeserializeOwned,
    {
        let request = self.transport.request(Method::GET, &self.record_url(id));
        self.transport.send_optional(request).await
    }
}

#[async_trait]
impl<T, M> Repository<T> for HttpRepository<T, M>
where
    T: Entity,
    M: Mapping<T>,
    M::Raw: DeserializeOwned,
{
    async fn get_all(&self, page: u32, page_size: u32, filters: &Filters) -> Result<Listing<T>> {
        let mut params = vec![
            ("page".to_string(), page.to_string()),
            ("pageSize".to_string(), page_size.to_string()),
        ];
        for (field, value) in filters {
            let (field, value) = self.mapping.set_filter(field, value);
            params.push((field, query_param(&value)));
        }

        let request = self
            .transport
            .request(Method::GET, &self.base_url)
            .query(&params);
        let records: Vec<M::Raw> = self.transport.send(request).await?;
        debug!("Fetched {} {} records", records.len(), self.resource);

        Ok(Listing::Items(
            records.into_iter().map(|r| self.mapping.get_one(r)).collect(),
        ))
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<T>> {
        Ok(self.fetch(id).await?.map(|raw| self.mapping.get_one(raw)))
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
        match self.transport.send_optional::<M::Raw>(request).await? {
            Some(updated) => Ok(self.mapping.get_updated(updated)),
            None => Err(Error::not_found(&self.resource, id)),
        }
    }

    async fn delete(&self, id: &str) -> Result<T> {
        // The server may not echo the record, so read it first
        let existing = self
            .fetch(id)
            .await?
            .ok_or_else(|| Error::not_found(&self.resource, id))?;

        let request = self.transport.request(Method::DELETE, &self.record_url(id));
        self.transport.send_empty(request).await?;
        Ok(self.mapping.get_deleted(existing))
    }

    fn backend_type(&self) -> &str {
        "http"
    }
}
