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

// Document database backend

use super::{page_offset, Filters, Repository};
use crate::docstore::{DocumentStore, Query};
use crate::error::{Error, Result};
use crate::mapping::DocumentMapping;
use crate::models::{Entity, Listing};
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

pub struct DocumentRepository<T, M> {
    store: Arc<dyn DocumentStore>,
    collection: String,
    mapping: M,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity, M: DocumentMapping<T>> DocumentRepository<T, M> {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>, mapping: M) -> Self {
        Self {
            store,
            collection: collection.into(),
            mapping,
            _entity: PhantomData,
        }
    }

    fn filtered(&self, filters: &Filters) -> Query {
        filters.iter().fold(Query::new(), |query, (field, value)| {
            let (field, value) = self.mapping.query_filter(field, value);
            query.where_eq(field, value)
        })
    }

    fn missing(&self, id: &str) -> Error {
        Error::not_found(&self.collection, id)
    }
}

#[async_trait]
impl<T, M> Repository<T> for DocumentRepository<T, M>
where
    T: Entity,
    M: DocumentMapping<T>,
{
    async fn get_all(&self, page: u32, page_size: u32, filters: &Filters) -> Result<Listing<T>> {
        let base = self.filtered(filters);
        let total = self.store.count(&self.collection, &base).await?;

        // Walk past the preceding pages and resume after the last id seen
        let skip = page_offset(page, page_size);
        let mut query = base.clone().limit(page_size as usize);
        if skip > 0 {
            let preceding = self
                .store
                .query(&self.collection, &base.clone().limit(skip))
                .await?;
            match preceding.last() {
                Some(last) if preceding.len() == skip => query = query.start_after(last.id.clone()),
                _ => {
                    debug!("Page {} of {} is past the end", page, self.collection);
                    return Ok(Listing::Paginated(
                        self.mapping.get_paginated(page, page_size, total, Vec::new()),
                    ));
                }
            }
        }

        let documents = self.store.query(&self.collection, &query).await?;
        Ok(Listing::Paginated(
            self.mapping.get_paginated(page, page_size, total, documents),
        ))
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<T>> {
        let document = self.store.get(&self.collection, id).await?;
        Ok(document.map(|doc| self.mapping.get_one(doc)))
    }

    async fn add(&self, entity: T) -> Result<T> {
        let id = self
            .store
            .add(&self.collection, self.mapping.set_add(&entity))
            .await?;
        let created = self
            .store
            .get(&self.collection, &id)
            .await?
            .ok_or_else(|| self.missing(&id))?;
        Ok(self.mapping.get_added(created))
    }

    async fn update(&self, id: &str, patch: T::Patch) -> Result<T> {
        self.store
            .update(&self.collection, id, self.mapping.set_update(&patch))
            .await?;
        let updated = self
            .store
            .get(&self.collection, id)
            .await?
            .ok_or_else(|| self.missing(id))?;
        Ok(self.mapping.get_updated(updated))
    }

    async fn delete(&self, id: &str) -> Result<T> {
        let existing = self
            .store
            .get(&self.collection, id)
            .await?
            .ok_or_else(|| self.missing(id))?;
        self.store.delete(&self.collection, id).await?;
        Ok(self.mapping.get_deleted(existing))
    }

    fn backend_type(&self) -> &str {
        "firebase"
    }
}
