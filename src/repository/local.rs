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

// Local key-value backend
//
// The whole collection lives as one JSON array under the resource key.
// Writes are read-modify-write cycles serialized by a mutex.

use super::{page_offset, Filters, Repository};
use crate::error::{Error, Result};
use crate::kv::KeyValueStore;
use crate::mapping::Mapping;
use crate::models::{Entity, Listing};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

type Record = Map<String, Value>;

pub struct LocalStorageRepository<T, M> {
    store: Arc<dyn KeyValueStore>,
    key: String,
    mapping: M,
    write_lock: Mutex<()>,
    _entity: PhantomData<fn() -> T>,
}

fn record_id(record: &Record) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

impl<T, M> LocalStorageRepository<T, M>
where
    T: Entity,
    M: Mapping<T>,
    M::Raw: DeserializeOwned,
{
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, mapping: M) -> Self {
        Self {
            store,
            key: key.into(),
            mapping,
            write_lock: Mutex::new(()),
            _entity: PhantomData,
        }
    }

    async fn load(&self) -> Result<Vec<Record>> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(Vec::new());
        };
        let values: Vec<Value> = serde_json::from_str(&raw)?;
        Ok(values
            .into_iter()
            .filter_map(|value| match value {
                Value::Object(record) => Some(record),
                other => {
                    warn!("Skipping non-object entry in '{}': {}", self.key, other);
                    None
                }
            })
            .collect())
    }

    async fn save(&self, records: Vec<Record>) -> Result<()> {
        let values: Vec<Value> = records.into_iter().map(Value::Object).collect();
        self.store
            .set(&self.key, serde_json::to_string(&values)?)
            .await
    }

    fn decode(&self, record: Record) -> Result<M::Raw> {
        Ok(serde_json::from_value(Value::Object(record))?)
    }

    fn missing(&self, id: &str) -> Error {
        Error::not_found(&self.key, id)
    }
}

/// Serialized body as a JSON object
fn to_record(body: &impl serde::Serialize) -> Result<Record> {
    match serde_json::to_value(body)? {
        Value::Object(record) => Ok(record),
        other => Err(Error::Document(format!(
            "expected an object record, got {}",
            other
        ))),
    }
}

#[async_trait]
impl<T, M> Repository<T> for LocalStorageRepository<T, M>
where
    T: Entity,
    M: Mapping<T>,
    M::Raw: DeserializeOwned,
{
    async fn get_all(&self, page: u32, page_size: u32, filters: &Filters) -> Result<Listing<T>> {
        let constraints: Vec<(String, Value)> = filters
            .iter()
            .map(|(field, value)| self.mapping.set_filter(field, value))
            .collect();

        let matching: Vec<Record> = self
            .load()
            .await?
            .into_iter()
            .filter(|record| {
                constraints
                    .iter()
                    .all(|(field, value)| record.get(field) == Some(value))
            })
            .collect();
        let total = matching.len() as u64;

        let raw = matching
            .into_iter()
            .skip(page_offset(page, page_size))
            .take(page_size as usize)
            .map(|record| self.decode(record))
            .collect::<Result<Vec<_>>>()?;
        debug!("Read {} of {} '{}' records", raw.len(), total, self.key);

        Ok(Listing::Paginated(
            self.mapping.get_paginated(page, page_size, total, raw),
        ))
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<T>> {
        let found = self
            .load()
            .await?
            .into_iter()
            .find(|record| record_id(record) == Some(id));
        match found {
            Some(record) => Ok(Some(self.mapping.get_one(self.decode(record)?))),
            None => Ok(None),
        }
    }

    async fn add(&self, entity: T) -> Result<T> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        let mut record = to_record(&self.mapping.set_add(&entity))?;
        let id = uuid::Uuid::new_v4().to_string();
        record.insert("id".to_string(), Value::String(id));
        records.push(record.clone());
        self.save(records).await?;

        Ok(self.mapping.get_added(self.decode(record)?))
    }

    async fn update(&self, id: &str, patch: T::Patch) -> Result<T> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        let stored = records
            .iter_mut()
            .find(|record| record_id(record) == Some(id))
            .ok_or_else(|| self.missing(id))?;
        for (field, value) in to_record(&self.mapping.set_update(&patch))? {
            stored.insert(field, value);
        }
        let merged = stored.clone();
        self.save(records).await?;

        Ok(self.mapping.get_updated(self.decode(merged)?))
    }

    async fn delete(&self, id: &str) -> Result<T> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        let index = records
            .iter()
            .position(|record| record_id(record) == Some(id))
            .ok_or_else(|| self.missing(id))?;
        let removed = records.remove(index);
        self.save(records).await?;

        Ok(self.mapping.get_deleted(self.decode(removed)?))
    }

    fn backend_type(&self) -> &str {
        "local-storage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKeyValueStore;
    use crate::mapping::{LocalGroupMapping, LocalPersonMapping};
    use crate::models::{Gender, Group, Person, PersonPatch};
    use serde_json::json;

    fn people(store: Arc<MemoryKeyValueStore>) -> LocalStorageRepository<Person, LocalPersonMapping> {
        LocalStorageRepository::new(store, "people", LocalPersonMapping)
    }

    #[tokio::test]
    async fn test_add_assigns_uuid_and_stores_array() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let repo = people(store.clone());

        let person = repo
            .add(Person::new("Ana", "Lopez", Gender::Female))
            .await
            .unwrap();
        assert!(uuid::Uuid::parse_str(&person.id).is_ok());

        let raw = store.get("people").await.unwrap().unwrap();
        let stored: Vec<Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["gender"], "female");
        assert_eq!(stored[0]["id"], json!(person.id));
    }

    #[tokio::test]
    async fn test_update_merges_patch() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let repo = people(store);

        let mut person = Person::new("Ana", "Lopez", Gender::Female);
        person.age = Some(30);
        person.group_id = Some("g1".to_string());
        let person = repo.add(person).await.unwrap();

        let updated = repo
            .update(
                &person.id,
                PersonPatch {
                    name: Some("Eva".to_string()),
                    group_id: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Eva");
        assert_eq!(updated.surname, "Lopez");
        assert_eq!(updated.age, Some(30));
        assert_eq!(updated.group_id, None);
        assert_eq!(repo.get_by_id(&person.id).await.unwrap(), Some(updated));

        assert!(repo
            .update("missing", PersonPatch::default())
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_paging_filters_and_delete() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let repo: LocalStorageRepository<Group, _> =
            LocalStorageRepository::new(store, "groups", LocalGroupMapping);

        for i in 0..25 {
            repo.add(Group::new(format!("g{}", i % 2))).await.unwrap();
        }

        let listing = repo.get_all(2, 10, &Filters::new()).await.unwrap();
        let page = listing.as_paginated().unwrap();
        assert_eq!((page.page, page.page_size, page.pages), (2, 10, 3));
        assert_eq!(page.data.len(), 10);

        let odd = Filters::from([("name".to_string(), json!("g1"))]);
        let listing = repo.get_all(1, 100, &odd).await.unwrap();
        assert_eq!(listing.len(), 12);

        let victim = listing.items()[0].clone();
        assert_eq!(repo.delete(&victim.id).await.unwrap(), victim);
        assert_eq!(repo.get_by_id(&victim.id).await.unwrap(), None);
        assert!(repo.delete(&victim.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_gender_filter_accepts_label() {
        let repo = people(Arc::new(MemoryKeyValueStore::new()));
        repo.add(Person::new("Ana", "Lopez", Gender::Female)).await.unwrap();
        repo.add(Person::new("Luis", "Diaz", Gender::Male)).await.unwrap();

        let filters = Filters::from([("gender".to_string(), json!("Femenino"))]);
        let listing = repo.get_all(1, 10, &filters).await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing.items()[0].name, "Ana");
    }
}
