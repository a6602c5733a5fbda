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

// Translation between canonical entities and backend wire records
//
// Mappings are pure: they never perform I/O and never fail. Malformed or
// missing wire fields decode to neutral defaults.

pub mod document;
pub mod local;
pub mod rest;
pub mod strapi;

pub use document::{DocumentGroupMapping, DocumentMapping, DocumentPersonMapping};
pub use local::{LocalGroupMapping, LocalPersonMapping};
pub use rest::{RestGroupMapping, RestPersonMapping};
pub use strapi::{StrapiGroupMapping, StrapiPersonMapping};

use crate::models::{Entity, Gender, Paginated};
use serde::Serialize;
use serde_json::Value;

pub trait Mapping<T: Entity>: Send + Sync + 'static {
    /// Body sent when creating a record
    type Create: Serialize + Send + Sync;
    /// Body sent for a partial update; carries only the fields set on the patch
    type Update: Serialize + Send + Sync;
    /// Record as the backend returns it
    type Raw: Send;

    fn set_add(&self, entity: &T) -> Self::Create;

    fn set_update(&self, patch: &T::Patch) -> Self::Update;

    fn get_one(&self, raw: Self::Raw) -> T;

    fn get_paginated(
        &self,
        page: u32,
        page_size: u32,
        total: u64,
        raw: Vec<Self::Raw>,
    ) -> Paginated<T> {
        let data = raw.into_iter().map(|r| self.get_one(r)).collect();
        Paginated::from_total(page, page_size, total, data)
    }

    fn get_added(&self, raw: Self::Raw) -> T {
        self.get_one(raw)
    }

    fn get_updated(&self, raw: Self::Raw) -> T {
        self.get_one(raw)
    }

    fn get_deleted(&self, raw: Self::Raw) -> T {
        self.get_one(raw)
    }

    /// Translate an equality filter on a canonical field into the backend's
    /// field name and stored value
    fn set_filter(&self, field: &str, value: &Value) -> (String, Value) {
        (field.to_string(), value.clone())
    }
}

/// Gender filters may be given as display labels; backends store the raw value
pub(crate) fn gender_filter(value: &Value) -> Value {
    match value.as_str().and_then(|v| v.parse::<Gender>().ok()) {
        Some(gender) => Value::String(gender.as_wire().to_string()),
        None => value.clone(),
    }
}

/// Render a JSON id (number or string) as the canonical string form
pub(crate) fn id_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_to_string() {
        assert_eq!(id_to_string(&json!(7)), "7");
        assert_eq!(id_to_string(&json!("a1")), "a1");
        assert_eq!(id_to_string(&json!(null)), "");
    }

    #[test]
    fn test_gender_filter_uses_wire_value() {
        assert_eq!(gender_filter(&json!("Femenino")), json!("female"));
        assert_eq!(gender_filter(&json!("male")), json!("male"));
        assert_eq!(gender_filter(&json!(3)), json!(3));
    }
}
