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

// Records kept by the local key-value backend
//
// The stored shape mirrors the canonical entity except that gender is
// kept as its raw value. Patches reuse the flat REST patch bodies, which
// the repository merges key by key into the stored record.

use super::rest::{RestGroupPatch, RestPersonPatch};
use super::{gender_filter, Mapping, RestGroupMapping, RestPersonMapping};
use crate::models::{Gender, Group, GroupPatch, Person, PersonPatch, Picture};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalPerson {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<Picture>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalPersonMapping;

impl Mapping<Person> for LocalPersonMapping {
    type Create = LocalPerson;
    type Update = RestPersonPatch;
    type Raw = LocalPerson;

    fn set_add(&self, person: &Person) -> LocalPerson {
        LocalPerson {
            id: person.id.clone(),
            name: person.name.clone(),
            surname: person.surname.clone(),
            age: person.age,
            gender: person.gender.as_wire().to_string(),
            group_id: person.group_id.clone(),
            user_id: person.user_id.clone(),
            picture: person.picture.clone(),
        }
    }

    fn set_update(&self, patch: &PersonPatch) -> RestPersonPatch {
        RestPersonMapping.set_update(patch)
    }

    fn get_one(&self, raw: LocalPerson) -> Person {
        Person {
            id: raw.id,
            name: raw.name,
            surname: raw.surname,
            age: raw.age,
            gender: Gender::from_wire_or_default(Some(&raw.gender)),
            group_id: raw.group_id,
            user_id: raw.user_id,
            picture: raw.picture,
        }
    }

    fn set_filter(&self, field: &str, value: &Value) -> (String, Value) {
        match field {
            "gender" => (field.to_string(), gender_filter(value)),
            _ => (field.to_string(), value.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalGroup {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalGroupMapping;

impl Mapping<Group> for LocalGroupMapping {
    type Create = LocalGroup;
    type Update = RestGroupPatch;
    type Raw = LocalGroup;

    fn set_add(&self, group: &Group) -> LocalGroup {
        LocalGroup {
            id: group.id.clone(),
            name: group.name.clone(),
        }
    }

    fn set_update(&self, patch: &GroupPatch) -> RestGroupPatch {
        RestGroupMapping.set_update(patch)
    }

    fn get_one(&self, raw: LocalGroup) -> Group {
        Group {
            id: raw.id,
            name: raw.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_person_record_shape() {
        let mut person = Person::new("Ana", "Lopez", Gender::Other);
        person.id = "abc".to_string();

        let stored = serde_json::to_value(LocalPersonMapping.set_add(&person)).unwrap();
        assert_eq!(
            stored,
            json!({"id": "abc", "name": "Ana", "surname": "Lopez", "gender": "other"})
        );

        let raw: LocalPerson = serde_json::from_value(stored).unwrap();
        assert_eq!(LocalPersonMapping.get_one(raw), person);
    }

    #[test]
    fn test_gender_survives_write_and_read() {
        for gender in Gender::ALL {
            let stored = LocalPersonMapping.set_add(&Person::new("Ana", "Lopez", gender));
            assert_eq!(LocalPersonMapping.get_one(stored).gender, gender);
        }
    }
}
