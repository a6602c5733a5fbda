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

// Flat REST records shared by the plain HTTP and json-server backends

use super::{gender_filter, id_to_string, Mapping};
use crate::models::{Gender, Group, GroupPatch, Person, PersonPatch, Picture};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestPerson {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub group_id: Option<Value>,
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub picture: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestPersonBody {
    pub name: String,
    pub surname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    pub gender: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<Picture>,
}

/// `Some(None)` fields serialize as `null` to clear the stored value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestPersonPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<Option<Picture>>,
}

fn optional_id(value: Option<Value>) -> Option<String> {
    value
        .as_ref()
        .map(id_to_string)
        .filter(|id| !id.is_empty())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RestPersonMapping;

impl Mapping<Person> for RestPersonMapping {
    type Create = RestPersonBody;
    type Update = RestPersonPatch;
    type Raw = RestPerson;

    fn set_add(&self, person: &Person) -> RestPersonBody {
        RestPersonBody {
            name: person.name.clone(),
            surname: person.surname.clone(),
            age: person.age,
            gender: person.gender.as_wire(),
            group_id: person.group_id.clone(),
            user_id: person.user_id.clone(),
            picture: person.picture.clone(),
        }
    }

    fn set_update(&self, patch: &PersonPatch) -> RestPersonPatch {
        RestPersonPatch {
            name: patch.name.clone(),
            surname: patch.surname.clone(),
            age: patch.age,
            gender: patch.gender.map(Gender::as_wire),
            group_id: patch.group_id.clone(),
            user_id: patch.user_id.clone(),
            picture: patch.picture.clone(),
        }
    }

    fn get_one(&self, raw: RestPerson) -> Person {
        Person {
            id: id_to_string(&raw.id),
            name: raw.name,
            surname: raw.surname,
            age: raw.age,
            gender: Gender::from_wire_or_default(raw.gender.as_deref()),
            group_id: optional_id(raw.group_id),
            user_id: optional_id(raw.user_id),
            picture: raw.picture.and_then(|p| serde_json::from_value(p).ok()),
        }
    }

    fn set_filter(&self, field: &str, value: &Value) -> (String, Value) {
        match field {
            "gender" => (field.to_string(), gender_filter(value)),
            _ => (field.to_string(), value.clone()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestGroup {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestGroupBody {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RestGroupPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RestGroupMapping;

impl Mapping<Group> for RestGroupMapping {
    type Create = RestGroupBody;
    type Update = RestGroupPatch;
    type Raw = RestGroup;

    fn set_add(&self, group: &Group) -> RestGroupBody {
        RestGroupBody {
            name: group.name.clone(),
        }
    }

    fn set_update(&self, patch: &GroupPatch) -> RestGroupPatch {
        RestGroupPatch {
            name: patch.name.clone(),
        }
    }

    fn get_one(&self, raw: RestGroup) -> Group {
        Group {
            id: id_to_string(&raw.id),
            name: raw.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_person_add_uses_raw_gender() {
        let mut person = Person::new("Ana", "Lopez", Gender::Female);
        person.group_id = Some("3".to_string());

        let body = serde_json::to_value(RestPersonMapping.set_add(&person)).unwrap();
        assert_eq!(
            body,
            json!({"name": "Ana", "surname": "Lopez", "gender": "female", "groupId": "3"})
        );
    }

    #[test]
    fn test_gender_survives_write_and_read() {
        for gender in Gender::ALL {
            let person = Person::new("Ana", "Lopez", gender);
            let mut body = serde_json::to_value(RestPersonMapping.set_add(&person)).unwrap();
            body["id"] = json!(1);

            let raw: RestPerson = serde_json::from_value(body).unwrap();
            assert_eq!(RestPersonMapping.get_one(raw).gender, gender);
        }
    }

    #[test]
    fn test_person_update_only_set_fields() {
        let patch = PersonPatch {
            surname: Some("Garcia".to_string()),
            group_id: Some(None),
            ..Default::default()
        };
        let body = serde_json::to_value(RestPersonMapping.set_update(&patch)).unwrap();
        assert_eq!(body, json!({"surname": "Garcia", "groupId": null}));

        let empty = serde_json::to_value(RestPersonMapping.set_update(&PersonPatch::default()));
        assert_eq!(empty.unwrap(), json!({}));
    }

    #[test]
    fn test_person_decode_is_lenient() {
        let raw: RestPerson = serde_json::from_value(json!({
            "id": 12,
            "name": "Luis",
            "gender": "unknown",
            "groupId": 4,
            "picture": "not-a-picture"
        }))
        .unwrap();

        let person = RestPersonMapping.get_one(raw);
        assert_eq!(person.id, "12");
        assert_eq!(person.surname, "");
        assert_eq!(person.gender, Gender::Other);
        assert_eq!(person.group_id.as_deref(), Some("4"));
        assert_eq!(person.picture, None);
    }

    #[test]
    fn test_group_mapping() {
        let raw: RestGroup = serde_json::from_value(json!({"id": "g1", "name": "Ops"})).unwrap();
        assert_eq!(RestGroupMapping.get_one(raw), Group { id: "g1".into(), name: "Ops".into() });
        assert_eq!(
            serde_json::to_value(RestGroupMapping.set_update(&GroupPatch::default())).unwrap(),
            json!({})
        );
    }
}
