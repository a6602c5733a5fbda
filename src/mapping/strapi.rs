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

// Strapi v4 records: `{data: {id, attributes}}` envelopes with relations

use super::{gender_filter, id_to_string, Mapping};
use crate::models::{Gender, Group, GroupPatch, Person, PersonPatch, Picture};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrapiData<T> {
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "A: Deserialize<'de> + Default"))]
pub struct StrapiRecord<A> {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub attributes: A,
}

/// A record as returned by single-record endpoints or inside list responses
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged, bound(deserialize = "A: Deserialize<'de> + Default"))]
pub enum StrapiRaw<A> {
    Envelope { data: StrapiRecord<A> },
    Record(StrapiRecord<A>),
}

impl<A> StrapiRaw<A> {
    pub fn into_record(self) -> StrapiRecord<A> {
        match self {
            StrapiRaw::Envelope { data } => data,
            StrapiRaw::Record(record) => record,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrapiPersonAttributes {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub group: Option<Value>,
    #[serde(default)]
    pub picture: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrapiPersonBody {
    pub name: String,
    pub surname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    pub gender: &'static str,
    pub group: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StrapiPersonPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<Option<u64>>,
}

/// Relations are numeric in Strapi; anything else cannot reference a row
fn group_relation(group_id: Option<&String>) -> Option<u64> {
    group_id.and_then(|id| id.trim().parse().ok())
}

/// `group` is a populated relation, a bare id, or null
fn decode_group(group: Option<Value>) -> Option<String> {
    match group? {
        Value::Object(relation) => relation
            .get("data")
            .and_then(|data| data.get("id"))
            .map(id_to_string)
            .filter(|id| !id.is_empty()),
        Value::Number(id) => Some(id.to_string()),
        Value::String(id) if !id.is_empty() => Some(id),
        _ => None,
    }
}

/// Populated media relation with optional responsive formats
fn decode_picture(picture: Option<Value>) -> Option<Picture> {
    let picture = picture?;
    let attributes = picture.get("data")?.get("attributes")?;
    let url = attributes.get("url")?.as_str()?.to_string();
    let format = |name: &str| {
        attributes
            .get("formats")
            .and_then(|formats| formats.get(name))
            .and_then(|f| f.get("url"))
            .and_then(Value::as_str)
            .map_or_else(|| url.clone(), str::to_string)
    };
    Some(Picture {
        large: format("large"),
        medium: format("medium"),
        small: format("small"),
        thumbnail: format("thumbnail"),
        url: url.clone(),
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StrapiPersonMapping;

impl Mapping<Person> for StrapiPersonMapping {
    type Create = StrapiData<StrapiPersonBody>;
    type Update = StrapiData<StrapiPersonPatch>;
    type Raw = StrapiRaw<StrapiPersonAttributes>;

    fn set_add(&self, person: &Person) -> Self::Create {
        StrapiData {
            data: StrapiPersonBody {
                name: person.name.clone(),
                surname: person.surname.clone(),
                age: person.age,
                gender: person.gender.as_wire(),
                group: group_relation(person.group_id.as_ref()),
            },
        }
    }

    fn set_update(&self, patch: &PersonPatch) -> Self::Update {
        StrapiData {
            data: StrapiPersonPatch {
                name: patch.name.clone(),
                surname: patch.surname.clone(),
                age: patch.age,
                gender: patch.gender.map(Gender::as_wire),
                group: patch
                    .group_id
                    .as_ref()
                    .map(|group_id| group_relation(group_id.as_ref())),
            },
        }
    }

    fn get_one(&self, raw: Self::Raw) -> Person {
        let record = raw.into_record();
        let attributes = record.attributes;
        Person {
            id: id_to_string(&record.id),
            name: attributes.name,
            surname: attributes.surname,
            age: attributes.age,
            gender: Gender::from_wire_or_default(attributes.gender.as_deref()),
            group_id: decode_group(attributes.group),
            user_id: None,
            picture: decode_picture(attributes.picture),
        }
    }

    /// Dotted names address nested attributes, e.g. `group.id`
    fn set_filter(&self, field: &str, value: &Value) -> (String, Value) {
        match field {
            "gender" => (field.to_string(), gender_filter(value)),
            "groupId" => ("group.id".to_string(), value.clone()),
            _ => (field.to_string(), value.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrapiGroupAttributes {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrapiGroupBody {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StrapiGroupPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StrapiGroupMapping;

impl Mapping<Group> for StrapiGroupMapping {
    type Create = StrapiData<StrapiGroupBody>;
    type Update = StrapiData<StrapiGroupPatch>;
    type Raw = StrapiRaw<StrapiGroupAttributes>;

    fn set_add(&self, group: &Group) -> Self::Create {
        StrapiData {
            data: StrapiGroupBody {
                name: group.name.clone(),
            },
        }
    }

    fn set_update(&self, patch: &GroupPatch) -> Self::Update {
        StrapiData {
            data: StrapiGroupPatch {
                name: patch.name.clone(),
            },
        }
    }

    fn get_one(&self, raw: Self::Raw) -> Group {
        let record = raw.into_record();
        Group {
            id: id_to_string(&record.id),
            name: record.attributes.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person_raw(value: Value) -> StrapiRaw<StrapiPersonAttributes> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_create_and_echo() {
        let person = Person::new("Ana", "Lopez", Gender::Male);
        let body = serde_json::to_value(StrapiPersonMapping.set_add(&person)).unwrap();
        assert_eq!(
            body,
            json!({"data": {"name": "Ana", "surname": "Lopez", "gender": "male", "group": null}})
        );

        let echoed = StrapiPersonMapping.get_added(person_raw(json!({
            "data": {
                "id": 7,
                "attributes": {"name": "Ana", "surname": "Lopez", "gender": "male", "group": null}
            },
            "meta": {}
        })));
        assert_eq!(echoed.id, "7");
        assert_eq!(echoed.name, "Ana");
        assert_eq!(echoed.gender, Gender::Male);
        assert_eq!(echoed.group_id, None);
        assert_eq!(serde_json::to_value(&echoed).unwrap()["gender"], "Masculino");
    }

    #[test]
    fn test_gender_survives_write_and_read() {
        for gender in Gender::ALL {
            let person = Person::new("Ana", "Lopez", gender);
            let body = serde_json::to_value(StrapiPersonMapping.set_add(&person)).unwrap();

            let stored = person_raw(json!({"id": 1, "attributes": body["data"]}));
            assert_eq!(StrapiPersonMapping.get_one(stored).gender, gender);
        }
    }

    #[test]
    fn test_group_relation_shapes() {
        let populated = StrapiPersonMapping.get_one(person_raw(json!({
            "id": 1,
            "attributes": {"name": "A", "group": {"data": {"id": 4, "attributes": {"name": "Ops"}}}}
        })));
        assert_eq!(populated.group_id.as_deref(), Some("4"));

        let bare = StrapiPersonMapping.get_one(person_raw(json!({
            "id": 2,
            "attributes": {"name": "B", "group": 9}
        })));
        assert_eq!(bare.group_id.as_deref(), Some("9"));

        let empty = StrapiPersonMapping.get_one(person_raw(json!({
            "id": 3,
            "attributes": {"name": "C", "group": {"data": null}}
        })));
        assert_eq!(empty.group_id, None);
        assert_eq!(empty.gender, Gender::Other);
    }

    #[test]
    fn test_picture_formats() {
        let person = StrapiPersonMapping.get_one(person_raw(json!({
            "id": 1,
            "attributes": {
                "name": "A",
                "picture": {"data": {"id": 3, "attributes": {
                    "url": "/uploads/a.png",
                    "formats": {"thumbnail": {"url": "/uploads/thumb_a.png"}}
                }}}
            }
        })));
        let picture = person.picture.unwrap();
        assert_eq!(picture.url, "/uploads/a.png");
        assert_eq!(picture.thumbnail, "/uploads/thumb_a.png");
        assert_eq!(picture.large, "/uploads/a.png");
    }

    #[test]
    fn test_update_omits_unset_fields() {
        let patch = PersonPatch {
            gender: Some(Gender::Female),
            group_id: Some(Some("12".to_string())),
            ..Default::default()
        };
        let body = serde_json::to_value(StrapiPersonMapping.set_update(&patch)).unwrap();
        assert_eq!(body, json!({"data": {"gender": "female", "group": 12}}));

        let cleared = PersonPatch {
            group_id: Some(None),
            ..Default::default()
        };
        let body = serde_json::to_value(StrapiPersonMapping.set_update(&cleared)).unwrap();
        assert_eq!(body, json!({"data": {"group": null}}));
    }

    #[test]
    fn test_filters_target_relations() {
        assert_eq!(
            StrapiPersonMapping.set_filter("groupId", &json!("4")),
            ("group.id".to_string(), json!("4"))
        );
        assert_eq!(
            StrapiPersonMapping.set_filter("gender", &json!("Otros")),
            ("gender".to_string(), json!("other"))
        );
    }

    #[test]
    fn test_group_mapping() {
        let raw: StrapiRaw<StrapiGroupAttributes> =
            serde_json::from_value(json!({"data": {"id": 2, "attributes": {"name": "Ops"}}, "meta": {}}))
                .unwrap();
        assert_eq!(StrapiGroupMapping.get_one(raw), Group { id: "2".into(), name: "Ops".into() });
    }
}
