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

// Document store records
//
// People keep the owner id in `user` and the picture URL in `picture`, both
// empty strings when unset. `groupId` is a reference into the groups
// collection.

use super::{gender_filter, Mapping};
use crate::docstore::{Document, DocumentRef, FieldValue, Fields};
use crate::models::{Entity, Gender, Group, GroupPatch, Person, PersonPatch, Picture};
use serde_json::Value;

/// Mapping whose wire form is a store document
pub trait DocumentMapping<T: Entity>:
    Mapping<T, Create = Fields, Update = Fields, Raw = Document>
{
    fn query_filter(&self, field: &str, value: &Value) -> (String, FieldValue) {
        let (field, value) = self.set_filter(field, value);
        (field, FieldValue::from(value))
    }
}

fn text(value: &str) -> FieldValue {
    FieldValue::String(value.to_string())
}

fn age_value(age: Option<u32>) -> FieldValue {
    age.map_or(FieldValue::Null, |age| FieldValue::Integer(i64::from(age)))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

#[derive(Debug, Clone)]
pub struct DocumentPersonMapping {
    groups_collection: String,
}

impl DocumentPersonMapping {
    pub fn new(groups_collection: impl Into<String>) -> Self {
        Self {
            groups_collection: groups_collection.into(),
        }
    }

    fn group_ref(&self, group_id: &str) -> FieldValue {
        FieldValue::Reference(DocumentRef::new(self.groups_collection.clone(), group_id))
    }

    fn group_value(&self, group_id: Option<&String>) -> FieldValue {
        match group_id {
            Some(id) if !id.is_empty() => self.group_ref(id),
            _ => FieldValue::Null,
        }
    }
}

impl Default for DocumentPersonMapping {
    fn default() -> Self {
        Self::new(Group::RESOURCE)
    }
}

impl Mapping<Person> for DocumentPersonMapping {
    type Create = Fields;
    type Update = Fields;
    type Raw = Document;

    fn set_add(&self, person: &Person) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), text(&person.name));
        fields.insert("surname".to_string(), text(&person.surname));
        fields.insert("gender".to_string(), text(person.gender.as_wire()));
        fields.insert(
            "user".to_string(),
            text(person.user_id.as_deref().unwrap_or_default()),
        );
        fields.insert(
            "picture".to_string(),
            text(person.picture.as_ref().map_or("", |p| p.url.as_str())),
        );
        if person.age.is_some() {
            fields.insert("age".to_string(), age_value(person.age));
        }
        if person.group_id.as_deref().is_some_and(|id| !id.is_empty()) {
            fields.insert("groupId".to_string(), self.group_value(person.group_id.as_ref()));
        }
        fields
    }

    fn set_update(&self, patch: &PersonPatch) -> Fields {
        let mut fields = Fields::new();
        if let Some(name) = &patch.name {
            fields.insert("name".to_string(), text(name));
        }
        if let Some(surname) = &patch.surname {
            fields.insert("surname".to_string(), text(surname));
        }
        if let Some(age) = patch.age {
            fields.insert("age".to_string(), age_value(age));
        }
        if let Some(gender) = patch.gender {
            fields.insert("gender".to_string(), text(gender.as_wire()));
        }
        if let Some(group_id) = &patch.group_id {
            fields.insert("groupId".to_string(), self.group_value(group_id.as_ref()));
        }
        if let Some(user_id) = &patch.user_id {
            fields.insert("user".to_string(), text(user_id.as_deref().unwrap_or_default()));
        }
        if let Some(picture) = &patch.picture {
            let url = picture.as_ref().map_or("", |p| p.url.as_str());
            fields.insert("picture".to_string(), text(url));
        }
        fields
    }

    fn get_one(&self, document: Document) -> Person {
        Person {
            name: document.get_str("name").unwrap_or_default().to_string(),
            surname: document.get_str("surname").unwrap_or_default().to_string(),
            age: document
                .get_i64("age")
                .and_then(|age| u32::try_from(age).ok()),
            gender: Gender::from_wire_or_default(document.get_str("gender")),
            group_id: document.get_ref("groupId").map(|r| r.id.clone()),
            user_id: non_empty(document.get_str("user")),
            picture: non_empty(document.get_str("picture")).map(Picture::single),
            id: document.id,
        }
    }

    fn set_filter(&self, field: &str, value: &Value) -> (String, Value) {
        match field {
            "gender" => (field.to_string(), gender_filter(value)),
            "userId" => ("user".to_string(), value.clone()),
            _ => (field.to_string(), value.clone()),
        }
    }
}

impl DocumentMapping<Person> for DocumentPersonMapping {
    fn query_filter(&self, field: &str, value: &Value) -> (String, FieldValue) {
        if field == "groupId" {
            let group = match value {
                Value::String(id) => self.group_ref(id),
                Value::Number(id) => self.group_ref(&id.to_string()),
                _ => FieldValue::Null,
            };
            return (field.to_string(), group);
        }
        let (field, value) = self.set_filter(field, value);
        (field, FieldValue::from(value))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentGroupMapping;

impl Mapping<Group> for DocumentGroupMapping {
    type Create = Fields;
    type Update = Fields;
    type Raw = Document;

    fn set_add(&self, group: &Group) -> Fields {
        Fields::from([("name".to_string(), text(&group.name))])
    }

    fn set_update(&self, patch: &GroupPatch) -> Fields {
        patch
            .name
            .iter()
            .map(|name| ("name".to_string(), text(name)))
            .collect()
    }

    fn get_one(&self, document: Document) -> Group {
        Group {
            name: document.get_str("name").unwrap_or_default().to_string(),
            id: document.id,
        }
    }
}

impl DocumentMapping<Group> for DocumentGroupMapping {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_add_fields() {
        let mut person = Person::new("Ana", "Lopez", Gender::Female);
        person.group_id = Some("g1".to_string());
        person.age = Some(30);

        let fields = DocumentPersonMapping::default().set_add(&person);
        assert_eq!(fields["gender"], FieldValue::from("female"));
        assert_eq!(fields["user"], FieldValue::from(""));
        assert_eq!(fields["picture"], FieldValue::from(""));
        assert_eq!(fields["age"], FieldValue::Integer(30));
        assert_eq!(
            fields["groupId"],
            FieldValue::Reference(DocumentRef::new("groups", "g1"))
        );

        let without_group = DocumentPersonMapping::default()
            .set_add(&Person::new("Luis", "Diaz", Gender::Male));
        assert!(!without_group.contains_key("groupId"));
        assert!(!without_group.contains_key("age"));
    }

    #[test]
    fn test_gender_survives_write_and_read() {
        let mapping = DocumentPersonMapping::default();
        for gender in Gender::ALL {
            let fields = mapping.set_add(&Person::new("Ana", "Lopez", gender));
            let person = mapping.get_one(Document::new("p1", fields));
            assert_eq!(person.gender, gender);
        }
    }

    #[test]
    fn test_person_decode() {
        let document = Document::new(
            "p1",
            Fields::from([
                ("name".to_string(), FieldValue::from("Ana")),
                ("surname".to_string(), FieldValue::from("Lopez")),
                ("gender".to_string(), FieldValue::from("male")),
                ("user".to_string(), FieldValue::from("")),
                ("picture".to_string(), FieldValue::from("https://cdn/p.png")),
                (
                    "groupId".to_string(),
                    FieldValue::Reference(DocumentRef::new("groups", "g2")),
                ),
            ]),
        );

        let person = DocumentPersonMapping::default().get_one(document);
        assert_eq!(person.id, "p1");
        assert_eq!(person.gender, Gender::Male);
        assert_eq!(person.user_id, None);
        assert_eq!(person.group_id.as_deref(), Some("g2"));
        assert_eq!(person.picture, Some(Picture::single("https://cdn/p.png")));
    }

    #[test]
    fn test_person_update_only_set_fields() {
        let mapping = DocumentPersonMapping::new("teams");
        let fields = mapping.set_update(&PersonPatch {
            name: Some("Eva".to_string()),
            group_id: Some(Some("t1".to_string())),
            ..Default::default()
        });
        assert_eq!(fields.len(), 2);
        assert_eq!(
            fields["groupId"],
            FieldValue::Reference(DocumentRef::new("teams", "t1"))
        );

        assert!(mapping.set_update(&PersonPatch::default()).is_empty());
    }

    #[test]
    fn test_query_filters() {
        let mapping = DocumentPersonMapping::default();
        assert_eq!(
            mapping.query_filter("groupId", &Value::from("g1")),
            (
                "groupId".to_string(),
                FieldValue::Reference(DocumentRef::new("groups", "g1"))
            )
        );
        assert_eq!(
            mapping.query_filter("gender", &Value::from("Masculino")),
            ("gender".to_string(), FieldValue::from("male"))
        );
        assert_eq!(
            mapping.query_filter("userId", &Value::from("u1")),
            ("user".to_string(), FieldValue::from("u1"))
        );
    }
}
