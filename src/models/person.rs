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

use super::Entity;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Gender stored canonically as a closed set.
///
/// Backends persist the wire value (`male`, `female`, `other`); callers see
/// the display label (`Masculino`, `Femenino`, `Otros`) when the entity is
/// serialized. Deserialization accepts either form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub fn as_wire(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Masculino",
            Gender::Female => "Femenino",
            Gender::Other => "Otros",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "Masculino" => Some(Gender::Male),
            "Femenino" => Some(Gender::Female),
            "Otros" => Some(Gender::Other),
            _ => None,
        }
    }

    /// Lenient decode used by mappings: unknown or missing values become `Other`
    pub fn from_wire_or_default(value: Option<&str>) -> Self {
        value
            .and_then(|v| Self::from_wire(v).or_else(|| Self::from_label(v)))
            .unwrap_or_default()
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire(s)
            .or_else(|| Self::from_label(s))
            .ok_or_else(|| format!("unknown gender '{}'", s))
    }
}

impl Serialize for Gender {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Gender {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Media descriptor with size variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picture {
    pub url: String,
    pub large: String,
    pub medium: String,
    pub small: String,
    pub thumbnail: String,
}

impl Picture {
    /// Descriptor where every variant points at the same URL
    pub fn single(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            large: url.clone(),
            medium: url.clone(),
            small: url.clone(),
            thumbnail: url.clone(),
            url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub surname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<Picture>,
}

impl Person {
    pub fn new(name: impl Into<String>, surname: impl Into<String>, gender: Gender) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            surname: surname.into(),
            age: None,
            gender,
            group_id: None,
            user_id: None,
            picture: None,
        }
    }
}

/// Partial update for a [`Person`].
///
/// `None` leaves the field alone. For optional fields `Some(None)` clears
/// the value and `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonPatch {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub age: Option<Option<u32>>,
    pub gender: Option<Gender>,
    pub group_id: Option<Option<String>>,
    pub user_id: Option<Option<String>>,
    pub picture: Option<Option<Picture>>,
}

impl PersonPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Entity for Person {
    type Patch = PersonPatch;

    const RESOURCE: &'static str = "people";

    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&mut self, patch: &PersonPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(surname) = &patch.surname {
            self.surname = surname.clone();
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(gender) = patch.gender {
            self.gender = gender;
        }
        if let Some(group_id) = &patch.group_id {
            self.group_id = group_id.clone();
        }
        if let Some(user_id) = &patch.user_id {
            self.user_id = user_id.clone();
        }
        if let Some(picture) = &patch.picture {
            self.picture = picture.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_translation_table() {
        for gender in Gender::ALL {
            assert_eq!(Gender::from_wire(gender.as_wire()), Some(gender));
            assert_eq!(Gender::from_label(gender.label()), Some(gender));
        }
        assert_eq!(Gender::from_wire("Masculino"), None);
        assert_eq!(Gender::from_wire_or_default(Some("bogus")), Gender::Other);
        assert_eq!(Gender::from_wire_or_default(Some("Femenino")), Gender::Female);
        assert_eq!(Gender::from_wire_or_default(None), Gender::Other);
    }

    #[test]
    fn test_gender_serializes_as_label() {
        let json = serde_json::to_value(Gender::Male).unwrap();
        assert_eq!(json, "Masculino");

        let parsed: Gender = serde_json::from_value(serde_json::json!("female")).unwrap();
        assert_eq!(parsed, Gender::Female);
        assert!(serde_json::from_value::<Gender>(serde_json::json!("x")).is_err());
    }

    #[test]
    fn test_apply_keeps_absent_fields() {
        let mut person = Person::new("Ana", "Lopez", Gender::Female);
        person.age = Some(30);
        person.group_id = Some("4".to_string());

        person.apply(&PersonPatch {
            surname: Some("Garcia".to_string()),
            ..Default::default()
        });

        assert_eq!(person.name, "Ana");
        assert_eq!(person.surname, "Garcia");
        assert_eq!(person.age, Some(30));
        assert_eq!(person.group_id.as_deref(), Some("4"));
    }

    #[test]
    fn test_apply_sets_falsy_values() {
        let mut person = Person::new("Ana", "Lopez", Gender::Female);
        person.age = Some(30);

        person.apply(&PersonPatch {
            name: Some(String::new()),
            age: Some(Some(0)),
            group_id: Some(None),
            ..Default::default()
        });

        assert_eq!(person.name, "");
        assert_eq!(person.age, Some(0));
        assert_eq!(person.group_id, None);
    }
}
