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

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// One mutation observed on a live collection.
///
/// Removed changes carry no payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CollectionChange<T> {
    Added { id: String, data: T },
    Modified { id: String, data: T },
    Removed { id: String },
}

impl<T> CollectionChange<T> {
    pub fn kind(&self) -> ChangeKind {
        match self {
            CollectionChange::Added { .. } => ChangeKind::Added,
            CollectionChange::Modified { .. } => ChangeKind::Modified,
            CollectionChange::Removed { .. } => ChangeKind::Removed,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            CollectionChange::Added { id, .. }
            | CollectionChange::Modified { id, .. }
            | CollectionChange::Removed { id } => id,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            CollectionChange::Added { data, .. } | CollectionChange::Modified { data, .. } => {
                Some(data)
            }
            CollectionChange::Removed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_wire_shape() {
        let change = CollectionChange::Added {
            id: "a".to_string(),
            data: 5,
        };
        assert_eq!(
            serde_json::to_value(&change).unwrap(),
            serde_json::json!({"type": "added", "id": "a", "data": 5})
        );

        let removed: CollectionChange<i32> = CollectionChange::Removed { id: "a".to_string() };
        assert_eq!(
            serde_json::to_value(&removed).unwrap(),
            serde_json::json!({"type": "removed", "id": "a"})
        );
        assert_eq!(removed.data(), None);
        assert_eq!(removed.kind(), ChangeKind::Removed);
    }
}
