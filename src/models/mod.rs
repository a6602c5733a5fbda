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

// Canonical entity models shared by every backend
//
// Entities are plain values: a mapping adapter builds one per raw backend
// record and hands it to the caller. Partial updates travel as `*Patch`
// records where only the fields that are set get written.

mod change;
mod group;
mod page;
mod person;
mod user;

pub use change::{ChangeKind, CollectionChange};
pub use group::{Group, GroupPatch};
pub use page::{Listing, Paginated};
pub use person::{Gender, Person, PersonPatch, Picture};
pub use user::{SignInPayload, SignUpPayload, User};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Identity holder implemented by every entity the repositories manage
pub trait Entity: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Partial update record for this entity
    type Patch: Clone + Debug + Default + Send + Sync + 'static;

    /// Resource/collection name used when none is configured
    const RESOURCE: &'static str;

    fn id(&self) -> &str;

    /// Merge every field set on `patch` into `self`, leaving the rest untouched
    fn apply(&mut self, patch: &Self::Patch);
}
