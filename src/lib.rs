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

// People and groups repository layer with pluggable backends
//
// One asynchronous data-access contract over interchangeable backends:
// - Plain REST and json-server HTTP APIs
// - Strapi v4 headless CMS, including authentication and media uploads
// - Firestore-like document database with live collection change feeds
// - Local key-value storage backed by files or memory
//
// The backend is chosen once at startup from configuration.

pub mod auth;
pub mod backend;
pub mod config;
pub mod docstore;
pub mod error;
pub mod factory;
pub mod kv;
pub mod mapping;
pub mod media;
pub mod models;
pub mod repository;
pub mod subscription;
pub mod transport;

// Re-export main types
pub use auth::{AuthProvider, Authentication, Session};
pub use backend::BackendKind;
pub use config::{load_config, load_config_with_env, AppConfig};
pub use error::{Error, Result, SubscriptionError};
pub use factory::{BackendContext, BackendEntity, Backends, RepositoryFactory};
pub use media::MediaService;
pub use models::{
    ChangeKind, CollectionChange, Entity, Gender, Group, GroupPatch, Listing, Paginated,
    Person, PersonPatch, Picture, User,
};
pub use repository::{Filters, Repository};
pub use subscription::{ChangeStream, CollectionSubscription, SubscriptionState};
