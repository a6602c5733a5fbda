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

// Backend selection
//
// The backend identifier is parsed once at startup. Every collaborator a
// backend needs is passed in explicitly through `BackendContext`.

use crate::auth::{
    AuthProvider, Authentication, FirebaseAuthentication, Session, StrapiAuthentication,
};
use crate::backend::BackendKind;
use crate::config::{AppConfig, EntityConfig};
use crate::docstore::{DocumentStore, FirestoreRest, MemoryDocumentStore};
use crate::error::{Error, Result};
use crate::kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
use crate::mapping::{
    DocumentGroupMapping, DocumentMapping, DocumentPersonMapping, LocalGroupMapping,
    LocalPersonMapping, Mapping, RestGroupMapping, RestPersonMapping, StrapiGroupMapping,
    StrapiPersonMapping,
};
use crate::media::{FirebaseMedia, MediaService, StrapiMedia};
use crate::models::{Entity, Group, Person};
use crate::repository::{
    DocumentRepository, HttpRepository, JsonServerRepository, LocalStorageRepository,
    Repository, StrapiRepository,
};
use crate::subscription::{CollectionSubscription, DocumentCollectionSubscription};
use crate::transport::{build_client, HttpTransport};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::info;

/// Entity that every backend knows how to map
pub trait BackendEntity: Entity {
    /// Used by both the plain HTTP and json-server backends
    type Rest: Mapping<Self> + Default;
    type Strapi: Mapping<Self> + Default;
    type Local: Mapping<Self> + Default;
    type Document: DocumentMapping<Self>;

    fn entity_config(config: &AppConfig) -> &EntityConfig;

    fn document_mapping(config: &AppConfig) -> Self::Document;
}

impl BackendEntity for Person {
    type Rest = RestPersonMapping;
    type Strapi = StrapiPersonMapping;
    type Local = LocalPersonMapping;
    type Document = DocumentPersonMapping;

    fn entity_config(config: &AppConfig) -> &EntityConfig {
        &config.people
    }

    fn document_mapping(config: &AppConfig) -> DocumentPersonMapping {
        DocumentPersonMapping::new(config.groups.resource.clone())
    }
}

impl BackendEntity for Group {
    type Rest = RestGroupMapping;
    type Strapi = StrapiGroupMapping;
    type Local = LocalGroupMapping;
    type Document = DocumentGroupMapping;

    fn entity_config(config: &AppConfig) -> &EntityConfig {
        &config.groups
    }

    fn document_mapping(_config: &AppConfig) -> DocumentGroupMapping {
        DocumentGroupMapping
    }
}

/// Collaborators shared by every adapter of one backend
#[derive(Clone)]
pub struct BackendContext {
    pub kind: BackendKind,
    pub client: Client,
    pub session: Arc<Session>,
    pub key_value: Option<Arc<dyn KeyValueStore>>,
    pub documents: Option<Arc<dyn DocumentStore>>,
}

impl BackendContext {
    pub fn new(kind: BackendKind, client: Client) -> Self {
        Self {
            kind,
            client,
            session: Arc::new(Session::new()),
            key_value: None,
            documents: None,
        }
    }

    pub fn with_session(mut self, session: Arc<Session>) -> Self {
        self.session = session;
        self
    }

    pub fn with_key_value(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.key_value = Some(store);
        self
    }

    pub fn with_documents(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.documents = Some(store);
        self
    }

    /// Build the collaborators the configured backend needs
    pub fn from_config(kind: BackendKind, config: &AppConfig) -> Result<Self> {
        let client = build_client(&config.http)?;
        let mut context = Self::new(kind, client);

        match kind {
            BackendKind::LocalStorage => {
                let store: Arc<dyn KeyValueStore> = if config.local_storage.in_memory {
                    Arc::new(MemoryKeyValueStore::new())
                } else {
                    Arc::new(FileKeyValueStore::new(&config.local_storage.path))
                };
                context = context.with_key_value(store);
            }
            BackendKind::Firebase => {
                let store: Arc<dyn DocumentStore> = if config.firebase.in_memory {
                    Arc::new(MemoryDocumentStore::new())
                } else {
                    Arc::new(FirestoreRest::new(
                        context.client.clone(),
                        context.session.clone(),
                        &config.firebase,
                    )?)
                };
                context = context.with_documents(store);
            }
            BackendKind::Http | BackendKind::JsonServer | BackendKind::Strapi => {}
        }

        Ok(context)
    }

    fn transport(&self) -> HttpTransport {
        let auth: Arc<dyn AuthProvider> = self.session.clone();
        HttpTransport::new(self.client.clone(), Some(auth))
    }

    fn key_value(&self) -> Result<Arc<dyn KeyValueStore>> {
        self.key_value
            .clone()
            .ok_or_else(|| Error::config("local-storage backend requires a key-value store"))
    }

    fn documents(&self) -> Result<Arc<dyn DocumentStore>> {
        self.documents
            .clone()
            .ok_or_else(|| Error::config("firebase backend requires a document store"))
    }
}

/// Builds repositories and services for the selected backend
pub struct RepositoryFactory {
    config: AppConfig,
    context: BackendContext,
}

impl RepositoryFactory {
    pub fn new(config: AppConfig, context: BackendContext) -> Self {
        Self { config, context }
    }

    pub fn kind(&self) -> BackendKind {
        self.context.kind
    }

    pub fn session(&self) -> Arc<Session> {
        self.context.session.clone()
    }

    pub fn repository<T>(&self) -> Result<Arc<dyn Repository<T>>>
    where
        T: BackendEntity,
        <T::Rest as Mapping<T>>::Raw: DeserializeOwned,
        <T::Strapi as Mapping<T>>::Raw: DeserializeOwned,
        <T::Local as Mapping<T>>::Raw: DeserializeOwned,
    {
        let entity = T::entity_config(&self.config);
        info!(
            "Creating {} repository for '{}'",
            self.context.kind, entity.resource
        );

        match self.context.kind {
            BackendKind::Http => Ok(Arc::new(HttpRepository::new(
                self.context.transport(),
                entity,
                T::Rest::default(),
            ))),
            BackendKind::JsonServer => Ok(Arc::new(JsonServerRepository::new(
                self.context.transport(),
                entity,
                T::Rest::default(),
            ))),
            BackendKind::Strapi => Ok(Arc::new(StrapiRepository::new(
                self.context.transport(),
                entity,
                T::Strapi::default(),
            ))),
            BackendKind::Firebase => Ok(Arc::new(DocumentRepository::new(
                self.context.documents()?,
                entity.resource.clone(),
                T::document_mapping(&self.config),
            ))),
            BackendKind::LocalStorage => Ok(Arc::new(LocalStorageRepository::new(
                self.context.key_value()?,
                entity.resource.clone(),
                T::Local::default(),
            ))),
        }
    }

    /// Live change feed; only the document backend has one
    pub fn subscription<T: BackendEntity>(&self) -> Result<Arc<dyn CollectionSubscription<T>>> {
        if !self.context.kind.has_change_feed() {
            return Err(Error::config(format!(
                "collection subscriptions are unsupported by the {} backend",
                self.context.kind
            )));
        }
        Ok(Arc::new(DocumentCollectionSubscription::new(
            self.context.documents()?,
            T::document_mapping(&self.config),
        )))
    }

    pub fn media(&self) -> Result<Arc<dyn MediaService>> {
        match self.context.kind {
            BackendKind::Strapi => Ok(Arc::new(StrapiMedia::new(
                self.context.transport(),
                &self.config.media,
            ))),
            BackendKind::Firebase => Ok(Arc::new(FirebaseMedia::new(
                self.context.client.clone(),
                self.context.session.clone(),
                &self.config.firebase,
            )?)),
            other => Err(Error::config(format!(
                "media uploads are unsupported by the {} backend",
                other
            ))),
        }
    }

    pub fn authentication(&self) -> Result<Arc<dyn Authentication>> {
        match self.context.kind {
            BackendKind::Strapi => Ok(Arc::new(StrapiAuthentication::new(
                self.context.client.clone(),
                self.context.session.clone(),
                &self.config.auth,
            ))),
            BackendKind::Firebase => Ok(Arc::new(FirebaseAuthentication::new(
                self.context.client.clone(),
                self.context.session.clone(),
                &self.config.firebase,
            ))),
            other => Err(Error::config(format!(
                "authentication is unsupported by the {} backend",
                other
            ))),
        }
    }
}

/// Everything the application needs, built once at startup
pub struct Backends {
    pub kind: BackendKind,
    pub session: Arc<Session>,
    pub people: Arc<dyn Repository<Person>>,
    pub groups: Arc<dyn Repository<Group>>,
    pub people_changes: Option<Arc<dyn CollectionSubscription<Person>>>,
    pub groups_changes: Option<Arc<dyn CollectionSubscription<Group>>>,
    pub media: Option<Arc<dyn MediaService>>,
    pub auth: Option<Arc<dyn Authentication>>,
}

impl Backends {
    /// Parse the backend identifier, then build its collaborators and adapters
    pub fn build(config: &AppConfig) -> Result<Self> {
        let kind: BackendKind = config.backend.parse()?;
        let context = BackendContext::from_config(kind, config)?;
        Self::with_context(config.clone(), context)
    }

    pub fn with_context(config: AppConfig, context: BackendContext) -> Result<Self> {
        let kind = context.kind;
        // The in-process document store has no object storage behind it
        let has_media =
            kind.has_accounts() && !(kind == BackendKind::Firebase && config.firebase.in_memory);
        let factory = RepositoryFactory::new(config, context);
        let backends = Self {
            kind,
            session: factory.session(),
            people: factory.repository::<Person>()?,
            groups: factory.repository::<Group>()?,
            people_changes: kind
                .has_change_feed()
                .then(|| factory.subscription::<Person>())
                .transpose()?,
            groups_changes: kind
                .has_change_feed()
                .then(|| factory.subscription::<Group>())
                .transpose()?,
            media: has_media.then(|| factory.media()).transpose()?,
            auth: kind
                .has_accounts()
                .then(|| factory.authentication())
                .transpose()?,
        };
        info!("Backend '{}' ready", backends.kind);
        Ok(backends)
    }

    /// Tear down every live change feed
    pub fn close(&self) {
        if let Some(changes) = &self.people_changes {
            changes.close();
        }
        if let Some(changes) = &self.groups_changes {
            changes.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Filters;

    fn config(backend: &str) -> AppConfig {
        let mut config = AppConfig {
            backend: backend.to_string(),
            ..Default::default()
        };
        config.local_storage.in_memory = true;
        config.firebase.in_memory = true;
        config
    }

    #[test]
    fn test_unknown_backend_fails_fast() {
        let result = Backends::build(&config("mongo"));
        match result {
            Err(Error::Config(message)) => assert!(message.contains("Unknown backend")),
            Err(other) => panic!("unexpected error {}", other),
            Ok(_) => panic!("unknown backend accepted"),
        }
    }

    #[test]
    fn test_http_backends_have_no_change_feed() {
        for backend in ["http", "json-server", "strapi"] {
            let backends = Backends::build(&config(backend)).unwrap();
            assert_eq!(backends.people.backend_type(), backend);
            assert!(backends.people_changes.is_none());
        }

        let strapi = Backends::build(&config("strapi")).unwrap();
        assert!(strapi.media.is_some());
        assert_eq!(strapi.auth.unwrap().backend_type(), "strapi");
    }

    #[test]
    fn test_subscription_unsupported_error() {
        let kind = BackendKind::Strapi;
        let factory = RepositoryFactory::new(config("strapi"), BackendContext::new(kind, Client::new()));
        assert!(matches!(
            factory.subscription::<Person>(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_missing_collaborator() {
        let factory = RepositoryFactory::new(
            config("local-storage"),
            BackendContext::new(BackendKind::LocalStorage, Client::new()),
        );
        assert!(matches!(factory.repository::<Group>(), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_local_storage_in_memory() {
        let backends = Backends::build(&config("localstorage")).unwrap();
        assert_eq!(backends.kind, BackendKind::LocalStorage);
        assert!(backends.auth.is_none());
        assert!(backends.media.is_none());

        let group = backends.groups.add(Group::new("Ops")).await.unwrap();
        let listing = backends.groups.get_all(1, 10, &Filters::new()).await.unwrap();
        assert_eq!(listing.items(), &[group]);
    }

    #[tokio::test]
    async fn test_firebase_in_memory_has_change_feeds() {
        let backends = Backends::build(&config("firebase")).unwrap();
        assert!(backends.people_changes.is_some());
        assert!(backends.media.is_none());
        assert_eq!(backends.auth.as_ref().unwrap().backend_type(), "firebase");

        let changes = backends.groups_changes.clone().unwrap();
        let _stream = changes.subscribe("groups").await.unwrap();
        assert_eq!(changes.observer_count("groups"), 1);
        backends.close();
        assert_eq!(changes.observer_count("groups"), 0);
    }

    #[test]
    fn test_firebase_without_bucket_fails_to_build() {
        let mut config = config("firebase");
        config.firebase.in_memory = false;
        config.firebase.project_id = "demo".to_string();
        match Backends::build(&config) {
            Err(Error::Config(message)) => assert!(message.contains("storage_bucket")),
            Err(other) => panic!("unexpected error {}", other),
            Ok(_) => panic!("firebase built without a storage bucket"),
        }

        config.firebase.storage_bucket = Some("demo.appspot.com".to_string());
        let backends = Backends::build(&config).unwrap();
        assert!(backends.media.is_some());
        assert!(backends.people_changes.is_some());
    }
}
