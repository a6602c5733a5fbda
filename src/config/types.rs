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

// Configuration types for people-repository

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Backend identifier: "http", "json-server", "strapi", "firebase", "local-storage"
    pub backend: String,

    #[serde(default = "EntityConfig::people")]
    pub people: EntityConfig,

    #[serde(default = "EntityConfig::groups")]
    pub groups: EntityConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub media: MediaConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub local_storage: LocalStorageConfig,

    #[serde(default)]
    pub firebase: FirebaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: "strapi".to_string(),
            people: EntityConfig::people(),
            groups: EntityConfig::groups(),
            auth: AuthConfig::default(),
            media: MediaConfig::default(),
            http: HttpConfig::default(),
            local_storage: LocalStorageConfig::default(),
            firebase: FirebaseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Per-entity settings: where the resource lives and what it is called
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntityConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Resource path (HTTP backends), collection name (document store) or
    /// storage key (local storage)
    pub resource: String,
}

impl EntityConfig {
    pub fn new(api_url: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            resource: resource.into(),
        }
    }

    pub fn people() -> Self {
        Self::new(default_api_url(), "people")
    }

    pub fn groups() -> Self {
        Self::new(default_api_url(), "groups")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default = "default_sign_in_url")]
    pub sign_in_url: String,

    #[serde(default = "default_sign_up_url")]
    pub sign_up_url: String,

    #[serde(default = "default_me_url")]
    pub me_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            sign_in_url: default_sign_in_url(),
            sign_up_url: default_sign_up_url(),
            me_url: default_me_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaConfig {
    #[serde(default = "default_upload_url")]
    pub upload_url: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            upload_url: default_upload_url(),
        }
    }
}

/// Transport client settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_pool_idle")]
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            pool_max_idle_per_host: default_pool_idle(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalStorageConfig {
    /// Directory holding one JSON file per storage key
    #[serde(default = "default_local_path")]
    pub path: String,

    /// Keep everything in process memory instead of on disk
    #[serde(default)]
    pub in_memory: bool,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            path: default_local_path(),
            in_memory: false,
        }
    }
}

/// Document store project configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FirebaseConfig {
    #[serde(default)]
    pub project_id: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default)]
    pub storage_bucket: Option<String>,

    /// Interval between change-feed polls against the REST endpoint
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Use the in-process document store instead of the REST endpoint
    #[serde(default)]
    pub in_memory: bool,

    #[serde(default = "default_firestore_url")]
    pub firestore_url: String,

    #[serde(default = "default_identity_url")]
    pub identity_url: String,

    #[serde(default = "default_storage_url")]
    pub storage_url: String,
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            api_key: String::new(),
            database: default_database(),
            storage_bucket: None,
            poll_interval_ms: default_poll_interval(),
            in_memory: false,
            firestore_url: default_firestore_url(),
            identity_url: default_identity_url(),
            storage_url: default_storage_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"

    #[serde(default = "default_log_format")]
    pub format: String, // "text", "compact"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_api_url() -> String { "http://localhost:1337/api".to_string() }
fn default_sign_in_url() -> String { "http://localhost:1337/api/auth/local".to_string() }
fn default_sign_up_url() -> String { "http://localhost:1337/api/auth/local/register".to_string() }
fn default_me_url() -> String { "http://localhost:1337/api/users/me".to_string() }
fn default_upload_url() -> String { "http://localhost:1337/api/upload".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_pool_idle() -> usize { 10 }
fn default_local_path() -> String { "data/local-storage".to_string() }
fn default_database() -> String { "(default)".to_string() }
fn default_poll_interval() -> u64 { 1000 }
fn default_firestore_url() -> String { "https://firestore.googleapis.com/v1".to_string() }
fn default_identity_url() -> String { "https://identitytoolkit.googleapis.com/v1".to_string() }
fn default_storage_url() -> String { "https://firebasestorage.googleapis.com/v0".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "text".to_string() }
