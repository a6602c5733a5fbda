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

// Firebase Storage uploads over the REST endpoint

use super::MediaService;
use crate::auth::{AuthProvider, Session};
use crate::config::FirebaseConfig;
use crate::error::{Error, Result};
use crate::transport::{join_url, HttpTransport};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageObject {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

pub struct FirebaseMedia {
    transport: HttpTransport,
    session: Arc<Session>,
    bucket_url: String,
}

/// Object names travel as a single path segment
fn encode_object_name(name: &str) -> String {
    name.replace('/', "%2F")
}

/// `uploads/{millis}_{random}`
fn object_name() -> String {
    format!(
        "uploads/{}_{}",
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4().simple()
    )
}

impl FirebaseMedia {
    pub fn new(client: Client, session: Arc<Session>, config: &FirebaseConfig) -> Result<Self> {
        let bucket = config
            .storage_bucket
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| Error::config("firebase.storage_bucket is required for uploads"))?;
        let auth: Arc<dyn AuthProvider> = session.clone();
        Ok(Self {
            transport: HttpTransport::new(client, Some(auth)),
            session,
            bucket_url: join_url(&config.storage_url, &["b", bucket, "o"]),
        })
    }

    fn download_url(&self, object: &StorageObject) -> String {
        let url = format!(
            "{}/{}?alt=media",
            self.bucket_url,
            encode_object_name(&object.name)
        );
        match object
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
        {
            Some(token) if !token.is_empty() => format!("{}&token={}", url, token),
            _ => url,
        }
    }
}

#[async_trait]
impl MediaService for FirebaseMedia {
    async fn upload(&self, data: Bytes, content_type: &str) -> Result<Vec<String>> {
        let user = self
            .session
            .current_user()
            .ok_or_else(|| Error::Auth("uploads require a signed-in user".to_string()))?;

        let name = object_name();
        let request = self
            .transport
            .request(Method::POST, &self.bucket_url)
            .query(&[("name", name.as_str())])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data);
        let stored: StorageObject = self.transport.send(request).await?;

        let metadata_url = format!("{}/{}", self.bucket_url, encode_object_name(&stored.name));
        let request = self
            .transport
            .request(Method::PATCH, &metadata_url)
            .json(&json!({ "metadata": { "uploaded-by": user.id } }));
        self.transport.send_empty(request).await?;

        info!("Uploaded '{}' for user '{}'", stored.name, user.id);
        Ok(vec![self.download_url(&stored)])
    }

    fn backend_type(&self) -> &str {
        "firebase"
    }
}
