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

// HTTP transport shared by the REST-style backends and collaborators

use crate::auth::AuthProvider;
use crate::config::HttpConfig;
use crate::error::{Error, Result};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Build the HTTP client used by every transport
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    let client = reqwest::ClientBuilder::new()
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(Duration::from_secs(config.timeout_seconds))
        .build()?;
    Ok(client)
}

/// Join a base URL and path segments with single slashes
pub fn join_url(base: &str, segments: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for segment in segments {
        let segment = segment.trim_matches('/');
        if !segment.is_empty() {
            url.push('/');
            url.push_str(segment);
        }
    }
    url
}

/// Append a record id to a collection URL as a single percent-encoded segment
pub fn record_url(base: &str, id: &str) -> String {
    let mut url = match Url::parse(base) {
        Ok(url) => url,
        Err(_) => return join_url(base, &[id]),
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(id);
    }
    url.to_string()
}

/// Issues requests and attaches bearer credentials from the session
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    auth: Option<Arc<dyn AuthProvider>>,
}

impl HttpTransport {
    pub fn new(client: Client, auth: Option<Arc<dyn AuthProvider>>) -> Self {
        Self { client, auth }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Start a request; the bearer token is read at call time
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        debug!("{} {}", method, url);
        let request = self.client.request(method, url);
        match self.auth.as_ref().and_then(|auth| auth.token()) {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send and decode a JSON body; any non-success status is an error
    pub async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let bytes = self.send_raw(request).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Like [`send`](Self::send) but a 404 resolves to `None`
    pub async fn send_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>> {
        match self.send(request).await {
            Ok(value) => Ok(Some(value)),
            Err(Error::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Send and discard the body
    pub async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        self.send_raw(request).await.map(|_| ())
    }

    async fn send_raw(&self, request: RequestBuilder) -> Result<bytes::Bytes> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?)
    }
}
