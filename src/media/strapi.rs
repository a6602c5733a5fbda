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

// Strapi upload plugin

use super::MediaService;
use crate::config::MediaConfig;
use crate::error::Result;
use crate::mapping::id_to_string;
use crate::transport::HttpTransport;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

#[derive(Debug, Deserialize)]
struct UploadedFile {
    id: Value,
}

pub struct StrapiMedia {
    transport: HttpTransport,
    upload_url: String,
}

impl StrapiMedia {
    pub fn new(transport: HttpTransport, config: &MediaConfig) -> Self {
        Self {
            transport,
            upload_url: config.upload_url.clone(),
        }
    }
}

#[async_trait]
impl MediaService for StrapiMedia {
    async fn upload(&self, data: Bytes, content_type: &str) -> Result<Vec<String>> {
        let size = data.len();
        let part = Part::bytes(data.to_vec())
            .file_name("upload")
            .mime_str(content_type)?;
        let request = self
            .transport
            .request(Method::POST, &self.upload_url)
            .multipart(Form::new().part("files", part));

        let files: Vec<UploadedFile> = self.transport.send(request).await?;
        let ids: Vec<String> = files.iter().map(|f| id_to_string(&f.id)).collect();
        info!("Uploaded {} bytes to Strapi as {:?}", size, ids);
        Ok(ids)
    }

    fn backend_type(&self) -> &str {
        "strapi"
    }
}
