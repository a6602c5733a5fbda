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

// Media upload services

mod firebase;
mod strapi;

pub use firebase::FirebaseMedia;
pub use strapi::StrapiMedia;

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait MediaService: Send + Sync {
    /// Store `data` and return identifiers of the stored media
    ///
    /// Strapi returns numeric file ids, Firebase returns download URLs.
    async fn upload(&self, data: Bytes, content_type: &str) -> Result<Vec<String>>;

    fn backend_type(&self) -> &str;
}
