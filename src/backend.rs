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

// Closed set of supported backends

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Plain REST JSON server with flat records
    Http,
    /// json-server v1 with `_page`/`_per_page` paging
    JsonServer,
    /// Strapi v4 headless CMS
    Strapi,
    /// Firestore-like document database
    Firebase,
    /// String-keyed local key-value store
    LocalStorage,
}

impl BackendKind {
    pub const ALL: [BackendKind; 5] = [
        BackendKind::Http,
        BackendKind::JsonServer,
        BackendKind::Strapi,
        BackendKind::Firebase,
        BackendKind::LocalStorage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Http => "http",
            BackendKind::JsonServer => "json-server",
            BackendKind::Strapi => "strapi",
            BackendKind::Firebase => "firebase",
            BackendKind::LocalStorage => "local-storage",
        }
    }

    /// Whether the backend talks to a remote HTTP API configured per entity
    pub fn uses_api_url(self) -> bool {
        matches!(
            self,
            BackendKind::Http | BackendKind::JsonServer | BackendKind::Strapi
        )
    }

    /// Whether the backend offers a live collection change feed
    pub fn has_change_feed(self) -> bool {
        matches!(self, BackendKind::Firebase)
    }

    /// Whether the backend has sign-in and media upload services
    pub fn has_accounts(self) -> bool {
        matches!(self, BackendKind::Strapi | BackendKind::Firebase)
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(BackendKind::Http),
            "json-server" | "jsonserver" => Ok(BackendKind::JsonServer),
            "strapi" | "strapi-like" => Ok(BackendKind::Strapi),
            "firebase" | "firebase-like" | "firestore" => Ok(BackendKind::Firebase),
            "local-storage" | "localstorage" => Ok(BackendKind::LocalStorage),
            unknown => Err(Error::config(format!(
                "Unknown backend: '{}'. Supported: http, json-server, strapi, firebase, local-storage",
                unknown
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
