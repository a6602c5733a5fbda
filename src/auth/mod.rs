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

// Authentication: session context and backend sign-in services
//
// Repositories and media services only ever read the session through
// `AuthProvider`. Sign-in and sign-out are the only writers.

mod firebase;
mod session;
mod strapi;

pub use firebase::FirebaseAuthentication;
pub use session::{AuthSession, Session};
pub use strapi::StrapiAuthentication;

use crate::error::{Error, Result};
use crate::models::{SignInPayload, SignUpPayload, User};
use async_trait::async_trait;

/// Read-only view of the current credentials
pub trait AuthProvider: Send + Sync {
    /// Bearer token of the active session
    fn token(&self) -> Option<String>;

    /// Identity of the signed-in user
    fn current_user(&self) -> Option<User>;

    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

/// Backend-specific sign-in flow
#[async_trait]
pub trait Authentication: Send + Sync {
    /// Authenticate and begin a session
    async fn sign_in(&self, payload: SignInPayload) -> Result<User>;

    /// Register a new account and begin a session for it
    async fn sign_up(&self, payload: SignUpPayload) -> Result<User>;

    /// Invalidate the current session
    async fn sign_out(&self) -> Result<()>;

    /// Fetch the identity behind the current session from the backend
    async fn me(&self) -> Result<User>;

    fn backend_type(&self) -> &str;
}

/// Rejected credentials surface as authentication errors
pub(crate) fn into_auth_error(error: Error) -> Error {
    match error {
        Error::Status { status, body } if (400..500).contains(&status) => {
            Error::Auth(format!("rejected with status {}: {}", status, body))
        }
        other => other,
    }
}
