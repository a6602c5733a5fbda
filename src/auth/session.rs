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

use super::AuthProvider;
use crate::models::User;
use tokio::sync::watch;
use tracing::info;

/// Credentials of a signed-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

/// Explicit session context.
///
/// Created empty, filled by [`Session::begin`] at sign-in and cleared by
/// [`Session::invalidate`] at sign-out. Observers can follow changes through
/// [`Session::watch`].
pub struct Session {
    state: watch::Sender<Option<AuthSession>>,
}

impl Session {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self { state }
    }

    /// Session that is already authenticated, mostly useful for tooling
    pub fn with_token(token: impl Into<String>, user: User) -> Self {
        let session = Self::new();
        session.begin(AuthSession {
            token: token.into(),
            user,
        });
        session
    }

    pub fn begin(&self, session: AuthSession) {
        info!("Session started for user '{}'", session.user.id);
        self.state.send_replace(Some(session));
    }

    pub fn invalidate(&self) {
        if self.state.send_replace(None).is_some() {
            info!("Session invalidated");
        }
    }

    pub fn snapshot(&self) -> Option<AuthSession> {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<Option<AuthSession>> {
        self.state.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthProvider for Session {
    fn token(&self) -> Option<String> {
        self.state.borrow().as_ref().map(|s| s.token.clone())
    }

    fn current_user(&self) -> Option<User> {
        self.state.borrow().as_ref().map(|s| s.user.clone())
    }
}
