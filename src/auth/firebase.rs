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

// Firebase Authentication through the Identity Toolkit REST API

use super::{into_auth_error, AuthSession, Authentication, Session};
use crate::config::FirebaseConfig;
use crate::error::{Error, Result};
use crate::models::{SignInPayload, SignUpPayload, User};
use crate::transport::{join_url, HttpTransport};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirebaseUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    id_token: String,
    #[serde(flatten)]
    user: FirebaseUser,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<FirebaseUser>,
}

impl From<FirebaseUser> for User {
    fn from(user: FirebaseUser) -> Self {
        let email = user.email.unwrap_or_default();
        // Accounts created with email/password have no display name
        let username = user
            .display_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| email.clone());
        User {
            id: user.local_id,
            username,
            email,
        }
    }
}

pub struct FirebaseAuthentication {
    transport: HttpTransport,
    session: Arc<Session>,
    identity_url: String,
    api_key: String,
}

impl FirebaseAuthentication {
    pub fn new(client: Client, session: Arc<Session>, config: &FirebaseConfig) -> Self {
        Self {
            transport: HttpTransport::new(client, None),
            session,
            identity_url: config.identity_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        join_url(&self.identity_url, &[&format!("accounts:{}", action)])
    }

    async fn password_flow(&self, action: &str, email: &str, password: &str) -> Result<User> {
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let request = self
            .transport
            .request(Method::POST, &self.endpoint(action))
            .query(&[("key", &self.api_key)])
            .json(&body);
        let response: PasswordResponse =
            self.transport.send(request).await.map_err(into_auth_error)?;

        let user = User::from(response.user);
        self.session.begin(AuthSession {
            token: response.id_token,
            user: user.clone(),
        });
        Ok(user)
    }
}

#[async_trait]
impl Authentication for FirebaseAuthentication {
    async fn sign_in(&self, payload: SignInPayload) -> Result<User> {
        self.password_flow("signInWithPassword", &payload.email, &payload.password)
            .await
    }

    async fn sign_up(&self, payload: SignUpPayload) -> Result<User> {
        // Firebase has no username concept; the email doubles as one
        self.password_flow("signUp", &payload.email, &payload.password)
            .await
    }

    async fn sign_out(&self) -> Result<()> {
        self.session.invalidate();
        Ok(())
    }

    async fn me(&self) -> Result<User> {
        let session = self
            .session
            .snapshot()
            .ok_or_else(|| Error::Auth("No authenticated user".to_string()))?;

        let request = self
            .transport
            .request(Method::POST, &self.endpoint("lookup"))
            .query(&[("key", &self.api_key)])
            .json(&LookupRequest {
                id_token: &session.token,
            });
        let response: LookupResponse =
            self.transport.send(request).await.map_err(into_auth_error)?;

        response
            .users
            .into_iter()
            .next()
            .map(User::from)
            .ok_or_else(|| Error::Auth("No authenticated user".to_string()))
    }

    fn backend_type(&self) -> &str {
        "firebase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_falls_back_to_email() {
        let user = User::from(FirebaseUser {
            local_id: "abc".to_string(),
            email: Some("ana@example.com".to_string()),
            display_name: None,
        });
        assert_eq!(user.username, "ana@example.com");

        let user = User::from(FirebaseUser {
            local_id: "abc".to_string(),
            email: None,
            display_name: Some("Ana".to_string()),
        });
        assert_eq!(user.username, "Ana");
        assert_eq!(user.email, "");
    }

    #[test]
    fn test_password_response_decoding() {
        let response: PasswordResponse = serde_json::from_value(serde_json::json!({
            "kind": "identitytoolkit#VerifyPasswordResponse",
            "localId": "uid-1",
            "email": "ana@example.com",
            "displayName": "",
            "idToken": "token",
            "registered": true,
            "refreshToken": "refresh",
            "expiresIn": "3600"
        }))
        .unwrap();
        assert_eq!(response.id_token, "token");
        assert_eq!(User::from(response.user).username, "ana@example.com");
    }
}
