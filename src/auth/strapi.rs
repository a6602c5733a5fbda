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

// Strapi users-permissions authentication

use super::{into_auth_error, AuthSession, Authentication, Session};
use crate::auth::AuthProvider;
use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::models::{SignInPayload, SignUpPayload, User};
use crate::transport::HttpTransport;
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Serialize)]
struct StrapiSignIn<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct StrapiSignUp<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct StrapiUser {
    id: u64,
    username: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct StrapiAuthResponse {
    jwt: String,
    user: StrapiUser,
}

impl From<StrapiUser> for User {
    fn from(user: StrapiUser) -> Self {
        User {
            id: user.id.to_string(),
            username: user.username,
            email: user.email,
        }
    }
}

pub struct StrapiAuthentication {
    transport: HttpTransport,
    session: Arc<Session>,
    sign_in_url: String,
    sign_up_url: String,
    me_url: String,
}

impl StrapiAuthentication {
    pub fn new(client: Client, session: Arc<Session>, config: &AuthConfig) -> Self {
        let auth: Arc<dyn AuthProvider> = session.clone();
        Self {
            transport: HttpTransport::new(client, Some(auth)),
            session,
            sign_in_url: config.sign_in_url.clone(),
            sign_up_url: config.sign_up_url.clone(),
            me_url: config.me_url.clone(),
        }
    }

    fn begin(&self, response: StrapiAuthResponse) -> User {
        let user = User::from(response.user);
        self.session.begin(AuthSession {
            token: response.jwt,
            user: user.clone(),
        });
        user
    }
}

#[async_trait]
impl Authentication for StrapiAuthentication {
    async fn sign_in(&self, payload: SignInPayload) -> Result<User> {
        let body = StrapiSignIn {
            identifier: &payload.email,
            password: &payload.password,
        };
        let request = self
            .transport
            .client()
            .request(Method::POST, &self.sign_in_url)
            .json(&body);
        let response: StrapiAuthResponse = self
            .transport
            .send(request)
            .await
            .map_err(into_auth_error)?;
        Ok(self.begin(response))
    }

    async fn sign_up(&self, payload: SignUpPayload) -> Result<User> {
        let body = StrapiSignUp {
            username: &payload.username,
            email: &payload.email,
            password: &payload.password,
        };
        let request = self
            .transport
            .client()
            .request(Method::POST, &self.sign_up_url)
            .json(&body);
        let response: StrapiAuthResponse = self
            .transport
            .send(request)
            .await
            .map_err(into_auth_error)?;
        info!("Registered Strapi user '{}'", response.user.username);
        Ok(self.begin(response))
    }

    async fn sign_out(&self) -> Result<()> {
        self.session.invalidate();
        Ok(())
    }

    async fn me(&self) -> Result<User> {
        if !self.session.is_authenticated() {
            return Err(Error::Auth("No authenticated user".to_string()));
        }
        let request = self.transport.request(Method::GET, &self.me_url);
        let user: StrapiUser = self.transport.send(request).await.map_err(into_auth_error)?;
        Ok(user.into())
    }

    fn backend_type(&self) -> &str {
        "strapi"
    }
}
