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

// Strapi backend, authentication and uploads against a fake Strapi server

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use people_repository::models::SignInPayload;
use people_repository::{
    AppConfig, AuthProvider, Backends, Error, Filters, Gender, Person, PersonPatch,
};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const JWT: &str = "jwt-ana";

#[derive(Clone)]
struct FakeStrapi {
    people: Arc<Mutex<Vec<(u64, Map<String, Value>)>>>,
    next_id: Arc<Mutex<u64>>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

impl Default for FakeStrapi {
    fn default() -> Self {
        Self {
            people: Arc::default(),
            // First created record gets id 7
            next_id: Arc::new(Mutex::new(6)),
            bodies: Arc::default(),
        }
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Attributes as Strapi returns them with `populate=*`
fn populated(attributes: &Map<String, Value>) -> Value {
    let mut attributes = attributes.clone();
    if let Some(group) = attributes.get("group").and_then(Value::as_u64) {
        attributes.insert(
            "group".to_string(),
            json!({"data": {"id": group, "attributes": {"name": format!("Group {}", group)}}}),
        );
    }
    Value::Object(attributes)
}

fn record(id: u64, attributes: &Map<String, Value>) -> Value {
    json!({"id": id, "attributes": populated(attributes)})
}

async fn sign_in(Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    if body["identifier"] == "ana@example.com" && body["password"] == "secret" {
        Ok(Json(json!({
            "jwt": JWT,
            "user": {"id": 3, "username": "ana", "email": "ana@example.com"}
        })))
    } else {
        Err(StatusCode::BAD_REQUEST)
    }
}

async fn me(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    match bearer(&headers) {
        Some(JWT) => Ok(Json(
            json!({"id": 3, "username": "ana", "email": "ana@example.com"}),
        )),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

async fn list(
    State(strapi): State<FakeStrapi>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let page: usize = params["pagination[page]"].parse().unwrap();
    let page_size: usize = params["pagination[pageSize]"].parse().unwrap();
    assert_eq!(params.get("populate").map(String::as_str), Some("*"));

    let people = strapi.people.lock().unwrap();
    let matching: Vec<&(u64, Map<String, Value>)> = people
        .iter()
        .filter(|(_, attributes)| match params.get("filters[gender][$eq]") {
            Some(gender) => attributes.get("gender") == Some(&json!(gender)),
            None => true,
        })
        .filter(|(_, attributes)| match params.get("filters[group][id][$eq]") {
            Some(group) => attributes.get("group").map(Value::to_string).as_ref() == Some(group),
            None => true,
        })
        .collect();
    let total = matching.len();
    let data: Vec<Value> = matching
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .map(|(id, attributes)| record(*id, attributes))
        .collect();

    Json(json!({
        "data": data,
        "meta": {"pagination": {
            "page": page,
            "pageSize": page_size,
            "pageCount": total.div_ceil(page_size),
            "total": total
        }}
    }))
}

async fn create(
    State(strapi): State<FakeStrapi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    if bearer(&headers) != Some(JWT) {
        return Err(StatusCode::FORBIDDEN);
    }
    strapi.bodies.lock().unwrap().push(body.clone());
    let attributes = body["data"].as_object().cloned().unwrap_or_default();
    let id = {
        let mut next = strapi.next_id.lock().unwrap();
        *next += 1;
        *next
    };
    strapi.people.lock().unwrap().push((id, attributes.clone()));
    Ok(Json(json!({"data": record(id, &attributes), "meta": {}})))
}

async fn get_one(
    State(strapi): State<FakeStrapi>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, StatusCode> {
    let people = strapi.people.lock().unwrap();
    people
        .iter()
        .find(|(candidate, _)| *candidate == id)
        .map(|(id, attributes)| Json(json!({"data": record(*id, attributes), "meta": {}})))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update(
    State(strapi): State<FakeStrapi>,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    strapi.bodies.lock().unwrap().push(body.clone());
    let mut people = strapi.people.lock().unwrap();
    let (_, attributes) = people
        .iter_mut()
        .find(|(candidate, _)| *candidate == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    if let Some(changes) = body["data"].as_object() {
        for (key, value) in changes {
            attributes.insert(key.clone(), value.clone());
        }
    }
    Ok(Json(json!({"data": record(id, attributes), "meta": {}})))
}

async fn remove(
    State(strapi): State<FakeStrapi>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, StatusCode> {
    let mut people = strapi.people.lock().unwrap();
    let index = people
        .iter()
        .position(|(candidate, _)| *candidate == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    let (id, attributes) = people.remove(index);
    Ok(Json(json!({"data": record(id, &attributes), "meta": {}})))
}

async fn upload(headers: HeaderMap, body: Bytes) -> Result<Json<Value>, StatusCode> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if bearer(&headers) != Some(JWT) || !content_type.starts_with("multipart/form-data") {
        return Err(StatusCode::BAD_REQUEST);
    }
    let text = String::from_utf8_lossy(&body);
    if !text.contains("name=\"files\"") {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(Json(json!([{"id": 11, "url": "/uploads/picture.png"}])))
}

async fn spawn_strapi() -> (String, FakeStrapi) {
    let strapi = FakeStrapi::default();
    let app = Router::new()
        .route("/api/auth/local", post(sign_in))
        .route("/api/users/me", get(me))
        .route("/api/people", get(list).post(create))
        .route("/api/people/:id", get(get_one).put(update).delete(remove))
        .route("/api/upload", post(upload))
        .with_state(strapi.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/api", addr), strapi)
}

fn config(api_url: &str) -> AppConfig {
    let mut config = AppConfig {
        backend: "strapi".to_string(),
        ..Default::default()
    };
    config.people.api_url = api_url.to_string();
    config.groups.api_url = api_url.to_string();
    config.auth.sign_in_url = format!("{}/auth/local", api_url);
    config.auth.sign_up_url = format!("{}/auth/local/register", api_url);
    config.auth.me_url = format!("{}/users/me", api_url);
    config.media.upload_url = format!("{}/upload", api_url);
    config
}

async fn signed_in() -> (Backends, FakeStrapi) {
    let (url, strapi) = spawn_strapi().await;
    let backends = Backends::build(&config(&url)).unwrap();
    let auth = backends.auth.clone().unwrap();
    auth.sign_in(SignInPayload {
        email: "ana@example.com".to_string(),
        password: "secret".to_string(),
    })
    .await
    .unwrap();
    (backends, strapi)
}

#[tokio::test]
async fn test_sign_in_and_me() {
    let (url, _strapi) = spawn_strapi().await;
    let backends = Backends::build(&config(&url)).unwrap();
    let auth = backends.auth.clone().unwrap();

    let rejected = auth
        .sign_in(SignInPayload {
            email: "ana@example.com".to_string(),
            password: "wrong".to_string(),
        })
        .await;
    assert!(matches!(rejected, Err(Error::Auth(_))));
    assert!(!backends.session.is_authenticated());

    let user = auth
        .sign_in(SignInPayload {
            email: "ana@example.com".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(user.id, "3");
    assert_eq!(backends.session.token().as_deref(), Some(JWT));
    assert_eq!(auth.me().await.unwrap(), user);

    auth.sign_out().await.unwrap();
    assert!(!backends.session.is_authenticated());
}

#[tokio::test]
async fn test_create_body_and_echo() {
    let (backends, strapi) = signed_in().await;

    let created = backends
        .people
        .add(Person::new("Ana", "Lopez", Gender::Male))
        .await
        .unwrap();

    assert_eq!(
        strapi.bodies.lock().unwrap()[0],
        json!({"data": {"name": "Ana", "surname": "Lopez", "gender": "male", "group": null}})
    );
    assert_eq!(created.id, "7");
    assert_eq!(created.name, "Ana");
    assert_eq!(created.surname, "Lopez");
    assert_eq!(created.gender, Gender::Male);
    assert_eq!(serde_json::to_value(&created).unwrap()["gender"], "Masculino");
}

#[tokio::test]
async fn test_paging_filters_update_delete() {
    let (backends, strapi) = signed_in().await;
    let people = backends.people.clone();

    for i in 0..25 {
        let mut person = Person::new(format!("P{}", i), "X", Gender::Female);
        if i < 3 {
            person.group_id = Some("4".to_string());
        }
        people.add(person).await.unwrap();
    }

    let listing = people.get_all(2, 10, &Filters::new()).await.unwrap();
    let page = listing.as_paginated().unwrap();
    assert_eq!((page.page, page.page_size, page.pages), (2, 10, 3));
    assert_eq!(page.data.len(), 10);

    let grouped = Filters::from([("groupId".to_string(), json!("4"))]);
    let listing = people.get_all(1, 10, &grouped).await.unwrap();
    assert_eq!(listing.len(), 3);
    assert!(listing
        .items()
        .iter()
        .all(|p| p.group_id.as_deref() == Some("4")));

    let target = listing.items()[0].clone();
    let updated = people
        .update(
            &target.id,
            PersonPatch {
                gender: Some(Gender::Other),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(
        strapi.bodies.lock().unwrap().last().unwrap(),
        &json!({"data": {"gender": "other"}})
    );
    assert_eq!(updated.gender, Gender::Other);
    assert_eq!(updated.name, target.name);
    assert_eq!(updated.group_id.as_deref(), Some("4"));

    let deleted = people.delete(&target.id).await.unwrap();
    assert_eq!(deleted, updated);
    assert_eq!(people.get_by_id(&target.id).await.unwrap(), None);
    assert!(people.delete(&target.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_upload_returns_file_ids() {
    let (backends, _strapi) = signed_in().await;
    let media = backends.media.clone().unwrap();

    let ids = media
        .upload(Bytes::from_static(b"\x89PNG"), "image/png")
        .await
        .unwrap();
    assert_eq!(ids, vec!["11".to_string()]);
}
