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

// Firestore v1 REST client
//
// CRUD and queries map onto the documented REST resources. The REST API
// has no streaming listener, so `listen` polls the collection and diffs
// consecutive snapshots.

use super::{
    Document, DocumentChange, DocumentRef, DocumentStore, FieldValue, Fields, ListenerBatch,
    ListenerRegistration, Query,
};
use crate::auth::AuthProvider;
use crate::config::FirebaseConfig;
use crate::error::{Error, Result};
use crate::models::ChangeKind;
use crate::transport::{join_url, record_url, HttpTransport};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct RestDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<RestDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregationItem {
    #[serde(default)]
    result: Option<AggregationResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregationResult {
    #[serde(default)]
    aggregate_fields: Map<String, Value>,
}

#[derive(Clone)]
pub struct FirestoreRest {
    transport: HttpTransport,
    /// `{firestore_url}/projects/{p}/databases/{d}/documents`
    documents_url: String,
    /// `projects/{p}/databases/{d}/documents`
    documents_path: String,
    api_key: String,
    poll_interval: Duration,
}

impl FirestoreRest {
    pub fn new(client: Client, auth: Arc<dyn AuthProvider>, config: &FirebaseConfig) -> Result<Self> {
        if config.project_id.trim().is_empty() {
            return Err(Error::config("firebase.project_id is required"));
        }
        let documents_path = format!(
            "projects/{}/databases/{}/documents",
            config.project_id, config.database
        );
        Ok(Self {
            transport: HttpTransport::new(client, Some(auth)),
            documents_url: join_url(&config.firestore_url, &[&documents_path]),
            documents_path,
            api_key: config.api_key.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self.transport.request(method, url);
        if self.api_key.is_empty() {
            request
        } else {
            request.query(&[("key", &self.api_key)])
        }
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        record_url(&join_url(&self.documents_url, &[collection]), id)
    }

    fn reference_name(&self, reference: &DocumentRef) -> String {
        format!("{}/{}", self.documents_path, reference.path())
    }

    fn encode_value(&self, value: &FieldValue) -> Value {
        match value {
            FieldValue::Null => json!({ "nullValue": null }),
            FieldValue::Bool(b) => json!({ "booleanValue": b }),
            // int64 travels as a decimal string
            FieldValue::Integer(n) => json!({ "integerValue": n.to_string() }),
            FieldValue::Double(f) => json!({ "doubleValue": f }),
            FieldValue::String(s) => json!({ "stringValue": s }),
            FieldValue::Reference(r) => json!({ "referenceValue": self.reference_name(r) }),
            FieldValue::Array(items) => json!({
                "arrayValue": {
                    "values": items.iter().map(|v| self.encode_value(v)).collect::<Vec<_>>()
                }
            }),
            FieldValue::Map(fields) => json!({ "mapValue": { "fields": self.encode_fields(fields) } }),
        }
    }

    fn encode_fields(&self, fields: &Fields) -> Map<String, Value> {
        fields
            .iter()
            .map(|(name, value)| (name.clone(), self.encode_value(value)))
            .collect()
    }

    fn structured_query(&self, collection: &str, query: &Query) -> Value {
        let mut structured = Map::new();
        structured.insert("from".to_string(), json!([{ "collectionId": collection }]));

        let filters: Vec<Value> = query
            .filters
            .iter()
            .map(|(field, value)| {
                json!({
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": self.encode_value(value),
                    }
                })
            })
            .collect();
        match filters.len() {
            0 => {}
            1 => {
                structured.insert("where".to_string(), filters[0].clone());
            }
            _ => {
                structured.insert(
                    "where".to_string(),
                    json!({ "compositeFilter": { "op": "AND", "filters": filters } }),
                );
            }
        }

        structured.insert(
            "orderBy".to_string(),
            json!([{ "field": { "fieldPath": "__name__" }, "direction": "ASCENDING" }]),
        );
        if let Some(cursor) = &query.start_after {
            let name = self.reference_name(&DocumentRef::new(collection, cursor.clone()));
            structured.insert(
                "startAt".to_string(),
                json!({ "values": [{ "referenceValue": name }], "before": false }),
            );
        }
        if let Some(limit) = query.limit {
            structured.insert("limit".to_string(), json!(limit));
        }
        Value::Object(structured)
    }

    /// Full collection snapshot keyed by id, used by the polling listener
    async fn snapshot(&self, collection: &str) -> Result<HashMap<String, Fields>> {
        Ok(self
            .query(collection, &Query::new())
            .await?
            .into_iter()
            .map(|doc| (doc.id, doc.fields))
            .collect())
    }
}

fn decode_value(value: &Value) -> FieldValue {
    let Some(object) = value.as_object() else {
        return FieldValue::Null;
    };
    let Some((kind, inner)) = object.iter().next() else {
        return FieldValue::Null;
    };
    match kind.as_str() {
        "booleanValue" => FieldValue::Bool(inner.as_bool().unwrap_or_default()),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse().ok(),
                other => other.as_i64(),
            };
            parsed.map_or(FieldValue::Null, FieldValue::Integer)
        }
        "doubleValue" => FieldValue::Double(inner.as_f64().unwrap_or_default()),
        "stringValue" | "timestampValue" | "bytesValue" => {
            FieldValue::String(inner.as_str().unwrap_or_default().to_string())
        }
        "referenceValue" => inner
            .as_str()
            .and_then(DocumentRef::from_path)
            .map_or(FieldValue::Null, FieldValue::Reference),
        "arrayValue" => FieldValue::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => FieldValue::Map(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default(),
        ),
        _ => FieldValue::Null,
    }
}

fn decode_fields(fields: &Map<String, Value>) -> Fields {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), decode_value(value)))
        .collect()
}

fn decode_document(document: RestDocument) -> Result<Document> {
    let reference = DocumentRef::from_path(&document.name)
        .ok_or_else(|| Error::Document(format!("malformed document name '{}'", document.name)))?;
    Ok(Document::new(reference.id, decode_fields(&document.fields)))
}

/// Changes turning `previous` into `current`
fn diff_snapshots(
    previous: &HashMap<String, Fields>,
    current: &HashMap<String, Fields>,
) -> Vec<DocumentChange> {
    let mut changes = Vec::new();
    for (id, fields) in current {
        let kind = match previous.get(id) {
            None => ChangeKind::Added,
            Some(old) if old != fields => ChangeKind::Modified,
            Some(_) => continue,
        };
        changes.push(DocumentChange {
            kind,
            document: Document::new(id.clone(), fields.clone()),
        });
    }
    for (id, fields) in previous {
        if !current.contains_key(id) {
            changes.push(DocumentChange {
                kind: ChangeKind::Removed,
                document: Document::new(id.clone(), fields.clone()),
            });
        }
    }
    changes
}

#[async_trait]
impl DocumentStore for FirestoreRest {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let request = self.request(Method::GET, &self.document_url(collection, id));
        match self.transport.send_optional::<RestDocument>(request).await? {
            Some(document) => decode_document(document).map(Some),
            None => Ok(None),
        }
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String> {
        let url = join_url(&self.documents_url, &[collection]);
        let request = self
            .request(Method::POST, &url)
            .json(&json!({ "fields": self.encode_fields(&fields) }));
        let created: RestDocument = self.transport.send(request).await?;
        Ok(decode_document(created)?.id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        // A PATCH without an update mask replaces the whole document
        if fields.is_empty() {
            debug!("Empty update for {}/{}, nothing to write", collection, id);
            return Ok(());
        }

        let mut params: Vec<(&str, &str)> = fields
            .keys()
            .map(|name| ("updateMask.fieldPaths", name.as_str()))
            .collect();
        params.push(("currentDocument.exists", "true"));

        let request = self
            .request(Method::PATCH, &self.document_url(collection, id))
            .query(&params)
            .json(&json!({ "fields": self.encode_fields(&fields) }));
        match self.transport.send_empty(request).await {
            Err(e) if e.is_not_found() => Err(Error::not_found(collection, id)),
            other => other,
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let request = self.request(Method::DELETE, &self.document_url(collection, id));
        self.transport.send_empty(request).await
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
        let url = format!("{}:runQuery", self.documents_url);
        let request = self
            .request(Method::POST, &url)
            .json(&json!({ "structuredQuery": self.structured_query(collection, query) }));
        let items: Vec<RunQueryItem> = self.transport.send(request).await?;
        items
            .into_iter()
            .filter_map(|item| item.document)
            .map(decode_document)
            .collect()
    }

    async fn count(&self, collection: &str, query: &Query) -> Result<u64> {
        let unbounded = Query {
            filters: query.filters.clone(),
            start_after: None,
            limit: None,
        };
        let url = format!("{}:runAggregationQuery", self.documents_url);
        let request = self.request(Method::POST, &url).json(&json!({
            "structuredAggregationQuery": {
                "structuredQuery": self.structured_query(collection, &unbounded),
                "aggregations": [{ "alias": "total", "count": {} }],
            }
        }));
        let items: Vec<AggregationItem> = self.transport.send(request).await?;
        let total = items
            .into_iter()
            .filter_map(|item| item.result)
            .find_map(|result| result.aggregate_fields.get("total").map(decode_value))
            .and_then(|value| value.as_i64())
            .unwrap_or(0);
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn listen(&self, collection: &str) -> Result<ListenerRegistration> {
        let (sender, receiver) = mpsc::unbounded_channel::<ListenerBatch>();
        let store = self.clone();
        let name = collection.to_string();

        info!(
            "Polling '{}' every {:?} for changes",
            collection, self.poll_interval
        );
        let task = tokio::spawn(async move {
            let mut previous = HashMap::new();
            let mut interval = tokio::time::interval(store.poll_interval);
            loop {
                interval.tick().await;
                match store.snapshot(&name).await {
                    Ok(current) => {
                        let changes = diff_snapshots(&previous, &current);
                        previous = current;
                        if !changes.is_empty() && sender.send(Ok(changes)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Polling '{}' failed: {}", name, e);
                        let _ = sender.send(Err(e));
                        break;
                    }
                }
            }
        });

        Ok(ListenerRegistration::new(receiver, move || task.abort()))
    }

    fn store_type(&self) -> &str {
        "firestore"
    }
}
