// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! In-memory stand-in for the Kubernetes API server.
//!
//! Understands namespaced GET, POST, PUT and merge-patch PATCH (including the
//! `/status` subresource), enforces resourceVersion preconditions, bumps
//! `metadata.generation` on spec changes and drops objects once they are deleting
//! and have no finalizers left. Every non-GET request is recorded.

use http::{Method, Request, Response};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::Client;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

type Key = (String, String, String);

#[derive(Default)]
struct FakeState {
    objects: HashMap<Key, Value>,
    writes: Vec<(String, String)>,
    failures: Vec<(String, String, u16)>,
    revision: u64,
}

impl FakeState {
    fn next_revision(&mut self) -> String {
        self.revision += 1;
        self.revision.to_string()
    }
}

#[derive(Clone, Default)]
pub struct FakeApiServer {
    state: Arc<Mutex<FakeState>>,
}

impl FakeApiServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a kube Client backed by this server
    pub fn client(&self) -> Client {
        Client::new(self.clone(), "default")
    }

    /// Store an object directly, bypassing preconditions. Replaces any previous version.
    pub fn insert(&self, plural: &str, mut object: Value) {
        let mut state = self.state.lock().unwrap();
        let revision = state.next_revision();
        let meta = &mut object["metadata"];
        meta["resourceVersion"] = json!(revision);
        if meta.get("uid").is_none() {
            meta["uid"] = json!(format!("uid-{}", revision));
        }
        if meta.get("generation").is_none() {
            meta["generation"] = json!(1);
        }
        let key = key_of(plural, &object);
        state.objects.insert(key, object);
    }

    pub fn get(&self, plural: &str, namespace: &str, name: &str) -> Option<Value> {
        let state = self.state.lock().unwrap();
        state
            .objects
            .get(&(plural.to_string(), namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Mark an object as deleting, as the API server does for objects with finalizers
    pub fn mark_deleting(&self, plural: &str, namespace: &str, name: &str) {
        let mut state = self.state.lock().unwrap();
        let revision = state.next_revision();
        let key = (plural.to_string(), namespace.to_string(), name.to_string());
        if let Some(object) = state.objects.get_mut(&key) {
            object["metadata"]["deletionTimestamp"] = json!("2026-01-01T00:00:00Z");
            object["metadata"]["resourceVersion"] = json!(revision);
        }
    }

    /// Fail the next `method` request whose path contains `fragment` with `code`
    pub fn fail(&self, method: &str, fragment: &str, code: u16) {
        self.state
            .lock()
            .unwrap()
            .failures
            .push((method.to_string(), fragment.to_string(), code));
    }

    /// Every non-GET request seen so far, as (method, path)
    pub fn writes(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state.lock().unwrap().writes.clear();
    }

    fn handle(&self, method: &Method, path: &str, body: &[u8]) -> (u16, Value) {
        let mut state = self.state.lock().unwrap();

        if method.as_str() != "GET" {
            state.writes.push((method.to_string(), path.to_string()));
        }
        let injected = state
            .failures
            .iter()
            .position(|(m, f, _)| m == method.as_str() && path.contains(f.as_str()));
        if let Some(pos) = injected {
            let (_, _, code) = state.failures.remove(pos);
            return (code, status_body(code, "injected failure"));
        }

        let Some(route) = Route::parse(path) else {
            return (404, status_body(404, "unsupported path"));
        };
        let payload: Value = serde_json::from_slice(body).unwrap_or(Value::Null);

        match method.as_str() {
            "GET" => match state.objects.get(&route.key()) {
                Some(object) => (200, object.clone()),
                None => (404, status_body(404, "not found")),
            },
            "POST" => {
                let mut object = payload;
                let name = object["metadata"]["name"].as_str().unwrap_or_default().to_string();
                let key = (route.plural.clone(), route.namespace.clone(), name);
                if state.objects.contains_key(&key) {
                    return (409, status_body(409, "already exists"));
                }
                let revision = state.next_revision();
                let meta = &mut object["metadata"];
                meta["namespace"] = json!(route.namespace);
                meta["resourceVersion"] = json!(revision);
                meta["uid"] = json!(format!("uid-{}", revision));
                meta["generation"] = json!(1);
                state.objects.insert(key, object.clone());
                (201, object)
            }
            "PUT" => {
                let Some(current) = state.objects.get(&route.key()).cloned() else {
                    return (404, status_body(404, "not found"));
                };
                if current["metadata"]["resourceVersion"] != payload["metadata"]["resourceVersion"] {
                    return (409, status_body(409, "the object has been modified"));
                }
                let mut object = payload;
                if let Some(status) = current.get("status") {
                    object["status"] = status.clone();
                }
                let updated = state.commit(&route, &current, object);
                (200, updated)
            }
            "PATCH" => {
                let Some(current) = state.objects.get(&route.key()).cloned() else {
                    return (404, status_body(404, "not found"));
                };
                let expected = &payload["metadata"]["resourceVersion"];
                if !expected.is_null() && *expected != current["metadata"]["resourceVersion"] {
                    return (409, status_body(409, "the object has been modified"));
                }
                let mut patch = payload.clone();
                if let Some(meta) = patch.get_mut("metadata").and_then(Value::as_object_mut) {
                    meta.remove("resourceVersion");
                }
                let patch = match route.subresource.as_deref() {
                    Some("status") => json!({ "status": patch["status"].clone() }),
                    _ => {
                        if let Some(fields) = patch.as_object_mut() {
                            fields.remove("status");
                        }
                        patch
                    }
                };
                let mut object = current.clone();
                merge(&mut object, &patch);
                let updated = state.commit(&route, &current, object);
                (200, updated)
            }
            _ => (405, status_body(405, "method not allowed")),
        }
    }
}

impl FakeState {
    /// Store `object` as the successor of `current`
    fn commit(&mut self, route: &Route, current: &Value, mut object: Value) -> Value {
        let revision = self.next_revision();
        let mut generation = current["metadata"]["generation"].as_i64().unwrap_or(1);
        if object_spec(current) != object_spec(&object) {
            generation += 1;
        }
        let meta = &mut object["metadata"];
        meta["resourceVersion"] = json!(revision);
        meta["uid"] = current["metadata"]["uid"].clone();
        meta["generation"] = json!(generation);

        let finalizers_left = object["metadata"]["finalizers"]
            .as_array()
            .is_some_and(|f| !f.is_empty());
        if !object["metadata"]["deletionTimestamp"].is_null() && !finalizers_left {
            self.objects.remove(&route.key());
        } else {
            self.objects.insert(route.key(), object.clone());
        }
        object
    }
}

fn object_spec(object: &Value) -> Value {
    object.get("spec").cloned().unwrap_or(Value::Null)
}

/// RFC 7386 JSON merge patch
fn merge(target: &mut Value, patch: &Value) {
    let Value::Object(fields) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(existing) = target {
        for (key, value) in fields {
            if value.is_null() {
                existing.remove(key);
            } else {
                merge(existing.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

fn key_of(plural: &str, object: &Value) -> Key {
    let meta = &object["metadata"];
    (
        plural.to_string(),
        meta["namespace"].as_str().unwrap_or("default").to_string(),
        meta["name"].as_str().unwrap_or_default().to_string(),
    )
}

struct Route {
    namespace: String,
    plural: String,
    name: String,
    subresource: Option<String>,
}

impl Route {
    /// Split `/api(s)/.../namespaces/{ns}/{plural}[/{name}[/{sub}]]`
    fn parse(path: &str) -> Option<Route> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let at = segments.iter().position(|s| *s == "namespaces")?;
        Some(Route {
            namespace: segments.get(at + 1)?.to_string(),
            plural: segments.get(at + 2)?.to_string(),
            name: segments.get(at + 3).map(|s| s.to_string()).unwrap_or_default(),
            subresource: segments.get(at + 4).map(|s| s.to_string()),
        })
    }

    fn key(&self) -> Key {
        (self.plural.clone(), self.namespace.clone(), self.name.clone())
    }
}

fn status_body(code: u16, message: &str) -> Value {
    let reason = match code {
        404 => "NotFound",
        409 => "Conflict",
        _ => "InternalError",
    };
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
}

impl Service<Request<Body>> for FakeApiServer {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let server = self.clone();

        Box::pin(async move {
            let method = req.method().clone();
            let path = req.uri().path().to_string();
            let body = req
                .into_body()
                .collect()
                .await
                .map(|c| c.to_bytes())
                .unwrap_or_default();

            let (status, payload) = server.handle(&method, &path, &body);

            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string().into_bytes()))
                .unwrap())
        })
    }
}
