//! A scripted WebDriver server.
//!
//! Elements are registered by the locator that finds them and get readable
//! ids, so a test can assert the sequence of interactions by name.

use super::client::ELEMENT_KEY;
use super::Locator;
use crate::test_server::{Recorded, StubServer};
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub const SESSION: &str = "fake-session";

#[derive(Default)]
pub struct FakeBrowser {
    elements: HashMap<String, String>,
    lists: Mutex<HashMap<String, Vec<String>>>,
    selected: HashSet<String>,
    failing: HashMap<String, String>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// `locator` finds the element `id`.
    pub fn with_element(mut self, locator: &Locator, id: &str) -> Self {
        self.elements.insert(locator.strategy().1, id.to_string());
        self
    }

    pub fn with_selected(mut self, id: &str) -> Self {
        self.selected.insert(id.to_string());
        self
    }

    /// Interactions with `id` fail with the W3C error code `error`.
    pub fn failing(mut self, id: &str, error: &str) -> Self {
        self.failing.insert(id.to_string(), error.to_string());
        self
    }

    /// Replace the elements a find-all with `locator` returns.
    pub fn set_list(&self, locator: &Locator, ids: &[&str]) {
        let ids = ids.iter().map(|id| id.to_string()).collect();
        self.lists.lock().unwrap().insert(locator.strategy().1, ids);
    }

    pub async fn serve(self: &Arc<Self>) -> StubServer {
        let browser = Arc::clone(self);
        StubServer::start(move |request| browser.respond(request)).await
    }

    fn respond(&self, request: &Recorded) -> (StatusCode, Value) {
        if request.path == "/session" && request.method == Method::POST {
            return ok(json!({ "sessionId": SESSION, "capabilities": {} }));
        }

        let prefix = format!("/session/{}", SESSION);
        let Some(rest) = request.path.strip_prefix(&prefix) else {
            return error(StatusCode::NOT_FOUND, "invalid session id", &request.path);
        };
        if rest.is_empty() && request.method == Method::DELETE {
            return ok(Value::Null);
        }

        let parts: Vec<&str> = rest.trim_start_matches('/').split('/').collect();
        match parts.as_slice() {
            ["url"] | ["execute", "sync"] => ok(Value::Null),
            ["element"] | ["element", _, "element"] => self.find(&request.body),
            ["elements"] => {
                let using = request.body["value"].as_str().unwrap_or_default();
                let lists = self.lists.lock().unwrap();
                let ids = lists.get(using).cloned().unwrap_or_default();
                ok(ids.iter().map(|id| json!({ ELEMENT_KEY: id })).collect())
            }
            ["element", id, "selected"] => ok(json!(self.selected.contains(*id))),
            ["element", _, "displayed" | "enabled"] => ok(json!(true)),
            ["element", id, "click" | "clear" | "value"] => match self.failing.get(*id) {
                Some(code) => error(StatusCode::BAD_REQUEST, code, id),
                None => ok(Value::Null),
            },
            _ => error(StatusCode::NOT_FOUND, "unknown command", rest),
        }
    }

    fn find(&self, body: &Value) -> (StatusCode, Value) {
        let using = body["value"].as_str().unwrap_or_default();
        match self.elements.get(using) {
            Some(id) => ok(json!({ ELEMENT_KEY: id })),
            None => error(StatusCode::NOT_FOUND, "no such element", using),
        }
    }
}

fn ok(value: Value) -> (StatusCode, Value) {
    (StatusCode::OK, json!({ "value": value }))
}

fn error(status: StatusCode, code: &str, message: &str) -> (StatusCode, Value) {
    (
        status,
        json!({ "value": { "error": code, "message": message, "stacktrace": "" } }),
    )
}

/// Page-changing commands in the order they were sent, e.g. `click terms`
/// or `type email a@b.c`. Lookups and state queries are left out.
pub fn actions(requests: &[Recorded]) -> Vec<String> {
    let prefix = format!("/session/{}/", SESSION);
    requests
        .iter()
        .filter_map(|request| {
            let rest = request.path.strip_prefix(&prefix)?;
            let parts: Vec<&str> = rest.split('/').collect();
            match parts.as_slice() {
                ["url"] => Some(format!("goto {}", request.body["url"].as_str()?)),
                ["execute", "sync"] => {
                    Some(format!("script {}", request.body["script"].as_str()?))
                }
                ["element", id, "click"] => Some(format!("click {}", id)),
                ["element", id, "clear"] => Some(format!("clear {}", id)),
                ["element", id, "value"] => {
                    Some(format!("type {} {}", id, request.body["text"].as_str()?))
                }
                _ => None,
            }
        })
        .collect()
}
