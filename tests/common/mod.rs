//! A mock repository listing served by axum on a random local port.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub folder: String,
    pub start: Option<usize>,
    pub limit: Option<usize>,
    pub id: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Default)]
pub struct MockRepo {
    folders: HashMap<String, Vec<Value>>,
    /// (folder, start) pairs that answer 500.
    failures: Vec<(String, usize)>,
    /// Folders whose end-of-listing page omits `result` entirely.
    omit_result: Vec<String>,
    /// Folders answering with a body that is not JSON.
    garbage: Vec<String>,
    /// Folders that answer after this delay.
    slow: HashMap<String, Duration>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl MockRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn folder(mut self, id: &str, items: Vec<(String, String)>) -> Self {
        let entries = items
            .into_iter()
            .map(|(name, url)| json!({ "NAME": name, "DOWNLOAD_URL": url, "TYPE": "file" }))
            .collect();
        self.folders.insert(id.to_string(), entries);
        self
    }

    /// Insert a subfolder entry (no `DOWNLOAD_URL`) at `position` in the
    /// listing of `id`.
    pub fn subfolder(mut self, id: &str, position: usize, name: &str) -> Self {
        let entries = self.folders.entry(id.to_string()).or_default();
        let position = position.min(entries.len());
        entries.insert(position, json!({ "NAME": name, "TYPE": "folder" }));
        self
    }

    /// A folder holding `n` items named `"<prefix> <i>"`.
    pub fn numbered(self, id: &str, prefix: &str, n: usize) -> Self {
        let items = (0..n)
            .map(|i| (format!("{} {}", prefix, i), format!("https://dl/{}/{}", id, i)))
            .collect();
        self.folder(id, items)
    }

    pub fn fail_at(mut self, id: &str, start: usize) -> Self {
        self.failures.push((id.to_string(), start));
        self
    }

    pub fn omit_result_at_end(mut self, id: &str) -> Self {
        self.omit_result.push(id.to_string());
        self
    }

    pub fn garbage(mut self, id: &str) -> Self {
        self.garbage.push(id.to_string());
        self
    }

    pub fn slow(mut self, id: &str, delay: Duration) -> Self {
        self.slow.insert(id.to_string(), delay);
        self
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

/// Serve `repo` on 127.0.0.1 and return the address.
pub async fn serve(repo: Arc<MockRepo>) -> SocketAddr {
    let app = Router::new()
        .route("/folders/{folder_id}", get(handle_listing))
        .with_state(repo);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A URL template pointing at a mock server.
pub fn url_template(addr: SocketAddr) -> String {
    format!("http://{}/folders/{{folder_id}}", addr)
}

async fn handle_listing(
    State(repo): State<Arc<MockRepo>>,
    Path(folder): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let start = params.get("start").and_then(|s| s.parse::<usize>().ok());
    let limit = params.get("limit").and_then(|s| s.parse::<usize>().ok());

    repo.seen.lock().unwrap().push(SeenRequest {
        folder: folder.clone(),
        start,
        limit,
        id: params.get("id").cloned(),
        content_type: headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string()),
    });

    if let Some(delay) = repo.slow.get(&folder) {
        tokio::time::sleep(*delay).await;
    }

    let start = start.unwrap_or(0);
    let limit = limit.unwrap_or(50);

    if repo.failures.contains(&(folder.clone(), start)) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    if repo.garbage.contains(&folder) {
        return (StatusCode::OK, "<html>not json</html>").into_response();
    }

    let items = repo.folders.get(&folder).cloned().unwrap_or_default();
    let page: Vec<Value> = items
        .iter()
        .skip(start)
        .take(limit)
        .cloned()
        .collect();

    if page.is_empty() && repo.omit_result.contains(&folder) {
        return Json(json!({ "total": items.len() })).into_response();
    }

    Json(json!({ "result": page, "total": items.len() })).into_response()
}
