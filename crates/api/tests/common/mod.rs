#![allow(dead_code)]

use std::path::Path;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use hostexec_api::config::ServerConfig;
use hostexec_api::router::build_app_router;
use hostexec_api::state::AppState;

/// Temporary directories backing one test app.
pub struct TestDirs {
    pub root: tempfile::TempDir,
}

impl TestDirs {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        for sub in ["scripts", "output", "public"] {
            std::fs::create_dir(root.path().join(sub)).expect("create subdir");
        }
        Self { root }
    }

    pub fn scripts(&self) -> std::path::PathBuf {
        self.root.path().join("scripts")
    }

    pub fn output(&self) -> std::path::PathBuf {
        self.root.path().join("output")
    }

    pub fn public(&self) -> std::path::PathBuf {
        self.root.path().join("public")
    }

    /// Write a script into the scripts directory.
    pub fn script(&self, name: &str, body: &str) {
        write(&self.scripts().join(name), body);
    }
}

pub fn write(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, body).expect("write file");
}

/// Build a test `ServerConfig` pointing at `dirs`.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and short timeouts.
pub fn test_config(dirs: &TestDirs) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        scripts_dir: dirs.scripts(),
        output_dir: dirs.output(),
        public_dir: dirs.public(),
        command_timeout_secs: 10,
        max_concurrent_processes: 4,
        script_shell: "bash".to_string(),
        powershell_bin: "powershell".to_string(),
    }
}

/// Build the full application router, with the same middleware stack as
/// production.
pub fn build_test_app(config: ServerConfig) -> Router {
    let state = AppState::from_config(config.clone());
    build_app_router(state, &config)
}

/// Same as [`build_test_app`] but also returns the state so tests can
/// inspect the runner.
pub fn build_test_app_with_state(config: ServerConfig) -> (Router, AppState) {
    let state = AppState::from_config(config.clone());
    (build_app_router(state.clone(), &config), state)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a raw (possibly malformed) JSON body.
pub async fn post_raw_json(app: Router, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
