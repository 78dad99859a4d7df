//! Shared helpers for the integration tests.
//!
//! The client is blocking, so every call runs on tokio's blocking pool while
//! the wiremock server keeps serving.
#![allow(dead_code)]

use harbor_utils::{Config, Response, Scheme};
use wiremock::MockServer;

/// Status, headers and body of a response, read inside the blocking task
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl Reply {
    pub fn read(response: Response) -> Reply {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.text().expect("failed to read body");
        Reply {
            status,
            content_type,
            body,
        }
    }
}

/// Client configuration pointing at the mock server
pub fn config_for(server: &MockServer) -> Config {
    let addr = server.address();
    Config::new(Scheme::Http, addr.ip().to_string(), addr.port())
}

/// Run a blocking closure off the async runtime
pub async fn blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .expect("blocking task panicked")
}

/// Install a test-writer subscriber so logs show up for failing tests
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
