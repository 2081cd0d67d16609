//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rollbar_sourcemaps::adapters::BoxError;
use rollbar_sourcemaps::{Transport, TransportResponse, UploadPayload};
use tokio::sync::Barrier;

/// How the fake endpoint answers
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(TransportResponse),
    Refuse,

    /// Panic inside the upload task
    Panic,
}

impl Reply {
    pub fn ok() -> Self {
        Self::Respond(TransportResponse::new(200, "OK", r#"{"err":0}"#))
    }

    pub fn status(status: u16, status_text: &str, body: &str) -> Self {
        Self::Respond(TransportResponse::new(status, status_text, body))
    }
}

/// In-memory transport recording every request
pub struct FakeTransport {
    default: Reply,
    per_file: HashMap<String, Reply>,
    barrier: Option<Barrier>,
    calls: Mutex<Vec<(String, UploadPayload)>>,
}

impl FakeTransport {
    pub fn new(default: Reply) -> Self {
        Self {
            default,
            per_file: HashMap::new(),
            barrier: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer uploads of `filename` differently
    pub fn with_reply_for(mut self, filename: &str, reply: Reply) -> Self {
        self.per_file.insert(filename.to_string(), reply);
        self
    }

    /// Hold every request until `n` requests are in flight at once
    pub fn with_barrier(mut self, n: usize) -> Self {
        self.barrier = Some(Barrier::new(n));
        self
    }

    pub fn calls(&self) -> Vec<(String, UploadPayload)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    fn name(&self) -> &str {
        "fake"
    }

    async fn post(
        &self,
        endpoint: &str,
        payload: UploadPayload,
    ) -> Result<TransportResponse, BoxError> {
        let reply = self
            .per_file
            .get(&payload.sourcemap_filename)
            .unwrap_or(&self.default)
            .clone();

        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), payload));

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }

        match reply {
            Reply::Respond(response) => Ok(response),
            Reply::Refuse => Err("error trying to connect: Connection refused".into()),
            Reply::Panic => panic!("transport crashed"),
        }
    }
}

/// Write a file, creating parent directories
pub fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Write a compiled file and its sourcemap
pub fn write_bundle(dir: &Path, name: &str) {
    write(dir, name, "console.log(1)");
    write(
        dir,
        &format!("{name}.map"),
        r#"{"version":3,"sources":["src/main.ts"],"mappings":"AAAA"}"#,
    );
}

pub fn shared(transport: FakeTransport) -> Arc<FakeTransport> {
    Arc::new(transport)
}
