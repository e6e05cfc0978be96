//! In-memory collaborators shared by the unit tests.

use crate::bootstrap::{InitError, InitRequest, Initializer};
use crate::error::FetchError;
use crate::http::{ByteStream, HttpFetcher};
use crate::properties::{ServerProperties, EULA_FILE, SETTINGS_FILE};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Clone)]
struct Route {
    body: Vec<u8>,
    /// Break the stream after the first chunk
    truncate: bool,
}

/// [`HttpFetcher`] serving canned bodies and counting requests per URL.
#[derive(Default)]
pub struct FakeFetcher {
    routes: HashMap<String, Route>,
    hits: Mutex<HashMap<String, usize>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                body: body.into(),
                truncate: false,
            },
        );
        self
    }

    pub fn with_truncated_body(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                body: body.into(),
                truncate: true,
            },
        );
        self
    }

    pub fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

struct FakeStream {
    url: String,
    chunks: Vec<Vec<u8>>,
    length: u64,
    truncate: bool,
    served: usize,
}

#[async_trait]
impl ByteStream for FakeStream {
    fn content_length(&self) -> Option<u64> {
        Some(self.length)
    }

    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, FetchError> {
        if self.truncate && self.served == 1 {
            return Err(FetchError::Request {
                url: self.url.clone(),
                message: "connection reset".to_string(),
            });
        }
        if self.served >= self.chunks.len() {
            return Ok(None);
        }
        self.served += 1;
        Ok(Some(self.chunks[self.served - 1].clone()))
    }
}

#[async_trait]
impl HttpFetcher for FakeFetcher {
    async fn open(&self, url: &str) -> Result<Box<dyn ByteStream>, FetchError> {
        *self.hits.lock().unwrap().entry(url.to_string()).or_default() += 1;
        let route = self.routes.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })?;

        let middle = route.body.len() / 2;
        let chunks = vec![route.body[..middle].to_vec(), route.body[middle..].to_vec()];
        Ok(Box::new(FakeStream {
            url: url.to_string(),
            length: route.body.len() as u64,
            chunks,
            truncate: route.truncate,
            served: 0,
        }))
    }
}

/// Builds a manifest document; the first release and first snapshot become
/// the `latest` pointers.
pub fn manifest_json(entries: &[(&str, &str, &str)]) -> String {
    let first_of = |kind: &str| {
        entries
            .iter()
            .find(|(_, entry_kind, _)| *entry_kind == kind)
            .map(|(id, _, _)| id.to_string())
            .unwrap_or_default()
    };
    let versions: Vec<_> = entries
        .iter()
        .map(|(id, kind, url)| {
            serde_json::json!({
                "id": id,
                "type": kind,
                "url": url,
                "time": "2023-06-12T13:25:51+00:00",
                "releaseTime": "2023-06-12T13:25:51+00:00",
            })
        })
        .collect();

    serde_json::json!({
        "latest": {"release": first_of("release"), "snapshot": first_of("snapshot")},
        "versions": versions,
    })
    .to_string()
}

/// Initializer that writes the files a first server run would generate.
#[derive(Default)]
pub struct FakeInitializer {
    calls: AtomicUsize,
    fail: bool,
}

impl FakeInitializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Initializer for FakeInitializer {
    async fn initialize(&self, request: &InitRequest) -> Result<(), InitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(InitError::Exited { code: Some(1) });
        }
        write_first_run_files(&request.world_path)?;
        Ok(())
    }
}

/// Writes `eula.txt` (declined) and a default `server.properties`.
pub fn write_first_run_files(world: &std::path::Path) -> std::io::Result<()> {
    std::fs::write(
        world.join(EULA_FILE),
        "#By changing the setting below to TRUE you are indicating your agreement to our EULA.\n#Mon Oct 16 10:00:00 UTC 2023\neula=false\n",
    )?;
    let mut store = ServerProperties::default().to_store();
    store.set_header(vec!["Minecraft server properties".to_string()]);
    std::fs::write(world.join(SETTINGS_FILE), store.to_string())
}
