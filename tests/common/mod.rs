//! Shared utilities for admin API integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mapping_admin::admin::AdminState;
use mapping_admin::config::AdminConfig;
use mapping_admin::http::AdminServer;
use mapping_admin::mapping::{DraftManager, MappingStore, SchemaValidator, SteppingClock};
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const USER: &str = "admin";
pub const PASSWORD: &str = "admin";

/// First version id handed out by the test clock.
pub const CLOCK_START: i64 = 1_700_000_000;

/// A temp directory holding the mapping file and its draft and history.
pub struct Workspace {
    pub dir: TempDir,
    pub mapping_path: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mapping_path = dir.path().join("mapping.json");
        Self { dir, mapping_path }
    }

    pub fn write_active(&self, document: &Value) {
        write_json(&self.mapping_path, document);
    }

    pub fn read_active(&self) -> Value {
        read_json(&self.mapping_path)
    }

    pub fn draft_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.draft", self.mapping_path.display()))
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.dir.path().join("versions")
    }

    /// A draft manager whose clock advances one second per deploy.
    pub fn drafts(&self) -> Arc<DraftManager> {
        let store = Arc::new(MappingStore::new(SchemaValidator::builtin().unwrap()));
        Arc::new(DraftManager::new(store).with_clock(Arc::new(SteppingClock::new(CLOCK_START, 1))))
    }
}

pub fn write_json(path: &Path, document: &Value) {
    std::fs::write(path, serde_json::to_string_pretty(document).unwrap()).unwrap();
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// A running admin server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub workspace: Workspace,
    pub drafts: Arc<DraftManager>,
    pub reloads: Arc<AtomicUsize>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn start(workspace: Workspace) -> Self {
        let drafts = workspace.drafts();
        let reloads = Arc::new(AtomicUsize::new(0));
        let counter = reloads.clone();

        let state = AdminState::new(drafts.clone(), workspace.mapping_path.clone())
            .with_reload(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        let router = AdminServer::build_router(&AdminConfig::default(), state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            addr,
            workspace,
            drafts,
            reloads,
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).basic_auth(USER, Some(PASSWORD))
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).basic_auth(USER, Some(PASSWORD))
    }

    pub fn patch(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.patch(self.url(path)).basic_auth(USER, Some(PASSWORD))
    }

    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).basic_auth(USER, Some(PASSWORD))
    }
}
