//! # Common Test Utilities
//!
//! `TestApp` spawns the real router on a random port with a temporary
//! database and a temporary `config.yml` whose LLM provider and Overpass
//! endpoint both point at an `httpmock::MockServer`.

// Not every test file uses every helper.
#![allow(unused)]

use anyhow::Result;
use axum::serve;
use drivespot::types::{NewSpot, Spot};
use drivespot_server::{
    config, router,
    state::{build_app_state, AppState},
};
use httpmock::MockServer;
use reqwest::Client;
use serde_json::{json, Value};
use std::{fs::File, io::Write, net::SocketAddr, path::PathBuf};
use tempfile::{tempdir, NamedTempFile, TempDir};
use tokio::{net::TcpListener, task::JoinHandle};

pub const CHAT_PATH: &str = "/v1/chat/completions";
pub const OVERPASS_PATH: &str = "/api/interpreter";

/// An OpenAI-compatible chat completion body carrying `content`.
pub fn chat_reply(content: &str) -> Value {
    json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
}

// --- Full Application Test Harness ---

pub struct TestApp {
    pub address: String,
    /// A client with a cookie store, so consecutive calls share one identity.
    pub client: Client,
    pub mock_server: MockServer,
    pub db_path: PathBuf,
    pub app_state: AppState,
    _db_file: Option<NamedTempFile>,
    _config_dir: Option<TempDir>,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the application server with the base test configuration.
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with_config("").await
    }

    /// Spawns the server with `extra_yaml` appended to the base configuration.
    /// The extra YAML must not repeat the base keys.
    pub async fn spawn_with_config(extra_yaml: &str) -> Result<Self> {
        let mock_server = MockServer::start();
        let db_file = NamedTempFile::new()?;
        let db_path = db_file.path().to_path_buf();

        let config_dir = tempdir()?;
        let config_path = config_dir.path().join("config.yml");
        let config_content = format!(
            r#"
port: 0
db_url: "{}"
providers:
  llm_default:
    provider: "local"
    api_url: "{}"
    api_key: null
    model_name: "mock-chat-model"
    timeout_secs: 5
overpass:
  api_url: "{}"
  timeout_secs: 5
{}
"#,
            db_path.display(),
            mock_server.url(CHAT_PATH),
            mock_server.url(OVERPASS_PATH),
            extra_yaml
        );
        let mut file = File::create(&config_path)?;
        file.write_all(config_content.as_bytes())?;

        let config = config::get_config(Some(config_path.to_str().unwrap()))?;
        let app_state = build_app_state(config).await?;

        let mut app = TestApp::spawn_with_state(app_state, mock_server).await?;
        app._db_file = Some(db_file);
        app._config_dir = Some(config_dir);
        Ok(app)
    }

    pub async fn spawn_with_state(app_state: AppState, mock_server: MockServer) -> Result<Self> {
        dotenvy::dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let db_path = PathBuf::from(&app_state.config.db_url);
        let app_state_for_harness = app_state.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(app_state);
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Ok(Self {
            address,
            client: Client::builder().cookie_store(true).build()?,
            mock_server,
            db_path,
            app_state: app_state_for_harness,
            _db_file: None,
            _config_dir: None,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Inserts spots straight into the store, bypassing the API.
    pub async fn seed_spots(&self, spots: Vec<NewSpot>) -> Result<Vec<Spot>> {
        let mut stored = Vec::with_capacity(spots.len());
        for spot in spots {
            stored.push(self.app_state.sqlite_provider.create_spot(spot).await?);
        }
        Ok(stored)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
