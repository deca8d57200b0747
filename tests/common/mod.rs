//! Common test utilities for E2E tests

#![allow(dead_code)]

pub mod schema_validator;

use socialize::data::Actor;
use socialize::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

/// Configuration used by every test server unless overridden
pub fn test_config(db_path: std::path::PathBuf) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
            domain: "test.example.com".to_string(),
            protocol: "https".to_string(),
            max_body_bytes: 64 * 1024,
        },
        database: config::DatabaseConfig { path: db_path },
        federation: config::FederationConfig {
            sign_responses: true,
        },
        auth: config::AuthConfig {
            token_ttl_seconds: 3600,
            provider_timeout_seconds: 5,
            google_tokeninfo_url: "http://127.0.0.1:9/tokeninfo".to_string(),
            facebook_graph_url: "http://127.0.0.1:9".to_string(),
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server after adjusting the default test configuration
    pub async fn with_config(adjust: impl FnOnce(&mut config::AppConfig)) -> Self {
        socialize::metrics::init_metrics();

        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(temp_dir.path().join("test.db"));
        adjust(&mut config);

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build the production router
        let app = socialize::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Create an actor (with key pair and vault) directly through the service
    pub async fn create_actor(&self, username: &str) -> Actor {
        self.state.actors.create_actor(username).await.unwrap()
    }

    /// Signature of `body` made with `username`'s vault key
    pub async fn sign_as(&self, username: &str, body: &str) -> String {
        let vault = self
            .state
            .db
            .get_vault_by_username(username)
            .await
            .unwrap()
            .expect("actor has a vault");
        socialize::federation::sign_payload(&vault.private_key, body.as_bytes()).unwrap()
    }

    /// Build a request signed by `username`
    pub async fn signed(
        &self,
        method: reqwest::Method,
        path: &str,
        username: &str,
        body: &str,
    ) -> reqwest::RequestBuilder {
        let signature = self.sign_as(username, body).await;
        self.client
            .request(method, self.url(path))
            .header("Username", username)
            .header("Signature", signature)
            .header("Content-Type", "application/json")
            .body(body.to_string())
    }
}
