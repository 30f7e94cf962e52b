//! Common test utilities for E2E tests

use lumagram::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "test.example.com".to_string(),
                protocol: "http".to_string(),
            },
            database: config::DatabaseConfig { path: db_path },
            auth: config::AuthConfig {
                token_secret: "test-secret-key-32-bytes-long!!!".to_string(),
                access_token_ttl: 3600,
                refresh_token_ttl: 604800,
            },
            verification: config::VerificationConfig {
                code_length: 4,
                email_code_ttl: 180,
                sms_code_ttl: 300,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

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

        // Build router
        let app = lumagram::build_router(state.clone());

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

    /// Register an account through the API, leaving it inactive.
    ///
    /// Email is `{username}@example.com`; the phone number is derived
    /// from a hash of the username so parallel fixtures stay unique.
    pub async fn register(&self, username: &str) -> serde_json::Value {
        let response = self
            .client
            .post(self.url("/api/auth/register/"))
            .json(&serde_json::json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "phone_number": phone_for(username),
                "password": "s3cret-pass",
                "confirm_password": "s3cret-pass",
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 201, "registration should succeed");
        response.json().await.unwrap()
    }

    /// Register and verify an account, returning (user_id, access token).
    pub async fn register_and_activate(&self, username: &str) -> (String, String) {
        let body = self.register(username).await;
        let user_id = body["user"]["id"].as_str().unwrap().to_string();

        let code = self
            .state
            .db
            .get_verification_code(&user_id)
            .await
            .unwrap()
            .expect("verification code should exist after registration");

        let response = self
            .client
            .post(self.url("/api/auth/verify-email/"))
            .json(&serde_json::json!({
                "identifier": format!("{}@example.com", username),
                "code": code.code_email,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "verification should succeed");

        let body: serde_json::Value = response.json().await.unwrap();
        let access = body["access"].as_str().unwrap().to_string();

        (user_id, access)
    }

    /// Login with a username, returning the access token.
    pub async fn login(&self, username: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/auth/login/"))
            .json(&serde_json::json!({
                "identifier": username,
                "password": "s3cret-pass",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "login should succeed");

        let body: serde_json::Value = response.json().await.unwrap();
        body["access"].as_str().unwrap().to_string()
    }
}

/// Deterministic, per-username phone number for fixtures.
pub fn phone_for(username: &str) -> String {
    let digits: u64 = username
        .bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64))
        % 1_000_000_000;
    format!("+998{:09}", digits)
}
