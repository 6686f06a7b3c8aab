//! Application configuration loaded from environment variables.
//!
//! A `.env` file is read first when present, so local runs need no exports.

use std::env;

/// Which document store backs the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    /// In-process store; data is lost on restart.
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Firebase web API key (Identity Toolkit)
    pub firebase_api_key: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Document store selection
    pub store_backend: StoreBackend,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Config for tests: memory store and a fixed signing key.
    pub fn test_default() -> Self {
        Self {
            firebase_api_key: "test_api_key".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            store_backend: StoreBackend::Memory,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "firestore" => StoreBackend::Firestore,
            "memory" => StoreBackend::Memory,
            _ => return Err(ConfigError::Invalid("STORE_BACKEND")),
        };

        let firebase_api_key = env::var("FIREBASE_API_KEY")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?;
        if firebase_api_key.is_empty() {
            return Err(ConfigError::Invalid("FIREBASE_API_KEY"));
        }

        Ok(Self {
            firebase_api_key,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            store_backend,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
