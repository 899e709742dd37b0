use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the enriched books CSV used as the candidate catalog
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Firestore project holding user lists and recommendations.
    /// When unset, an in-memory store is used instead.
    #[serde(default)]
    pub firestore_project_id: Option<String>,

    /// Firestore REST API base URL
    #[serde(default = "default_firestore_api_url")]
    pub firestore_api_url: String,

    /// Firestore database name
    #[serde(default = "default_firestore_database")]
    pub firestore_database: String,

    /// OAuth access token sent as a bearer token to Firestore
    #[serde(default)]
    pub firestore_access_token: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_catalog_path() -> String {
    "books_enriched.csv".to_string()
}

fn default_firestore_api_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

fn default_firestore_database() -> String {
    "(default)".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
