//! Node configuration (§6.3)
//!
//! Full environment parsing is an external concern (§1); `from_env`
//! is a thin convenience, not a general config framework.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Openapi,
    Metrics,
    Migrations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_db_uri")]
    pub db_uri: String,
    #[serde(default = "default_db_name_primary")]
    pub db_name_primary: String,
    #[serde(default = "default_db_name_data")]
    pub db_name_data: String,
    #[serde(default)]
    pub enabled_features: Vec<Feature>,
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
    pub trust_anchor_base_url: String,
    /// 66-hex compressed secp256k1 public key of the trust anchor.
    pub trust_anchor_public_key: String,
    /// 64-hex secp256k1 secret key identifying this node.
    pub node_secret_key: String,
    pub node_public_endpoint: String,
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    #[serde(default = "default_web_port")]
    pub web_port: u16,
}

fn default_db_uri() -> String {
    "memory://local".to_string()
}
fn default_db_name_primary() -> String {
    "primary".to_string()
}
fn default_db_name_data() -> String {
    "data".to_string()
}
fn default_log_level() -> LogLevel {
    LogLevel::Info
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_web_port() -> u16 {
    8080
}

impl NodeConfig {
    /// Build a config from `NILDB_*` environment variables, falling back to
    /// development defaults for anything not set.
    pub fn from_env() -> Self {
        Self {
            db_uri: std::env::var("NILDB_DB_URI").unwrap_or_else(|_| default_db_uri()),
            db_name_primary: std::env::var("NILDB_DB_NAME_PRIMARY")
                .unwrap_or_else(|_| default_db_name_primary()),
            db_name_data: std::env::var("NILDB_DB_NAME_DATA")
                .unwrap_or_else(|_| default_db_name_data()),
            enabled_features: Vec::new(),
            log_level: default_log_level(),
            trust_anchor_base_url: std::env::var("NILDB_TRUST_ANCHOR_BASE_URL")
                .unwrap_or_default(),
            trust_anchor_public_key: std::env::var("NILDB_TRUST_ANCHOR_PUBLIC_KEY")
                .unwrap_or_default(),
            node_secret_key: std::env::var("NILDB_NODE_SECRET_KEY").unwrap_or_default(),
            node_public_endpoint: std::env::var("NILDB_NODE_PUBLIC_ENDPOINT")
                .unwrap_or_default(),
            metrics_port: default_metrics_port(),
            web_port: default_web_port(),
        }
    }

    pub fn has_feature(&self, f: Feature) -> bool {
        self.enabled_features.contains(&f)
    }
}
