use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_DATA_FILE: &str = "data.json";
pub const DEFAULT_CACHE_DIR: &str = ".mealplan";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Configuration for the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind: String,
    pub port: u16,
    /// JSON file holding the meal plan
    pub data_file: PathBuf,
    /// Page to serve at `/` instead of the built-in one
    pub page: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            page: None,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Configuration for the persistence client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the meal plan server
    pub server_url: String,
    /// Directory used as on-device fallback storage
    pub cache_dir: PathBuf,
    /// Per-request timeout for the remote tier
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            timeout: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    pub fn data_url(&self) -> String {
        format!("{}/api/data", self.server_url.trim_end_matches('/'))
    }
}

/// Gesture timing for inline editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditTiming {
    /// Window in which a second click counts as a double click
    pub double_click: Duration,
    /// Idle time after typing before a multi-line field saves itself
    pub debounce: Duration,
}

impl Default for EditTiming {
    fn default() -> Self {
        Self {
            double_click: Duration::from_millis(400),
            debounce: Duration::from_secs(1),
        }
    }
}

/// How long save feedback stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackTiming {
    pub success_delay: Duration,
    pub success_hold: Duration,
    pub error_hold: Duration,
    pub notification_hold: Duration,
}

impl Default for FeedbackTiming {
    fn default() -> Self {
        Self {
            success_delay: Duration::from_millis(200),
            success_hold: Duration::from_secs(1),
            error_hold: Duration::from_secs(2),
            notification_hold: Duration::from_secs(3),
        }
    }
}
