//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use serde::Deserialize;
use url::Url;

/// Directory under the public root that holds generated QR images.
pub const QR_SUBDIR: &str = "qrcodes";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// HTTP listen address.
    #[serde(default = "default_host")]
    pub bind_host: String,

    /// Attach a permissive CORS layer.
    #[serde(default = "default_true")]
    pub cors_permissive: bool,

    // === Storage ===
    /// JSON file holding the certificate list.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Static asset root served at `/`.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    // === QR Codes ===
    /// Generate QR images when certificates are issued.
    #[serde(default = "default_true")]
    pub qr_enabled: bool,

    /// Base URL encoded into QR codes (e.g. `https://certs.example.org`).
    #[serde(default)]
    pub public_base_url: Option<String>,

    // === Logging ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_true() -> bool {
    true
}

fn default_store_path() -> PathBuf {
    PathBuf::from("certificates.json")
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_host: default_host(),
            cors_permissive: true,
            store_path: default_store_path(),
            public_dir: default_public_dir(),
            qr_enabled: true,
            public_base_url: None,
            rust_log: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Apply command-line overrides. Call before [`Config::validate`].
    pub fn apply_overrides(&mut self, port: Option<u16>) {
        if let Some(port) = port {
            self.port = port;
        }
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("PORT must be non-zero".to_string());
        }

        if self.store_path.as_os_str().is_empty() {
            return Err("STORE_PATH must not be empty".to_string());
        }

        if let Some(base) = &self.public_base_url {
            let url = Url::parse(base)
                .map_err(|e| format!("PUBLIC_BASE_URL is not a valid URL: {}", e))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err("PUBLIC_BASE_URL must use http or https".to_string());
            }
        }

        Ok(())
    }

    /// Base URL for verification links, falling back to the local listener.
    pub fn verification_base(&self) -> String {
        match &self.public_base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.port),
        }
    }

    /// Directory that receives generated QR images.
    pub fn qr_dir(&self) -> PathBuf {
        self.public_dir.join(QR_SUBDIR)
    }

    /// Listen address as `host:port`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}
