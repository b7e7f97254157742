use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

// =============================================================================
// Unified config (figment-deserialized from defaults / config.toml / env vars)
// =============================================================================
//
// Two equivalent ways to configure:
//
//   config.toml:     api_url = "https://shop.example.com/api"
//
//   env var:         SHOPDESK_API_URL=https://shop.example.com/api

/// Tunable settings, deserialized by figment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Push-channel endpoint. Derived from `api_url` when unset.
    #[serde(default)]
    pub channel_url: Option<String>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            channel_url: None,
        }
    }
}

fn default_api_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

/// Build a figment that layers: defaults → config.toml → SHOPDESK_* env vars.
pub fn load_config(config_dir: &Path) -> figment::Figment {
    use figment::{
        Figment,
        providers::{Env, Format, Serialized, Toml},
    };

    Figment::from(Serialized::defaults(FileConfig::default()))
        .merge(Toml::file(config_dir.join("config.toml")))
        .merge(Env::prefixed("SHOPDESK_"))
}

/// Resolved configuration plus the directory layout for persisted state.
#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    pub api_url: String,
    pub channel_url: String,
    pub config_dir: PathBuf,
}

impl ConsoleConfig {
    pub fn new(custom_dir: Option<PathBuf>) -> Result<Self> {
        let config_dir = custom_dir.unwrap_or_else(|| {
            dirs::home_dir()
                .expect("Could not find home directory")
                .join(".shopdesk")
        });

        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;

        let fc: FileConfig = load_config(&config_dir)
            .extract()
            .context("Invalid configuration")?;

        let api_url = fc.api_url.trim_end_matches('/').to_string();
        let channel_url = fc
            .channel_url
            .unwrap_or_else(|| derive_channel_url(&api_url));

        debug!(%api_url, %channel_url, "configuration loaded");

        Ok(Self {
            api_url,
            channel_url,
            config_dir,
        })
    }

    fn token_path(&self) -> PathBuf {
        self.config_dir.join("token")
    }

    /// Read the persisted session token, if any.
    pub fn load_token(&self) -> Option<String> {
        let token = std::fs::read_to_string(self.token_path()).ok()?;
        let token = token.trim().to_string();
        if token.is_empty() { None } else { Some(token) }
    }

    pub fn save_token(&self, token: &str) -> Result<()> {
        std::fs::write(self.token_path(), token)
            .with_context(|| format!("Failed to write token file: {:?}", self.token_path()))
    }

    pub fn clear_token(&self) -> Result<()> {
        match std::fs::remove_file(self.token_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to remove token file: {:?}", self.token_path())
            }),
        }
    }
}

/// `https://host/path` → `wss://host/path/ws` (and `http` → `ws`).
fn derive_channel_url(api_url: &str) -> String {
    let ws = if let Some(rest) = api_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = api_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        api_url.to_string()
    };
    format!("{}/ws", ws.trim_end_matches('/'))
}
