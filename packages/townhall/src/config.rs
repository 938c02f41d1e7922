use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// =============================================================================
// Unified config (figment-deserialized from defaults / config.toml / env vars)
// =============================================================================
//
//   config.toml:     [server]
//                    api_url = "https://qa.example.com/api"
//
//   env var:         TOWNHALL_SERVER__API_URL=https://qa.example.com/api
//
//   (double underscore = nesting; single underscore stays within field names)

/// Top-level tunable configuration, deserialized by figment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerFileConfig,
    #[serde(default)]
    pub ui: UiFileConfig,
}

/// Where the Q&A server lives (under `[server]` in config.toml).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerFileConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Socket base URL. Derived from `api_url` (http → ws, https → wss) when unset.
    #[serde(default)]
    pub ws_url: Option<String>,
}

impl Default for ServerFileConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            ws_url: None,
        }
    }
}

/// Terminal UI tunables (under `[ui]` in config.toml).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UiFileConfig {
    /// Input poll interval; socket updates are drawn at most this late.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for UiFileConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

fn default_api_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_tick_ms() -> u64 {
    100
}

/// Build a figment that layers: defaults → config.toml → TOWNHALL_* env vars.
pub fn load_config(config_dir: &Path) -> figment::Figment {
    use figment::{
        Figment,
        providers::{Env, Format, Serialized, Toml},
    };

    Figment::from(Serialized::defaults(FileConfig::default()))
        .merge(Toml::file(config_dir.join("config.toml")))
        .merge(Env::prefixed("TOWNHALL_").split("__"))
}

// =============================================================================
// Runtime config (derived from FileConfig)
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// HTTP base, no trailing slash.
    pub api_url: String,
    /// Socket base, no trailing slash.
    pub ws_url: String,
    pub tick: Duration,
}

impl ClientConfig {
    pub fn from_file(fc: &FileConfig) -> Result<Self> {
        let api_url = fc.server.api_url.trim_end_matches('/').to_string();
        let ws_url = match &fc.server.ws_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => derive_ws_url(&api_url)?,
        };
        Ok(Self {
            api_url,
            ws_url,
            tick: Duration::from_millis(fc.ui.tick_ms.max(10)),
        })
    }
}

fn derive_ws_url(api_url: &str) -> Result<String> {
    if let Some(rest) = api_url.strip_prefix("https://") {
        Ok(format!("wss://{rest}"))
    } else if let Some(rest) = api_url.strip_prefix("http://") {
        Ok(format!("ws://{rest}"))
    } else {
        anyhow::bail!(
            "api_url must start with http:// or https:// (got '{}'); set server.ws_url explicitly otherwise",
            api_url
        )
    }
}

// =============================================================================
// Directory layout (not tunable via figment, derived from --config-dir)
// =============================================================================

#[derive(Clone, Debug)]
pub struct TownhallConfig {
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl TownhallConfig {
    pub fn new(custom_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match custom_dir {
            Some(dir) => dir,
            None => dirs::home_dir()
                .context("Could not find home directory")?
                .join(".townhall"),
        };

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

        let logs_dir = data_dir.join("logs");
        std::fs::create_dir_all(&logs_dir)
            .with_context(|| format!("Failed to create logs directory: {:?}", logs_dir))?;

        Ok(Self { data_dir, logs_dir })
    }

    pub fn config_toml_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }

    pub fn log_path(&self) -> PathBuf {
        self.logs_dir.join("townhall.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── defaults ────────────────────────────────────────────────────────

    #[test]
    fn test_file_config_defaults() {
        let fc = FileConfig::default();
        assert_eq!(fc.server.api_url, "http://127.0.0.1:8080");
        assert!(fc.server.ws_url.is_none());
        assert_eq!(fc.ui.tick_ms, 100);
    }

    // ── ClientConfig::from_file ─────────────────────────────────────────

    #[test]
    fn test_ws_url_derived_from_http() {
        let cc = ClientConfig::from_file(&FileConfig::default()).unwrap();
        assert_eq!(cc.api_url, "http://127.0.0.1:8080");
        assert_eq!(cc.ws_url, "ws://127.0.0.1:8080");
        assert_eq!(cc.tick, Duration::from_millis(100));
    }

    #[test]
    fn test_ws_url_derived_from_https_and_slash_trimmed() {
        let fc = FileConfig {
            server: ServerFileConfig {
                api_url: "https://qa.example.com/api/".into(),
                ws_url: None,
            },
            ..Default::default()
        };
        let cc = ClientConfig::from_file(&fc).unwrap();
        assert_eq!(cc.api_url, "https://qa.example.com/api");
        assert_eq!(cc.ws_url, "wss://qa.example.com/api");
    }

    #[test]
    fn test_explicit_ws_url_wins() {
        let fc = FileConfig {
            server: ServerFileConfig {
                api_url: "http://localhost:3000".into(),
                ws_url: Some("ws://localhost:3001/".into()),
            },
            ..Default::default()
        };
        let cc = ClientConfig::from_file(&fc).unwrap();
        assert_eq!(cc.ws_url, "ws://localhost:3001");
    }

    #[test]
    fn test_unknown_scheme_needs_explicit_ws_url() {
        let fc = FileConfig {
            server: ServerFileConfig {
                api_url: "localhost:3000".into(),
                ws_url: None,
            },
            ..Default::default()
        };
        let err = ClientConfig::from_file(&fc).unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_tick_has_floor() {
        let fc = FileConfig {
            ui: UiFileConfig { tick_ms: 0 },
            ..Default::default()
        };
        let cc = ClientConfig::from_file(&fc).unwrap();
        assert_eq!(cc.tick, Duration::from_millis(10));
    }

    // ── TownhallConfig ──────────────────────────────────────────────────

    #[test]
    fn test_townhall_config_with_custom_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config = TownhallConfig::new(Some(tmp.path().to_path_buf())).unwrap();

        assert_eq!(config.data_dir, tmp.path());
        assert!(tmp.path().join("logs").exists());
        assert_eq!(config.config_toml_path(), tmp.path().join("config.toml"));
        assert_eq!(config.log_path(), tmp.path().join("logs/townhall.log"));
    }

    // ── load_config ─────────────────────────────────────────────────────

    #[test]
    fn test_load_config_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let fc: FileConfig = load_config(tmp.path()).extract().unwrap();
        assert_eq!(fc.ui.tick_ms, 100);
        assert!(fc.server.ws_url.is_none());
    }

    #[test]
    fn test_load_config_toml_sets_values() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("config.toml"),
            "[server]\napi_url = \"https://qa.example.com\"\n\n[ui]\ntick_ms = 250\n",
        )
        .unwrap();
        let fc: FileConfig = load_config(tmp.path()).extract().unwrap();
        assert_eq!(fc.server.api_url, "https://qa.example.com");
        assert_eq!(fc.ui.tick_ms, 250);
    }

    #[test]
    fn test_load_config_partial_section_keeps_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("config.toml"),
            "[server]\nws_url = \"ws://elsewhere:9000\"\n",
        )
        .unwrap();
        let fc: FileConfig = load_config(tmp.path()).extract().unwrap();
        assert_eq!(fc.server.api_url, "http://127.0.0.1:8080");
        assert_eq!(fc.server.ws_url.as_deref(), Some("ws://elsewhere:9000"));
    }
}
