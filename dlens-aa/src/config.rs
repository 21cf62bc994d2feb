//! Service configuration resolution
//!
//! Settings resolve CLI → ENV → TOML → compiled default. The TOML file is
//! the shared dlens config (`~/.config/dlens/config.toml`); keys used here:
//! `port`, `model_path`, `advice_webhook_url`.

use crate::advice::generator::DEFAULT_WEBHOOK_URL;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5000;

/// Environment variable overriding the HTTP port
pub const PORT_ENV: &str = "DLENS_AA_PORT";

/// Environment variable overriding the model path
pub const MODEL_PATH_ENV: &str = "DLENS_MODEL_PATH";

/// Environment variable overriding the advice webhook endpoint
pub const ADVICE_WEBHOOK_ENV: &str = "DLENS_ADVICE_WEBHOOK_URL";

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    /// ONNX detection model location
    pub model_path: PathBuf,
    /// Chatbot webhook endpoint for advice generation
    pub advice_webhook_url: String,
}

impl ServiceConfig {
    /// Resolve configuration for the given root folder and CLI overrides
    pub fn resolve(root: &Path, cli_model: Option<&Path>, cli_port: Option<u16>) -> Self {
        let toml = load_config_table();

        let port = cli_port
            .or_else(|| env_value(PORT_ENV).and_then(|v| v.parse().ok()))
            .or_else(|| {
                toml.as_ref()
                    .and_then(|t| t.get("port"))
                    .and_then(|v| v.as_integer())
                    .and_then(|v| u16::try_from(v).ok())
            })
            .unwrap_or(DEFAULT_PORT);

        let model_path = cli_model
            .map(Path::to_path_buf)
            .or_else(|| env_value(MODEL_PATH_ENV).map(PathBuf::from))
            .or_else(|| {
                toml.as_ref()
                    .and_then(|t| t.get("model_path"))
                    .and_then(|v| v.as_str())
                    .map(PathBuf::from)
            })
            .unwrap_or_else(|| default_model_path(root));

        let advice_webhook_url = env_value(ADVICE_WEBHOOK_ENV)
            .or_else(|| {
                toml.as_ref()
                    .and_then(|t| t.get("advice_webhook_url"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_WEBHOOK_URL.to_string());

        info!(
            port,
            model_path = %model_path.display(),
            advice_webhook_url = %advice_webhook_url,
            "Service configuration resolved"
        );

        Self {
            port,
            model_path,
            advice_webhook_url,
        }
    }
}

/// Default model location within the root folder
pub fn default_model_path(root: &Path) -> PathBuf {
    root.join("models").join("acne_detect.onnx")
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn load_config_table() -> Option<toml::Value> {
    let path = dlens_common::config::config_file_path()?;
    let contents = std::fs::read_to_string(path).ok()?;
    toml::from_str(&contents).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_win() {
        let config = ServiceConfig::resolve(
            Path::new("/data/dlens"),
            Some(Path::new("/models/custom.onnx")),
            Some(9100),
        );
        assert_eq!(config.port, 9100);
        assert_eq!(config.model_path, PathBuf::from("/models/custom.onnx"));
    }

    #[test]
    fn default_model_path_is_under_root() {
        assert_eq!(
            default_model_path(Path::new("/data/dlens")),
            PathBuf::from("/data/dlens/models/acne_detect.onnx")
        );
    }
}
