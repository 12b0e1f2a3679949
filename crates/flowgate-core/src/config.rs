//! Application configuration: XDG config file with environment overrides.
//!
//! `load_or_init` reads `~/.config/flowgate/config.toml`, writing the
//! defaults on first run, then applies `FLOWGATE_*` environment overrides so
//! deployments can stay file-less. The resulting struct is validated once
//! here; the core components trust it afterwards.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Outbound workflow webhook settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Base URL of the workflow automation service.
    pub webhook_url: String,
    /// Bearer token sent on every webhook call.
    pub api_key: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum retries after the first attempt.
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub retry_delay_ms: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            webhook_url: "http://localhost:5678".to_string(),
            api_key: String::new(),
            timeout_ms: 30_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
        }
    }
}

impl WorkflowConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Inbound HTTP surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    pub listen_addr: String,
    /// Shared secret expected in the `x-api-key` request header.
    pub internal_api_key: String,
    /// Requests allowed per client per window.
    pub rate_limit: u32,
    /// Rate limit window in milliseconds.
    pub rate_limit_window_ms: u64,
    /// Interval in seconds between rate-limit record sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3000".to_string(),
            internal_api_key: String::new(),
            rate_limit: 10,
            rate_limit_window_ms: 10_000,
            sweep_interval_secs: 300,
        }
    }
}

impl ServerConfig {
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Feature flags gating optional behavior.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Retry transient outbound failures automatically.
    pub auto_retry: bool,
    /// Emit per-attempt diagnostic logs for outbound failures.
    pub error_logging: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            auto_retry: true,
            error_logging: true,
        }
    }
}

/// Global configuration loaded from `~/.config/flowgate/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub features: FeatureFlags,
}

impl AppConfig {
    /// Check the invariants the rest of the system relies on.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.workflow.webhook_url)
            .with_context(|| format!("invalid webhook_url: {}", self.workflow.webhook_url))?;
        if self.workflow.timeout_ms == 0 {
            bail!("workflow.timeout_ms must be positive");
        }
        if self.workflow.retry_delay_ms == 0 {
            bail!("workflow.retry_delay_ms must be positive");
        }
        if self.server.rate_limit == 0 {
            bail!("server.rate_limit must be positive");
        }
        if self.server.rate_limit_window_ms == 0 {
            bail!("server.rate_limit_window_ms must be positive");
        }
        self.server
            .listen_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid listen_addr: {}", self.server.listen_addr))?;
        Ok(())
    }

    /// Apply `FLOWGATE_*` environment overrides on top of the file values.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        override_string(&mut self.workflow.webhook_url, "FLOWGATE_WEBHOOK_URL");
        override_string(&mut self.workflow.api_key, "FLOWGATE_API_KEY");
        override_parsed(&mut self.workflow.timeout_ms, "FLOWGATE_REQUEST_TIMEOUT_MS")?;
        override_parsed(&mut self.workflow.max_retries, "FLOWGATE_MAX_RETRY_ATTEMPTS")?;
        override_parsed(&mut self.workflow.retry_delay_ms, "FLOWGATE_RETRY_DELAY_MS")?;
        override_string(&mut self.server.listen_addr, "FLOWGATE_LISTEN_ADDR");
        override_string(&mut self.server.internal_api_key, "FLOWGATE_INTERNAL_API_KEY");
        override_parsed(&mut self.server.rate_limit, "FLOWGATE_RATE_LIMIT")?;
        override_parsed(
            &mut self.server.rate_limit_window_ms,
            "FLOWGATE_RATE_LIMIT_WINDOW_MS",
        )?;
        override_bool(&mut self.features.auto_retry, "FLOWGATE_ENABLE_AUTO_RETRY");
        override_bool(
            &mut self.features.error_logging,
            "FLOWGATE_ENABLE_ERROR_LOGGING",
        );
        Ok(())
    }
}

fn override_string(slot: &mut String, var: &str) {
    if let Ok(value) = std::env::var(var) {
        if !value.is_empty() {
            *slot = value;
        }
    }
}

fn override_parsed<T: std::str::FromStr>(slot: &mut T, var: &str) -> Result<()>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Ok(value) = std::env::var(var) {
        *slot = value
            .parse()
            .with_context(|| format!("invalid value for {var}: {value}"))?;
    }
    Ok(())
}

fn override_bool(slot: &mut bool, var: &str) {
    if let Ok(value) = std::env::var(var) {
        *slot = value == "true" || value == "1";
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("flowgate")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk (creating a default file if none exists),
/// apply environment overrides, and validate.
pub fn load_or_init() -> Result<AppConfig> {
    let path = config_path()?;
    let mut cfg = if path.exists() {
        let data = fs::read_to_string(&path)?;
        toml::from_str(&data).with_context(|| format!("invalid config at {}", path.display()))?
    } else {
        let default_cfg = AppConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        default_cfg
    };

    cfg.apply_env_overrides()?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.workflow.webhook_url, "http://localhost:5678");
        assert_eq!(cfg.workflow.timeout_ms, 30_000);
        assert_eq!(cfg.workflow.max_retries, 3);
        assert_eq!(cfg.workflow.retry_delay_ms, 1_000);
        assert_eq!(cfg.server.rate_limit, 10);
        assert_eq!(cfg.server.rate_limit_window_ms, 10_000);
        assert_eq!(cfg.server.sweep_interval_secs, 300);
        assert!(cfg.features.auto_retry);
        assert!(cfg.features.error_logging);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = AppConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: AppConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.workflow.webhook_url, cfg.workflow.webhook_url);
        assert_eq!(parsed.workflow.max_retries, cfg.workflow.max_retries);
        assert_eq!(parsed.server.rate_limit, cfg.server.rate_limit);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            [workflow]
            webhook_url = "https://flows.example.com"
            api_key = "secret"
            timeout_ms = 5000
            max_retries = 1
            retry_delay_ms = 250

            [server]
            listen_addr = "0.0.0.0:8080"
            internal_api_key = "internal"
            rate_limit = 50
            rate_limit_window_ms = 60000
            sweep_interval_secs = 60

            [features]
            auto_retry = false
            error_logging = false
        "#;
        let cfg: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.workflow.webhook_url, "https://flows.example.com");
        assert_eq!(cfg.workflow.timeout(), Duration::from_millis(5000));
        assert_eq!(cfg.server.rate_limit, 50);
        assert!(!cfg.features.auto_retry);
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let toml = r#"
            [workflow]
            webhook_url = "http://flows.internal:5678"
            api_key = "k"
            timeout_ms = 30000
            max_retries = 3
            retry_delay_ms = 1000
        "#;
        let cfg: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.server.rate_limit, 10);
        assert!(cfg.features.error_logging);
    }

    // One test for all env behavior: tests run in parallel within the
    // process and apply_env_overrides reads every FLOWGATE_* variable.
    #[test]
    fn env_overrides_replace_file_values() {
        std::env::set_var("FLOWGATE_WEBHOOK_URL", "https://flows.example.net");
        std::env::set_var("FLOWGATE_MAX_RETRY_ATTEMPTS", "5");
        std::env::set_var("FLOWGATE_ENABLE_AUTO_RETRY", "false");

        let mut cfg = AppConfig::default();
        cfg.apply_env_overrides().unwrap();
        assert_eq!(cfg.workflow.webhook_url, "https://flows.example.net");
        assert_eq!(cfg.workflow.max_retries, 5);
        assert!(!cfg.features.auto_retry);

        std::env::set_var("FLOWGATE_RETRY_DELAY_MS", "soon");
        let mut cfg = AppConfig::default();
        assert!(cfg.apply_env_overrides().is_err());

        for var in [
            "FLOWGATE_WEBHOOK_URL",
            "FLOWGATE_MAX_RETRY_ATTEMPTS",
            "FLOWGATE_ENABLE_AUTO_RETRY",
            "FLOWGATE_RETRY_DELAY_MS",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn validate_rejects_bad_url_and_zero_durations() {
        let mut cfg = AppConfig::default();
        cfg.workflow.webhook_url = "not a url".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.workflow.timeout_ms = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.server.rate_limit = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.server.listen_addr = "localhost".to_string();
        assert!(cfg.validate().is_err());
    }
}
