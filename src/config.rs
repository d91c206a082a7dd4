use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;

use crate::scanner::normalize_prefix;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    pub interval_secs: u64,
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingMode {
    Registry,
    Cache,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    pub source: ListingMode,
}

/// One served directory tree.
#[derive(Debug, Clone, Deserialize)]
pub struct FilePathConfig {
    pub disk_path: String,
    pub serve_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub monitor: MonitorConfig,
    pub listing: ListingConfig,
    #[serde(default)]
    pub file_paths: Vec<FilePathConfig>,
}

const DEFAULTS: &str = include_str!("../config/default.toml");

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        match ::config::Config::builder()
            .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
            .build()
        {
            Ok(cfg) => match cfg.try_deserialize() {
                Ok(app_cfg) => app_cfg,
                Err(e) => {
                    eprintln!("FATAL: Failed to deserialize default config: {}", e);
                    panic!("Failed to deserialize default config: {}", e);
                }
            },
            Err(e) => {
                eprintln!("FATAL: Failed to parse default config: {}", e);
                panic!("Failed to parse default config: {}", e);
            }
        }
    }
}

pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();

    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
        .add_source(::config::File::with_name("mediasync").required(false))
        .add_source(::config::File::with_name("/etc/mediasync/config").required(false));

    if let Ok(custom_path) = std::env::var("MEDIASYNC_CONFIG") {
        builder = builder.add_source(::config::File::with_name(&custom_path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(::config::Environment::with_prefix("MEDIASYNC").separator("__"));

    let cfg = builder.build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

pub fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }

    if cfg.monitor.interval_secs == 0 {
        return Err(anyhow::anyhow!("monitor.interval_secs must be > 0"));
    }

    if cfg.file_paths.is_empty() {
        tracing::warn!("no file_paths configured, only /fileinfo will answer");
    }
    let mut prefixes = HashSet::new();
    for fp in &cfg.file_paths {
        if fp.disk_path.trim().is_empty() {
            return Err(anyhow::anyhow!("file_paths.disk_path must not be empty"));
        }
        if !fp.serve_path.starts_with('/') {
            return Err(anyhow::anyhow!("serve_path must start with '/': {}", fp.serve_path));
        }
        let prefix = normalize_prefix(&fp.serve_path);
        if prefix == "/fileinfo/" {
            return Err(anyhow::anyhow!("serve_path collides with /fileinfo"));
        }
        if !prefixes.insert(prefix.clone()) {
            return Err(anyhow::anyhow!("duplicate serve_path: {}", prefix));
        }
    }

    Ok(())
}
