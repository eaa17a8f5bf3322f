// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tvplus_playlist::PlaylistDefaults;

pub const CONFIG_SCHEMA_VERSION: &str = "1";
pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_APP_URL: &str = "https://i.mjh.nz/SamsungTVPlus/.app.json";
pub const DEFAULT_EPG_URL: &str = "https://i.mjh.nz/SamsungTVPlus/all.xml.gz";

#[derive(Debug, Clone, Serialize)]
pub struct UpstreamConfig {
    pub app_url: String,
    pub epg_url: String,
    pub timeout: Duration,
    pub retry_attempts: usize,
    pub retry_base_backoff_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            app_url: DEFAULT_APP_URL.to_string(),
            epg_url: DEFAULT_EPG_URL.to_string(),
            timeout: Duration::from_secs(15),
            retry_attempts: 3,
            retry_base_backoff_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub upstream: UpstreamConfig,
    pub playlist_defaults: PlaylistDefaults,
    pub catalog_ttl: Duration,
    pub catalog_refresh_interval: Duration,
    pub favicon_path: PathBuf,
    pub readiness_requires_catalog: bool,
    pub shutdown_drain: Duration,
    pub log_json: bool,
    pub in_container: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{DEFAULT_PORT}"),
            upstream: UpstreamConfig::default(),
            playlist_defaults: PlaylistDefaults::default(),
            catalog_ttl: Duration::from_secs(300),
            catalog_refresh_interval: Duration::from_secs(900),
            favicon_path: PathBuf::from("favicon.ico"),
            readiness_requires_catalog: true,
            shutdown_drain: Duration::from_secs(2),
            log_json: false,
            in_container: false,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

/// Reads settings through `lookup` so tests can supply a map instead of the
/// process environment.
struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.trim().is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        self.string(name).as_deref().and_then(parse_bool)
    }

    fn u64(&self, name: &str, default: u64) -> u64 {
        self.string(name)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(default)
    }

    fn duration_ms(&self, name: &str, default: Duration) -> Duration {
        Duration::from_millis(self.u64(name, default.as_millis() as u64))
    }
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };
        let defaults = Self::default();
        let in_container = env.bool("IS_DOCKER").unwrap_or(false);
        let bind_addr = env.string("TVPLUS_BIND").unwrap_or_else(|| {
            let port = env
                .string("PORT")
                .and_then(|p| p.trim().parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT);
            format!("0.0.0.0:{port}")
        });
        let upstream_defaults = UpstreamConfig::default();

        Self {
            bind_addr,
            upstream: UpstreamConfig {
                app_url: env
                    .string("TVPLUS_APP_URL")
                    .unwrap_or(upstream_defaults.app_url),
                epg_url: env
                    .string("TVPLUS_EPG_URL")
                    .unwrap_or(upstream_defaults.epg_url),
                timeout: env.duration_ms("TVPLUS_UPSTREAM_TIMEOUT_MS", upstream_defaults.timeout),
                retry_attempts: env.u64(
                    "TVPLUS_UPSTREAM_RETRY_ATTEMPTS",
                    upstream_defaults.retry_attempts as u64,
                ) as usize,
                retry_base_backoff_ms: env.u64(
                    "TVPLUS_UPSTREAM_RETRY_BASE_MS",
                    upstream_defaults.retry_base_backoff_ms,
                ),
            },
            playlist_defaults: PlaylistDefaults {
                regions: env.string("REGIONS"),
                groups: env.string("GROUPS"),
            },
            catalog_ttl: env.duration_ms("TVPLUS_CATALOG_TTL_MS", defaults.catalog_ttl),
            catalog_refresh_interval: env
                .duration_ms("TVPLUS_CATALOG_REFRESH_MS", defaults.catalog_refresh_interval),
            favicon_path: env
                .string("TVPLUS_FAVICON_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.favicon_path),
            readiness_requires_catalog: env
                .bool("TVPLUS_READINESS_REQUIRES_CATALOG")
                .unwrap_or(defaults.readiness_requires_catalog),
            shutdown_drain: env.duration_ms("TVPLUS_SHUTDOWN_DRAIN_MS", defaults.shutdown_drain),
            log_json: env.bool("TVPLUS_LOG_JSON").unwrap_or(in_container),
            in_container,
        }
    }
}

fn validate_upstream_url(name: &str, raw: &str) -> Result<(), String> {
    let url = reqwest::Url::parse(raw).map_err(|e| format!("{name} is not a valid url: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("{name} must use http or https, got {}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err(format!("{name} is missing a host"));
    }
    Ok(())
}

pub fn validate_startup_config_contract(cfg: &ServerConfig) -> Result<(), String> {
    cfg.bind_addr
        .parse::<SocketAddr>()
        .map_err(|e| format!("invalid bind addr {}: {e}", cfg.bind_addr))?;
    if cfg.upstream.timeout.is_zero() {
        return Err("upstream timeout must be > 0".to_string());
    }
    if cfg.upstream.retry_attempts == 0 {
        return Err("upstream retry attempts must be >= 1".to_string());
    }
    validate_upstream_url("app url", &cfg.upstream.app_url)?;
    validate_upstream_url("epg url", &cfg.upstream.epg_url)?;
    Ok(())
}
