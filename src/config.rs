use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Tunables loaded from the optional TOML file. Every field has a default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub speedtest: SpeedtestConfig,
    #[serde(default)]
    pub cloudflare: CloudflareConfig,
    #[serde(default)]
    pub pushplus: PushPlusConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeedtestConfig {
    #[serde(default = "default_speedtest_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloudflareConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_record_type")]
    pub record_type: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,  // 1 表示自动
    #[serde(default)]
    pub proxied: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushPlusConfig {
    #[serde(default = "default_pushplus_url")]
    pub url: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default = "default_channel")]
    pub channel: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_speedtest_url() -> String {
    "https://ip.164746.xyz/ipTop.html".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_api_base() -> String {
    "https://api.cloudflare.com/client/v4".to_string()
}

fn default_record_type() -> String {
    "A".to_string()
}

fn default_ttl() -> u32 {
    1
}

fn default_pushplus_url() -> String {
    "http://www.pushplus.plus/send".to_string()
}

fn default_title() -> String {
    "IP优选DNSCF推送".to_string()
}

fn default_template() -> String {
    "markdown".to_string()
}

fn default_channel() -> String {
    "wechat".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for SpeedtestConfig {
    fn default() -> Self {
        Self {
            url: default_speedtest_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl Default for CloudflareConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            record_type: default_record_type(),
            ttl: default_ttl(),
            proxied: false,
        }
    }
}

impl Default for PushPlusConfig {
    fn default() -> Self {
        Self {
            url: default_pushplus_url(),
            title: default_title(),
            template: default_template(),
            channel: default_channel(),
        }
    }
}

impl SpeedtestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Loads the file when a path is given, otherwise falls back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Secrets and the target hostname, supplied through the environment.
#[derive(Clone)]
pub struct Credentials {
    pub api_token: String,
    pub zone_id: String,
    pub dns_name: String,
    pub pushplus_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_token", &"***")
            .field("zone_id", &self.zone_id)
            .field("dns_name", &self.dns_name)
            .field("pushplus_token", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Missing required environment variable: {}", key))
        };

        Ok(Self {
            api_token: required("CF_API_TOKEN")?,
            zone_id: required("CF_ZONE_ID")?,
            dns_name: required("CF_DNS_NAME")?,
            pushplus_token: required("PUSHPLUS_TOKEN")?,
        })
    }
}
