//! Configuration module - CLI arguments and settings

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::player::{RetryPolicy, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY_MS};

/// Full device list endpoint
pub const DEFAULT_ALL_DEVICES_URL: &str = "https://www.ipeye.ru/index.php?route=proc_cam_cart";

/// Per-device info endpoint, `{devcode}` is substituted
pub const DEFAULT_DEVICE_INFO_URL: &str = "https://ipeye.ru/webs/stream_info.php?devid={devcode}";

/// HLS playlist location, `{server}` and `{devcode}` are substituted
pub const DEFAULT_STREAM_URL_TEMPLATE: &str = "http://{server}/api/v1/stream/{devcode}/hls/index.m3u8";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36";

/// Cameras per grid page
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// Optional configuration parameters for Config::new()
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub all_devices_url: Option<String>,
    pub device_info_url: Option<String>,
    pub stream_url_template: Option<String>,
    pub data_file: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub workers: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub retries: Option<u32>,
    pub port: Option<u16>,
    pub user_agent: Option<String>,
    pub page_size: Option<usize>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub debounce_ms: Option<u64>,
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    pub all_devices_url: String,
    pub device_info_url: String,
    pub stream_url_template: String,
    pub data_file: PathBuf,
    pub static_dir: PathBuf,
    pub workers: usize,
    pub request_timeout_secs: u64,
    pub retries: u32,
    pub port: u16,
    pub user_agent: String,
    pub page_size: usize,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub debounce_ms: u64,
}

impl Config {
    /// Create a new Config, filling defaults and validating the result
    pub fn new(options: ConfigOptions) -> Result<Arc<Self>> {
        let all_devices_url = normalize_url(
            options
                .all_devices_url
                .unwrap_or_else(|| DEFAULT_ALL_DEVICES_URL.to_string()),
        );
        let device_info_url = normalize_url(
            options
                .device_info_url
                .unwrap_or_else(|| DEFAULT_DEVICE_INFO_URL.to_string()),
        );
        let stream_url_template = options
            .stream_url_template
            .unwrap_or_else(|| DEFAULT_STREAM_URL_TEMPLATE.to_string())
            .trim()
            .to_string();

        if all_devices_url.is_empty() {
            return Err(anyhow!("all_devices_url cannot be empty"));
        }

        if !device_info_url.contains("{devcode}") {
            return Err(anyhow!("device_info_url must contain a {{devcode}} placeholder"));
        }

        if !stream_url_template.contains("{server}") || !stream_url_template.contains("{devcode}")
        {
            return Err(anyhow!(
                "stream_url_template must contain {{server}} and {{devcode}} placeholders"
            ));
        }

        let workers = options.workers.unwrap_or(10);
        if workers == 0 {
            return Err(anyhow!("workers must be at least 1"));
        }

        let retries = options.retries.unwrap_or(3);
        if retries == 0 {
            return Err(anyhow!("retries must be at least 1"));
        }

        let request_timeout_secs = options.request_timeout_secs.unwrap_or(10);
        if request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be at least 1"));
        }

        let retry_attempts = options.retry_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS);
        if retry_attempts == 0 {
            return Err(anyhow!("retry_attempts must be at least 1"));
        }

        let user_agent = options
            .user_agent
            .map(|ua| ua.trim().to_string())
            .filter(|ua| !ua.is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        Ok(Arc::new(Self {
            all_devices_url,
            device_info_url,
            stream_url_template,
            data_file: options
                .data_file
                .unwrap_or_else(|| PathBuf::from("./static/cameras.json")),
            static_dir: options
                .static_dir
                .unwrap_or_else(|| PathBuf::from("./static")),
            workers,
            request_timeout_secs,
            retries,
            port: options.port.unwrap_or(8080),
            user_agent,
            page_size: options.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
            retry_attempts,
            retry_delay_ms: options.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS),
            debounce_ms: options.debounce_ms.unwrap_or(100),
        }))
    }

    /// Device info URL for one device
    pub fn device_info_url_for(&self, devcode: &str) -> String {
        self.device_info_url.replace("{devcode}", devcode)
    }

    /// Stream URL for a device served by `server`
    pub fn stream_url_for(&self, server: &str, devcode: &str) -> String {
        self.stream_url_template
            .replace("{server}", server)
            .replace("{devcode}", devcode)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Retry policy handed to every camera card
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_delay_ms),
        )
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Trim whitespace and trailing slashes
fn normalize_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}
