//! Catalogue manager - download the device list and resolve stream URLs

use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{error, info, warn};

use super::camera::CameraRecord;
use super::storage::FileStorage;
use crate::config::Config;
use crate::http_logger::{self, HttpResponseLog};

/// Device info response
#[derive(Debug, Deserialize)]
struct DeviceInfo {
    #[serde(default)]
    server: String,
}

/// Outcome of a catalogue refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub total: usize,
    pub resolved: usize,
    pub failed: usize,
    /// Records without a devcode, left untouched
    pub skipped: usize,
}

/// Camera catalogue manager
pub struct CatalogManager {
    config: Arc<Config>,
    storage: FileStorage,
    client: Client,
}

impl CatalogManager {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        let storage = FileStorage::new(config.data_file.clone());

        Ok(Self {
            config,
            storage,
            client,
        })
    }

    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    /// Stored camera records
    pub fn devices(&self) -> Result<Vec<CameraRecord>> {
        self.storage.load()
    }

    /// Refresh the catalogue: download when missing, resolve every stream URL, save
    pub async fn update(&self) -> Result<UpdateStats> {
        if !self.storage.exists() {
            info!(
                "No catalogue at {}, downloading device list...",
                self.storage.path().display()
            );
            let count = self
                .download_all_devices()
                .await
                .context("Failed to download devices")?;
            info!("Downloaded {} devices", count);
        }

        let mut records = self.storage.load().context("Failed to load cameras")?;
        let stats = self.resolve_devices(&mut records).await;

        self.storage
            .save(&records)
            .context("Failed to save cameras")?;

        info!(
            "Catalogue updated: {} total, {} resolved, {} failed, {} skipped",
            stats.total, stats.resolved, stats.failed, stats.skipped
        );
        Ok(stats)
    }

    /// Fetch the full device list and save it as-is
    pub async fn download_all_devices(&self) -> Result<usize> {
        let url = self.config.all_devices_url.clone();
        let records: Vec<CameraRecord> = self.get_json(&url).await?;
        self.storage.save(&records)?;
        Ok(records.len())
    }

    /// Resolve stream URLs with `workers` requests in flight
    pub async fn resolve_devices(&self, records: &mut [CameraRecord]) -> UpdateStats {
        let mut stats = UpdateStats {
            total: records.len(),
            ..UpdateStats::default()
        };

        let pending: Vec<(usize, String)> = records
            .iter()
            .enumerate()
            .filter_map(|(i, record)| match record.devcode.as_deref() {
                Some(devcode) if !devcode.trim().is_empty() => Some((i, devcode.to_string())),
                _ => None,
            })
            .collect();
        stats.skipped = stats.total - pending.len();
        if stats.skipped > 0 {
            warn!("Skipping {} records without devcode", stats.skipped);
        }

        let results: Vec<(usize, String, Result<String>)> = stream::iter(pending)
            .map(|(i, devcode)| async move {
                let result = self.resolve_device(&devcode).await;
                (i, devcode, result)
            })
            .buffer_unordered(self.config.workers)
            .collect()
            .await;

        for (i, devcode, result) in results {
            match result {
                Ok(stream_url) => {
                    records[i].stream_url = Some(stream_url);
                    stats.resolved += 1;
                }
                Err(e) => {
                    error!("Could not resolve stream for {}: {}", devcode, e);
                    stats.failed += 1;
                }
            }
        }

        stats
    }

    /// Resolve one device's stream URL with up to `retries` attempts
    async fn resolve_device(&self, devcode: &str) -> Result<String> {
        let max_retries = self.config.retries;
        let mut last_error = None;

        for attempt in 0..max_retries {
            match self.fetch_device_server(devcode).await {
                Ok(server) => return Ok(self.config.stream_url_for(&server, devcode)),
                Err(e) => {
                    warn!(
                        "Attempt {}/{} failed for {}: {}",
                        attempt + 1,
                        max_retries,
                        devcode,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("no attempts made")))
    }

    /// Ask the info endpoint which server hosts `devcode`
    pub async fn fetch_device_server(&self, devcode: &str) -> Result<String> {
        let url = self.config.device_info_url_for(devcode);
        let info: DeviceInfo = self.get_json(&url).await?;

        let server = info.server.trim();
        if server.is_empty() {
            return Err(anyhow!("empty server in response"));
        }
        Ok(server.to_string())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let log_dir = self.storage.path().parent();
        let request_log = http_logger::request_log_if_enabled(
            "GET",
            url,
            &[
                ("User-Agent", self.config.user_agent.as_str()),
                ("Accept", "application/json"),
            ],
        );
        let start = Instant::now();

        let result = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await;

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                if let Some(req) = &request_log {
                    let elapsed = start.elapsed().as_millis() as u64;
                    http_logger::log_exchange(log_dir, req, None, elapsed, Some(&e.to_string()));
                }
                return Err(anyhow!("Request error: {}", e));
            }
        };

        let status = response.status();
        let headers = request_log
            .as_ref()
            .map(|_| http_logger::extract_response_headers(&response));
        let body = response.text().await?;

        if let (Some(req), Some(headers)) = (&request_log, headers) {
            let resp_log = HttpResponseLog {
                status: status.as_u16(),
                headers,
                body: Some(body.clone()),
            };
            let elapsed = start.elapsed().as_millis() as u64;
            http_logger::log_exchange(log_dir, req, Some(&resp_log), elapsed, None);
        }

        if !status.is_success() {
            return Err(anyhow!("HTTP error: {}", status));
        }

        serde_json::from_str(&body).map_err(|e| anyhow!("Decode error: {}", e))
    }
}
