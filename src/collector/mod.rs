//! LLDP collector. Polls every inventory device's openconfig-lldp RESTCONF
//! endpoint concurrently and records a per-device result.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::error::{FetchError, Result};
use crate::inventory::InventoryDevice;
use crate::lldp::RawSnapshot;

const LLDP_INTERFACES_PATH: &str = "restconf/data/openconfig-lldp:lldp/interfaces/interface";
const RESTCONF_ACCEPT: &str = "application/yang-data+json, application/json";

/// Collector configuration
#[derive(Clone, PartialEq)]
pub struct CollectorConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub concurrency: usize,
    pub timeout_ms: u64,
    /// Reject self-signed device certificates
    pub verify_tls: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            concurrency: 16,
            timeout_ms: 10_000,
            verify_tls: false,
        }
    }
}

impl fmt::Debug for CollectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectorConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("concurrency", &self.concurrency)
            .field("timeout_ms", &self.timeout_ms)
            .field("verify_tls", &self.verify_tls)
            .finish()
    }
}

/// Outcome of polling a single device
#[derive(Debug)]
pub struct DeviceOutcome {
    pub device: InventoryDevice,
    pub result: std::result::Result<Value, FetchError>,
}

/// Results for every polled device, in inventory order.
#[derive(Debug)]
pub struct CollectionReport {
    pub outcomes: Vec<DeviceOutcome>,
    pub collected_at: DateTime<Utc>,
}

impl CollectionReport {
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&InventoryDevice, &FetchError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.device, e)))
    }

    /// Successful payloads keyed by hostname. Failed devices are left out.
    pub fn into_snapshot(self) -> RawSnapshot {
        self.outcomes
            .into_iter()
            .filter_map(|o| o.result.ok().map(|body| (o.device.hostname, body)))
            .collect()
    }
}

pub struct LldpCollector {
    client: reqwest::Client,
    config: CollectorConfig,
}

impl LldpCollector {
    pub fn new(config: CollectorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn interfaces_url(management_address: &str) -> String {
        format!("https://{}/{}", management_address, LLDP_INTERFACES_PATH)
    }

    async fn fetch(
        client: reqwest::Client,
        config: Arc<CollectorConfig>,
        url: String,
    ) -> std::result::Result<Value, FetchError> {
        let mut request = client.get(&url).header(ACCEPT, RESTCONF_ACCEPT);
        if let Some(username) = &config.username {
            request = request.basic_auth(username, config.password.as_deref());
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Poll every device. Returns only once all devices have finished or failed.
    pub async fn collect(&self, devices: &[InventoryDevice]) -> CollectionReport {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let config = Arc::new(self.config.clone());
        let mut handles = Vec::with_capacity(devices.len());

        for device in devices {
            let sem = semaphore.clone();
            let client = self.client.clone();
            let config = config.clone();
            let url = Self::interfaces_url(&device.management_address);

            handles.push(tokio::spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                debug!(url = %url, "Fetching LLDP neighbors");
                Self::fetch(client, config, url).await
            }));
        }

        let mut outcomes = Vec::with_capacity(devices.len());
        for (device, joined) in devices.iter().zip(join_all(handles).await) {
            let result = joined.unwrap_or_else(|e| Err(FetchError::Task(e.to_string())));
            match &result {
                Ok(_) => debug!(device = %device.hostname, "Fetched LLDP data"),
                Err(e) => error!(device = %device.hostname, error = %e, "Error fetching LLDP data"),
            }
            outcomes.push(DeviceOutcome {
                device: device.clone(),
                result,
            });
        }

        let report = CollectionReport {
            outcomes,
            collected_at: Utc::now(),
        };
        info!(
            polled = devices.len(),
            succeeded = report.success_count(),
            failed = devices.len() - report.success_count(),
            "LLDP collection finished"
        );
        report
    }
}
