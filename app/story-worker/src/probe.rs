//! Periodic reachability check feeding the connectivity signal.

use offline_sync::ConnectivityMonitor;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Any HTTP response from `target` means online; no response means offline.
pub struct ConnectivityProber {
    client: Client,
    target: String,
    interval: Duration,
    monitors: Vec<ConnectivityMonitor>,
}

impl ConnectivityProber {
    pub fn new(
        target: impl Into<String>,
        interval: Duration,
        monitors: Vec<ConnectivityMonitor>,
    ) -> reqwest::Result<Self> {
        // A probe must finish well before the next one starts.
        let timeout = interval.min(Duration::from_secs(5));
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            target: target.into(),
            interval,
            monitors,
        })
    }

    pub async fn probe_once(&self) -> bool {
        let online = match self.client.head(&self.target).send().await {
            Ok(response) => {
                debug!(status = response.status().as_u16(), "Connectivity probe answered");
                true
            }
            Err(e) => {
                debug!(error = %e, "Connectivity probe failed");
                false
            }
        };
        for monitor in &self.monitors {
            monitor.set_online(online);
        }
        online
    }

    /// Probe forever. Spawn it and abort the task to stop.
    pub async fn run(self) {
        info!(
            probe_url = %self.target,
            interval_secs = self.interval.as_secs(),
            "Connectivity prober starting"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.probe_once().await;
        }
    }
}
