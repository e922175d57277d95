use std::{net::SocketAddr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{consts, types::BindAddress};

/// The prometheus endpoint and the gauges refreshed in the background.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct MetricsConfig {
    /// If false no endpoint is bound.
    /// Default: true
    pub enabled: bool,

    /// Address `GET /metrics` is served at.
    /// Default: 0.0.0.0:9000
    pub address: BindAddress,

    /// How often the catalog is listed to refresh the catalog size gauge.
    /// Default: 30s
    #[serde(with = "humantime")]
    pub refresh_interval: Duration,
}

impl MetricsConfig {
    /// The address to serve metrics at, `None` when disabled
    pub fn endpoint(&self) -> Option<SocketAddr> {
        self.enabled.then_some(*self.address)
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: BindAddress::default(),
            refresh_interval: Duration::from_secs(
                consts::DEFAULT_CATALOG_REFRESH_SECS,
            ),
        }
    }
}
