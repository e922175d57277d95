use std::path::PathBuf;

use clap::{Args, Parser};
use serde::Serialize;

use crate::types::{BindAddress, StoreBackend, ZoneOffset};

/// CLI Arguments mirroring the structure of SinkParams.
/// All fields are optional to allow "overlay" behavior on top of the config
/// file.
#[derive(Parser, Serialize, Debug)]
#[command(author, version, about)]
#[serde(rename_all = "kebab-case")]
pub struct CliParams {
    /// Path to the TOML configuration file.
    pub config: Option<PathBuf>,

    /// Root directory for counter storage.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<PathBuf>,

    #[command(flatten)]
    pub store: CliStoreConfig,

    #[command(flatten)]
    pub ingest: CliIngestConfig,

    #[command(flatten)]
    pub metrics: CliMetricsConfig,
}

#[derive(Args, Serialize, Debug)]
#[serde(rename_all = "kebab-case")]
pub struct CliStoreConfig {
    /// Medium holding the counters.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<StoreBackend>,

    /// Offset counters are bucketed in, e.g. `UTC` or `+05:30`.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<ZoneOffset>,

    /// Reset every counter on startup.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset: Option<bool>,
}

#[derive(Args, Serialize, Debug)]
#[serde(rename_all = "kebab-case")]
pub struct CliIngestConfig {
    /// Counter name used when an event carries none.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Field holding the counter name, e.g. `payload.counterName`.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_field: Option<String>,

    /// Field holding the amount to add.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub increment_field: Option<String>,

    /// Field holding the event timestamp.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_field: Option<String>,

    /// Pattern of textual timestamps, e.g. `dd/MM/yyyy`.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
}

#[derive(Args, Serialize, Debug)]
#[serde(rename_all = "kebab-case")]
pub struct CliMetricsConfig {
    /// Listen address for the metrics endpoint.
    #[arg(long = "metrics-address")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<BindAddress>,

    /// Serve the metrics endpoint.
    #[arg(
        long = "metrics-enabled",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}
