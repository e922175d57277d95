use std::{ffi::OsString, fmt::Display, path::PathBuf};

use clap::Parser;
use config::{cli::CliParams, IngestConfig, MetricsConfig, StoreConfig};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    value::Uncased,
    Figment, Profile,
};
use serde::{Deserialize, Serialize};
use types::StorageDirectory;

pub mod config;
pub mod consts;
pub mod types;

/// Top-level configuration of the sink, assembled from multiple sources.
#[derive(Clone, Deserialize, Serialize, Debug, Default)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SinkParams {
    /// Path to the TOML configuration file (overrides CLI args).
    pub config: Option<PathBuf>,

    /// Root directory for counter storage.
    pub storage: StorageDirectory,

    /// Counter store settings.
    pub store: StoreConfig,

    /// Event field extraction.
    pub ingest: IngestConfig,

    /// Metrics endpoint and the catalog gauge refresh interval.
    pub metrics: MetricsConfig,
}

impl SinkParams {
    /// Assembles the final configuration.
    /// Precedence: CLI (if set) > Environment > TOML File > Defaults
    pub fn try_new(
        args: impl Iterator<Item = OsString>,
    ) -> figment::Result<Self> {
        // 1. Parse CLI arguments into the "Overlay" struct
        let cli = CliParams::parse_from(args);

        // 2. Start with system defaults
        let mut figment =
            Figment::new().merge(Serialized::defaults(SinkParams::default()));

        // 3. Merge TOML File
        if let Some(path) = &cli.config {
            figment = figment.merge(Toml::file(path).profile(Profile::Default));
        }

        // 4. Merge Environment Variables
        figment = figment.merge(
            Env::prefixed(consts::ENV_VAR_PREFIX)
                .split("__")
                .map(|k| Uncased::new(k.as_str().replace('_', "-")))
                .profile(Profile::Default),
        );

        // 5. Merge CLI "Overlay" (Highest Priority)
        figment = figment.merge(Serialized::from(&cli, Profile::Default));
        figment.extract()
    }

    /// Directory of the RocksDB counter database below the storage root
    pub fn database_path(&self) -> PathBuf {
        self.storage.join(consts::DATABASE_DIRECTORY)
    }
}

impl Display for SinkParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match toml::to_string_pretty(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}
