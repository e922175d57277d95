use std::{fmt::Display, path::PathBuf};

pub mod network;
pub mod zone;

use derive_more::{Deref, FromStr};
pub use network::BindAddress;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
pub use zone::ZoneOffset;

use crate::consts;

#[derive(
    Clone, Debug, DeserializeFromStr, SerializeDisplay, FromStr, Deref,
)]
pub struct StorageDirectory(pub PathBuf);

impl Display for StorageDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl Default for StorageDirectory {
    fn default() -> Self {
        Self(PathBuf::from(consts::DEFAULT_STORAGE_DIRECTORY))
    }
}

/// Medium the counters are kept in
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    clap::ValueEnum,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    /// RocksDB database inside the storage directory
    #[default]
    Rocksdb,
    /// Process memory, counters are lost on exit
    Memory,
}
