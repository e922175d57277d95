use std::net::SocketAddr;

use derive_more::{Deref, Display, FromStr};
use serde::{Deserialize, Serialize};

use crate::consts;

/// A network bind address that can be parsed from a string like "0.0.0.0:8080".
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    FromStr,
    Display,
    Deref,
)]
#[serde(transparent)]
pub struct BindAddress(pub SocketAddr);

impl Default for BindAddress {
    fn default() -> Self {
        Self(
            consts::DEFAULT_METRICS_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 9000))),
        )
    }
}
