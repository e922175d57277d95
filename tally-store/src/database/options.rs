use chrono::{FixedOffset, Offset, Utc};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessType {
    /// Primary (read/write) access; only one process can have Primary access.
    Primary,
    /// Read-only access with automatic compactions disabled, used by tools
    /// inspecting a directory without a running sink.
    ReadOnly,
}

#[derive(Clone, Debug)]
pub struct StoreOptions {
    // The access type of the medium. Default: Primary
    pub access_type: AccessType,
    // Zone whose local calendar bucket boundaries follow. Default: UTC
    pub time_zone: FixedOffset,
}

impl StoreOptions {
    pub fn with_time_zone(time_zone: FixedOffset) -> Self {
        Self {
            time_zone,
            ..Self::default()
        }
    }

    pub fn read_only(mut self) -> Self {
        self.access_type = AccessType::ReadOnly;
        self
    }
}

impl Default for StoreOptions {
    /// The default options are the values used by [`CounterStore::open`].
    ///
    /// [`CounterStore::open`]: crate::CounterStore::open
    fn default() -> Self {
        Self {
            access_type: AccessType::Primary,
            time_zone: Utc.fix(),
        }
    }
}
