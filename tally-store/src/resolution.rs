use chrono::TimeDelta;
use strum::{Display, EnumIter, EnumString};
use tally_metrics::metrics::LabelValue;

/// Granularity at which every counter is pre-aggregated.
///
/// The declaration order is the storage id of each resolution, so new
/// variants may only ever be appended.
#[derive(
    Debug,
    Display,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Resolution {
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

impl Resolution {
    pub const ALL: [Resolution; 5] = [
        Resolution::Minute,
        Resolution::Hour,
        Resolution::Day,
        Resolution::Month,
        Resolution::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        use Resolution::*;
        match self {
            Minute => "minute",
            Hour => "hour",
            Day => "day",
            Month => "month",
            Year => "year",
        }
    }

    /// Width of a bucket for resolutions that don't depend on the calendar
    pub fn fixed_width(&self) -> Option<TimeDelta> {
        use Resolution::*;
        match self {
            Minute => Some(TimeDelta::minutes(1)),
            Hour => Some(TimeDelta::hours(1)),
            Day => Some(TimeDelta::days(1)),
            Month | Year => None,
        }
    }

    pub(crate) fn id(&self) -> u8 {
        *self as u8
    }

    pub(crate) fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }
}

impl LabelValue for Resolution {
    fn value(&self) -> &str {
        self.as_str()
    }
}
