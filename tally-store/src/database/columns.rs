use byteorder::{BigEndian, ByteOrder};
use chrono::{DateTime, Utc};

use crate::{
    errors::{StorageError, StorageResult},
    Resolution,
};

/// Column family holding one total per (counter, resolution, bucket-start)
const BUCKETS_CF: &str = "buckets";
/// Column family holding the names of all counters with live buckets
const CATALOG_CF: &str = "catalog";

/// Longest counter name the key layout can carry
pub const MAX_NAME_LEN: usize = u16::MAX as usize;

const SIGN_FLIP: u64 = 1 << 63;

// When adding a new column ...
// - Add struct below and implement `Column` and `ColumnName` traits
// - Add its name to `columns()` and its descriptor to `cf_descriptors()`
// - Account for the column in `RocksDatabase::remove()`

pub fn columns() -> Vec<&'static str> {
    vec![Buckets::NAME, Catalog::NAME]
}

// -----------------
// Traits
// -----------------
/// Keys of a column are built by each column's `key_for`, this decodes them
pub trait Column {
    type Index;

    fn index(key: &[u8]) -> Option<Self::Index>;
}

pub trait ColumnName {
    const NAME: &'static str;
}

/// Address of a single bucket of some counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketIndex {
    pub resolution: Resolution,
    pub start: DateTime<Utc>,
}

impl BucketIndex {
    pub fn new(resolution: Resolution, start: DateTime<Utc>) -> Self {
        Self { resolution, start }
    }
}

// -----------------
// Buckets
// -----------------
/// The bucket totals column.
///
/// * index type: `(String, BucketIndex)`
/// * key layout: `u16 name len | name | u8 resolution | u64 start secs`, all
///   big endian, the seconds with their sign bit flipped so that keys of one
///   counter sort chronologically within each resolution
/// * value type: big endian `u64` total
#[derive(Debug)]
pub struct Buckets;

impl Buckets {
    pub fn key_for(name: &str, bucket: &BucketIndex) -> Vec<u8> {
        let mut key = Self::prefix(name);
        key.push(bucket.resolution.id());
        let mut secs = [0; 8];
        BigEndian::write_u64(
            &mut secs,
            (bucket.start.timestamp() as u64) ^ SIGN_FLIP,
        );
        key.extend_from_slice(&secs);
        key
    }

    /// Every key of `name` starts with this prefix and no key of another
    /// counter does
    pub fn prefix(name: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(2 + name.len() + 9);
        let mut len = [0; 2];
        BigEndian::write_u16(&mut len, name.len() as u16);
        key.extend_from_slice(&len);
        key.extend_from_slice(name.as_bytes());
        key
    }

    /// Exclusive upper bound for the keys of `name`
    pub fn prefix_end(name: &str) -> Vec<u8> {
        let mut key = Self::prefix(name);
        key.push(u8::MAX);
        key
    }

    pub fn encode_value(total: u64) -> [u8; 8] {
        let mut value = [0; 8];
        BigEndian::write_u64(&mut value, total);
        value
    }

    pub fn decode_value(value: &[u8]) -> StorageResult<u64> {
        if value.len() != 8 {
            return Err(StorageError::CorruptValue {
                column: Self::NAME,
                len: value.len(),
            });
        }
        Ok(BigEndian::read_u64(value))
    }
}

impl Column for Buckets {
    type Index = (String, BucketIndex);

    fn index(key: &[u8]) -> Option<Self::Index> {
        let name_len = BigEndian::read_u16(key.get(..2)?) as usize;
        let name = std::str::from_utf8(key.get(2..2 + name_len)?).ok()?;
        let rest = key.get(2 + name_len..)?;
        if rest.len() != 9 {
            return None;
        }
        let resolution = Resolution::from_id(rest[0])?;
        let secs = (BigEndian::read_u64(&rest[1..]) ^ SIGN_FLIP) as i64;
        let start = DateTime::from_timestamp(secs, 0)?;
        Some((name.to_string(), BucketIndex::new(resolution, start)))
    }
}

impl ColumnName for Buckets {
    const NAME: &'static str = BUCKETS_CF;
}

// -----------------
// Catalog
// -----------------
/// The counter catalog column.
///
/// * index type: `String` (the counter name, stored as raw utf-8)
/// * value type: empty
#[derive(Debug)]
pub struct Catalog;

impl Catalog {
    pub fn key_for(name: &str) -> &[u8] {
        name.as_bytes()
    }
}

impl Column for Catalog {
    type Index = String;

    fn index(key: &[u8]) -> Option<String> {
        String::from_utf8(key.to_vec()).ok()
    }
}

impl ColumnName for Catalog {
    const NAME: &'static str = CATALOG_CF;
}
