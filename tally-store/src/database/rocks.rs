use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use log::*;
use rocksdb::{ColumnFamily, Direction, IteratorMode, WriteBatch, DB};

use super::{
    columns::{columns, BucketIndex, Buckets, Catalog, Column, ColumnName},
    options::{AccessType, StoreOptions},
    rocksdb_options::{cf_descriptors, get_rocksdb_options},
    CounterDatabase,
};
use crate::errors::{StorageError, StorageResult};

// -----------------
// RocksDatabase
// -----------------
pub struct RocksDatabase {
    db: DB,
    access_type: AccessType,
    path: PathBuf,
}

impl RocksDatabase {
    pub fn open(path: &Path, options: &StoreOptions) -> StorageResult<Self> {
        let access_type = options.access_type.clone();
        if access_type == AccessType::Primary {
            fs::create_dir_all(path)?;
        }

        let db_options = get_rocksdb_options(&access_type)?;
        let descriptors = cf_descriptors(path);

        let db = match access_type {
            AccessType::Primary => {
                DB::open_cf_descriptors(&db_options, path, descriptors)?
            }
            AccessType::ReadOnly => DB::open_cf_descriptors_read_only(
                &db_options,
                path,
                descriptors,
                false,
            )?,
        };
        info!(
            "Opened counter database at {} ({:?}) with columns {:?}",
            path.display(),
            access_type,
            columns()
        );

        Ok(Self {
            db,
            access_type,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn access_type(&self) -> &AccessType {
        &self.access_type
    }

    fn cf<C: ColumnName>(&self) -> StorageResult<&ColumnFamily> {
        self.db
            .cf_handle(C::NAME)
            .ok_or(StorageError::MissingColumn(C::NAME))
    }
}

impl fmt::Debug for RocksDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RocksDatabase")
            .field("path", &self.path)
            .field("access_type", &self.access_type)
            .finish()
    }
}

impl CounterDatabase for RocksDatabase {
    fn add(
        &self,
        name: &str,
        buckets: &[BucketIndex],
        amount: u64,
    ) -> StorageResult<()> {
        let buckets_cf = self.cf::<Buckets>()?;
        let catalog_cf = self.cf::<Catalog>()?;

        // catalog entry and all resolutions land in a single atomic write
        let mut batch = WriteBatch::default();
        batch.put_cf(catalog_cf, Catalog::key_for(name), b"");
        let operand = Buckets::encode_value(amount);
        for bucket in buckets {
            batch.merge_cf(buckets_cf, Buckets::key_for(name, bucket), operand);
        }
        self.db.write(batch)?;
        Ok(())
    }

    fn get(&self, name: &str, bucket: &BucketIndex) -> StorageResult<u64> {
        let cf = self.cf::<Buckets>()?;
        match self.db.get_pinned_cf(cf, Buckets::key_for(name, bucket))? {
            Some(value) => Buckets::decode_value(&value),
            None => Ok(0),
        }
    }

    fn multi_get(
        &self,
        name: &str,
        buckets: &[BucketIndex],
    ) -> StorageResult<Vec<u64>> {
        let cf = self.cf::<Buckets>()?;
        let keys = buckets
            .iter()
            .map(|bucket| (cf, Buckets::key_for(name, bucket)));
        self.db
            .multi_get_cf(keys)
            .into_iter()
            .map(|value| match value? {
                Some(value) => Buckets::decode_value(&value),
                None => Ok(0),
            })
            .collect()
    }

    fn names(&self) -> StorageResult<Vec<String>> {
        let cf = self.cf::<Catalog>()?;
        let mut names = Vec::new();
        for entry in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, _) = entry?;
            match Catalog::index(&key) {
                Some(name) => names.push(name),
                None => warn!("Skipping non utf-8 catalog key {key:?}"),
            }
        }
        Ok(names)
    }

    fn scan(&self, name: &str) -> StorageResult<Vec<(BucketIndex, u64)>> {
        let cf = self.cf::<Buckets>()?;
        let prefix = Buckets::prefix(name);
        let mode = IteratorMode::From(&prefix, Direction::Forward);
        let mut buckets = Vec::new();
        for entry in self.db.iterator_cf(cf, mode) {
            let (key, value) = entry?;
            if !key.starts_with(&prefix) {
                break;
            }
            let Some((_, bucket)) = Buckets::index(&key) else {
                warn!("Skipping malformed bucket key {key:?}");
                continue;
            };
            buckets.push((bucket, Buckets::decode_value(&value)?));
        }
        Ok(buckets)
    }

    fn remove(&self, name: &str) -> StorageResult<()> {
        let buckets_cf = self.cf::<Buckets>()?;
        let catalog_cf = self.cf::<Catalog>()?;

        let mut batch = WriteBatch::default();
        batch.delete_range_cf(
            buckets_cf,
            Buckets::prefix(name),
            Buckets::prefix_end(name),
        );
        batch.delete_cf(catalog_cf, Catalog::key_for(name));
        self.db.write(batch)?;
        Ok(())
    }

    fn flush(&self) -> StorageResult<()> {
        self.db.flush_cf(self.cf::<Buckets>()?)?;
        self.db.flush_cf(self.cf::<Catalog>()?)?;
        Ok(())
    }
}
