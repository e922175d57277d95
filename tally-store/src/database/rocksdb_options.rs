use std::{collections::HashSet, path::Path};

use log::*;
use rocksdb::{ColumnFamilyDescriptor, Options, DB};

use super::{
    columns::{columns, Buckets, Catalog, ColumnName},
    merge::{saturating_add, MERGE_OPERATOR_NAME},
    options::AccessType,
};
use crate::errors::StorageResult;

pub fn get_rocksdb_options(access_type: &AccessType) -> StorageResult<Options> {
    let mut options = Options::default();

    // Create missing items to support a clean start
    options.create_if_missing(true);
    options.create_missing_column_families(true);

    // Per the docs, a good value for this is the number of cores on the machine
    let cpus = num_cpus::get() as i32;
    options.increase_parallelism(cpus);

    // Low-priority threads are used for compaction, high-priority ones for
    // flushes. Every event fans out into five merges so flushes come first.
    let mut env = rocksdb::Env::new()?;
    env.set_background_threads(std::cmp::max(1, std::cmp::min(2, cpus / 4)));
    env.set_high_priority_background_threads(std::cmp::max(
        2,
        std::cmp::min(4, cpus),
    ));
    options.set_env(&env);

    // Bound WAL size
    options.set_max_total_wal_size(512 * 1024 * 1024);

    if should_disable_auto_compactions(access_type) {
        options.set_disable_auto_compactions(true);
    }

    options.set_max_open_files(-1);

    // Smooth IO
    options.set_bytes_per_sync(1024 * 1024);
    options.set_wal_bytes_per_sync(1024 * 1024);

    // Favor concurrency on the write path
    options.set_allow_concurrent_memtable_write(true);
    options.set_enable_write_thread_adaptive_yield(true);

    options.set_max_background_jobs(std::cmp::max(4, std::cmp::min(8, cpus)));
    options.set_level_compaction_dynamic_level_bytes(true);

    Ok(options)
}

/// Descriptors of all known columns, plus default ones for any column
/// found in an existing database at `path` which rocksdb insists on opening
pub fn cf_descriptors(path: &Path) -> Vec<ColumnFamilyDescriptor> {
    let mut descriptors = vec![
        ColumnFamilyDescriptor::new(Buckets::NAME, buckets_cf_options()),
        ColumnFamilyDescriptor::new(Catalog::NAME, Options::default()),
    ];

    // A fresh directory has no columns to list yet
    let Ok(existing) = DB::list_cf(&Options::default(), path) else {
        return descriptors;
    };
    let known = columns().into_iter().collect::<HashSet<_>>();
    for name in existing {
        // the default column always exists and needs no descriptor
        if name == rocksdb::DEFAULT_COLUMN_FAMILY_NAME
            || known.contains(name.as_str())
        {
            continue;
        }
        warn!("Opening unknown column {name} with default options");
        descriptors.push(ColumnFamilyDescriptor::new(name, Options::default()));
    }
    descriptors
}

fn buckets_cf_options() -> Options {
    let mut options = Options::default();
    // Totals are only ever added to, the merge operator folds the operands
    // during reads and compactions
    options.set_merge_operator_associative(
        MERGE_OPERATOR_NAME,
        saturating_add,
    );
    options
}

// Returns whether automatic compactions should be disabled for the entire
// database based upon the given access type.
pub fn should_disable_auto_compactions(access_type: &AccessType) -> bool {
    !matches!(access_type, AccessType::Primary)
}
