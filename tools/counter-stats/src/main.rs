use std::{
    path::{Path, PathBuf},
    process,
};

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tally_config::{consts::DATABASE_DIRECTORY, types::ZoneOffset};
use tally_store::{CounterStore, Resolution, StoreOptions};

mod counts;

#[derive(Debug, Subcommand)]
enum Command {
    /// Names of all catalogued counters
    List {
        storage: PathBuf,
    },
    /// Totals of the last buckets of one counter
    Counts {
        storage: PathBuf,
        name: String,
        #[arg(long, short, default_value = "hour")]
        resolution: Resolution,
        #[arg(long, short, default_value_t = 24)]
        count: usize,
        /// Instant inside the last bucket, defaults to now
        #[arg(long)]
        end: Option<DateTime<Utc>>,
        #[arg(long, default_value = "UTC")]
        time_zone: ZoneOffset,
    },
    /// Every written bucket of one counter
    Dump {
        storage: PathBuf,
        name: String,
        #[arg(long, default_value = "UTC")]
        time_zone: ZoneOffset,
    },
    /// Drops a counter with all its buckets
    Reset {
        storage: PathBuf,
        name: String,
    },
}

#[derive(Debug, Parser)]
#[command(about = "Inspects the counters in a tally storage directory")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn"),
    )
    .init();
    let args = Cli::parse();

    use Command::*;
    let result = match args.command {
        List { storage } => {
            let store = open_store(&storage, read_only(ZoneOffset::default()));
            counts::render_names(&store)
        }
        Counts {
            storage,
            name,
            resolution,
            count,
            end,
            time_zone,
        } => {
            let store = open_store(&storage, read_only(time_zone));
            counts::render_window(
                store,
                &name,
                resolution,
                count,
                end.unwrap_or_else(Utc::now),
            )
        }
        Dump {
            storage,
            name,
            time_zone,
        } => {
            let store = open_store(&storage, read_only(time_zone));
            counts::render_buckets(&store, &name)
        }
        Reset { storage, name } => {
            let store = open_store(&storage, StoreOptions::default());
            store.reset(&name).map(|_| format!("Reset {name}"))
        }
    };
    match result {
        Ok(output) => println!("{output}"),
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    }
}

fn read_only(time_zone: ZoneOffset) -> StoreOptions {
    StoreOptions::with_time_zone(*time_zone).read_only()
}

fn open_store(storage: &Path, options: StoreOptions) -> CounterStore {
    let path = storage.join(DATABASE_DIRECTORY);
    match CounterStore::open(&path, options) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("Failed to open counters at {}: {err}", path.display());
            process::exit(1);
        }
    }
}
