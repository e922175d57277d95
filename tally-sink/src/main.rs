use std::{process, sync::Arc};

use log::*;
use tally_config::SinkParams;
use tally_ingest::IngestAdapter;
use tally_metrics::try_start_metrics_service;
use tally_sink::{cancel_on_stop_signal, open_store, Sink};
use tokio::{io::BufReader, runtime::Builder};
use tokio_util::sync::CancellationToken;

fn init_logger() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_micros()
    .init();
}

fn main() {
    init_logger();
    let workers = (num_cpus::get() / 2).max(1);
    let runtime = match Builder::new_multi_thread()
        .worker_threads(workers)
        .thread_name("tally-sink")
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to build runtime: {err}");
            process::exit(1);
        }
    };
    runtime.block_on(run());
}

async fn run() {
    let params = match SinkParams::try_new(std::env::args_os()) {
        Ok(params) => params,
        Err(err) => {
            eprintln!("Failed to load configuration: {err}");
            process::exit(1);
        }
    };
    info!("Starting tally sink with config:\n{params}");

    let store = match open_store(&params) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            error!("Failed to open counter store: {err}");
            process::exit(1);
        }
    };
    let adapter =
        match IngestAdapter::try_new(&params.ingest, *params.store.time_zone) {
            Ok(adapter) => adapter,
            Err(err) => {
                error!("Invalid ingest configuration: {err}");
                process::exit(1);
            }
        };

    let cancellation_token = CancellationToken::new();
    let metrics_service = match params.metrics.endpoint() {
        Some(addr) => {
            match try_start_metrics_service(addr, cancellation_token.clone())
                .await
            {
                Ok(service) => Some(service),
                Err(err) => {
                    error!("Failed to start metrics service: {err}");
                    process::exit(1);
                }
            }
        }
        None => None,
    };

    let signals = cancel_on_stop_signal(cancellation_token.clone());

    let mut sink = Sink::new(adapter, store.clone());
    let input = BufReader::new(tokio::io::stdin());
    match sink
        .run(
            input,
            params.metrics.refresh_interval,
            cancellation_token.clone(),
        )
        .await
    {
        Ok(stats) => info!("Sink finished, {stats}"),
        Err(err) => {
            error!("Reading events failed after {}: {err}", sink.stats())
        }
    }

    cancellation_token.cancel();
    signals.abort();
    if let Some(service) = metrics_service {
        service.shutdown().await;
    }
    if let Err(err) = store.flush() {
        error!("Failed to flush counters: {err}");
        process::exit(1);
    }
}
