use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use num_format::{Locale, ToFormattedString};
use tabular::{Row, Table};
use tally_store::{CounterResult, CounterStore, QueryAssembler, Resolution};

fn format_start(start: DateTime<Utc>, store: &CounterStore) -> String {
    start
        .with_timezone(&store.time_zone())
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn render_names(store: &CounterStore) -> CounterResult<String> {
    let names = store.list()?;
    if names.is_empty() {
        return Ok("No counters".to_string());
    }
    Ok(names.join("\n"))
}

pub fn render_window(
    store: CounterStore,
    name: &str,
    resolution: Resolution,
    count: usize,
    end: DateTime<Utc>,
) -> CounterResult<String> {
    let assembler = QueryAssembler::new(Arc::new(store));
    let window = assembler.window(name, resolution, count, end)?;

    let mut table = Table::new("{:<}  {:>}");
    table.add_row(
        Row::new()
            .with_cell(format!("{} ({resolution})", window.name))
            .with_cell("Count"),
    );
    for (start, total) in window.iter() {
        table.add_row(
            Row::new()
                .with_cell(format_start(start, assembler.store()))
                .with_cell(total.to_formatted_string(&Locale::en)),
        );
    }
    table.add_row(
        Row::new()
            .with_cell("Total")
            .with_cell(window.total().to_formatted_string(&Locale::en)),
    );
    Ok(table.to_string())
}

pub fn render_buckets(
    store: &CounterStore,
    name: &str,
) -> CounterResult<String> {
    let buckets = store.buckets(name)?;
    if buckets.is_empty() {
        return Ok(format!("No buckets for {name}"));
    }
    let mut table = Table::new("{:<}  {:<}  {:>}");
    table.add_row(
        Row::new()
            .with_cell("Resolution")
            .with_cell("Start")
            .with_cell("Count"),
    );
    for (bucket, total) in buckets {
        table.add_row(
            Row::new()
                .with_cell(bucket.resolution)
                .with_cell(format_start(bucket.start, store))
                .with_cell(total.to_formatted_string(&Locale::en)),
        );
    }
    Ok(table.to_string())
}
