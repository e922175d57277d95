//! Feeds events read line by line into a [`tally_store::CounterStore`].

mod shutdown;
mod sink;

pub use shutdown::{cancel_on_stop_signal, stop_signal, StopSignal};
pub use sink::{open_store, Sink, SinkStats};
