use std::{fmt, io};

use log::*;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Process signals after which the sink stops reading events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopSignal::Interrupt => f.write_str("SIGINT"),
            StopSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

#[cfg(unix)]
pub async fn stop_signal() -> io::Result<StopSignal> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = terminate.recv() => Ok(StopSignal::Terminate),
        result = tokio::signal::ctrl_c() => {
            result.map(|_| StopSignal::Interrupt)
        }
    }
}

#[cfg(not(unix))]
pub async fn stop_signal() -> io::Result<StopSignal> {
    tokio::signal::ctrl_c().await?;
    Ok(StopSignal::Interrupt)
}

/// Cancels `token` on the first stop signal. If signals can't be listened
/// for, the sink runs until its input ends.
pub fn cancel_on_stop_signal(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        match stop_signal().await {
            Ok(signal) => {
                info!("{signal} received, finishing up");
                token.cancel();
            }
            Err(err) => error!("Failed to listen for stop signals: {err}"),
        }
    })
}
