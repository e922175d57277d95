use std::net::SocketAddr;

use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full};
use hyper::{
    body::Bytes, server::conn::http1, service::service_fn, Method, Request,
    Response, StatusCode,
};
use hyper_util::rt::TokioIo;
use log::*;
use tokio::{net::TcpListener, select, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::metrics;

/// Binds `addr` and serves `GET /metrics` until the token is cancelled
pub async fn try_start_metrics_service(
    addr: SocketAddr,
    cancellation_token: CancellationToken,
) -> std::io::Result<MetricsService> {
    metrics::register();
    let listener = TcpListener::bind(&addr).await?;
    let addr = listener.local_addr()?;
    info!("Metrics server listening on {addr}");
    let handle = tokio::spawn(run(listener, cancellation_token.clone()));
    Ok(MetricsService {
        addr,
        cancellation_token,
        handle,
    })
}

pub struct MetricsService {
    addr: SocketAddr,
    cancellation_token: CancellationToken,
    handle: JoinHandle<()>,
}

impl MetricsService {
    /// Address actually bound, differs from the requested one for port 0
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn shutdown(self) {
        self.cancellation_token.cancel();
        if let Err(err) = self.handle.await {
            warn!("Metrics server task ended abnormally: {err}");
        }
    }
}

async fn run(listener: TcpListener, cancellation_token: CancellationToken) {
    loop {
        select!(
            _ = cancellation_token.cancelled() => {
                break;
            }
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        let io = TokioIo::new(stream);
                        let service = service_fn(metrics_service_router);
                        tokio::task::spawn(async move {
                            if let Err(err) = http1::Builder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                debug!(
                                    "Metrics connection from {peer} closed: \
                                     {err:?}"
                                );
                            }
                        });
                    }
                    Err(err) => error!("Failed to accept connection: {err:?}"),
                };
            }
        );
    }

    info!("Metrics server shutdown");
}

async fn metrics_service_router(
    req: Request<hyper::body::Incoming>,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, hyper::Error> {
    trace!("{} {}", req.method(), req.uri().path());

    let result = match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let metrics = metrics::encode().unwrap_or_else(|err| {
                warn!("Failed to encode metrics: {err}");
                String::new()
            });
            Ok(Response::new(full(metrics)))
        }
        _ => {
            let mut not_found = Response::new(empty());
            *not_found.status_mut() = StatusCode::NOT_FOUND;
            Ok(not_found)
        }
    };
    // We must consume the body fully to keep the connection alive. We
    // iterate over all chunks and simply drop them. This prevents garbage
    // data of previous requests from being stuck in connection buffer.
    let mut body = req.into_body();
    while (body.frame().await).is_some() {}

    result
}

fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, hyper::Error> {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

fn empty() -> BoxBody<Bytes, hyper::Error> {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}
