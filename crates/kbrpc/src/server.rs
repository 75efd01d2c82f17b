//! Accept loop and per-connection serving.
//!
//! Each connection is read sequentially; every `Call` dispatches on its own
//! task so a slow handler does not head-of-line block the stream. `Cancel`
//! aborts the in-flight task and answers with a canceled error; `Notify`
//! dispatches with the result discarded.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::RpcError;
use crate::packet::{read_packet, write_packet, Packet, WireError};
use crate::protocol::ProtocolRegistry;

/// Runs the accept loop until the listener fails.
///
/// # Errors
///
/// Returns an error if the accept loop encounters an I/O failure.
pub async fn serve(listener: TcpListener, registry: Arc<ProtocolRegistry>) -> Result<(), RpcError> {
    let (shutdown_tx, _) = watch::channel(());
    serve_with_shutdown(listener, registry, shutdown_tx).await
}

/// Runs the accept loop with an externally-controlled shutdown signal.
///
/// When `shutdown_tx` is dropped or signalled, the loop stops accepting,
/// each connection stops reading new calls and finishes its in-flight ones,
/// and the loop waits for the connections to drain (bounded by a 30s
/// timeout).
///
/// # Errors
///
/// Returns an error if the accept loop encounters an I/O failure.
pub async fn serve_with_shutdown(
    listener: TcpListener,
    registry: Arc<ProtocolRegistry>,
    shutdown_tx: watch::Sender<()>,
) -> Result<(), RpcError> {
    let local_addr = listener.local_addr()?;
    info!("rpc server listening on {}", local_addr);
    let mut shutdown_rx = shutdown_tx.subscribe();
    let done = Arc::new(tokio::sync::Notify::new());
    let mut active: usize = 0;

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        debug!("connection from {}", addr);
                        let registry = Arc::clone(&registry);
                        let done = Arc::clone(&done);
                        let conn_shutdown = shutdown_tx.subscribe();
                        active += 1;
                        tokio::spawn(async move {
                            if let Err(e) =
                                serve_stream_with_shutdown(stream, registry, conn_shutdown).await
                            {
                                debug!("connection from {} closed: {}", addr, e);
                            }
                            done.notify_one();
                        });
                    }
                    Err(e) => {
                        error!("failed to accept connection: {}", e);
                    }
                }
            }
            _ = shutdown_rx.changed() => {
                info!("shutdown signal received, draining {} connections", active);
                break;
            }
        }
    }

    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(30);
    while active > 0 {
        if tokio::time::timeout_at(deadline, done.notified()).await.is_err() {
            warn!("drain timeout reached with {} connections still active", active);
            break;
        }
        active = active.saturating_sub(1);
    }
    Ok(())
}

/// Serves RPC traffic on a single byte stream until it closes.
///
/// # Errors
///
/// Returns an error on transport failure; clean peer close is `Ok`.
pub async fn serve_stream<S>(stream: S, registry: Arc<ProtocolRegistry>) -> Result<(), RpcError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    // The sender is held across the await so the shutdown branch stays
    // quiet for the lifetime of the stream.
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let result = serve_stream_with_shutdown(stream, registry, shutdown_rx).await;
    drop(shutdown_tx);
    result
}

async fn serve_stream_with_shutdown<S>(
    stream: S,
    registry: Arc<ProtocolRegistry>,
    mut shutdown: watch::Receiver<()>,
) -> Result<(), RpcError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut rd, mut wr) = tokio::io::split(stream);
    let (resp_tx, mut resp_rx) = mpsc::channel::<Packet>(64);

    let writer: JoinHandle<()> = tokio::spawn(async move {
        while let Some(packet) = resp_rx.recv().await {
            if let Err(e) = write_packet(&mut wr, &packet).await {
                warn!("server write failed: {}", e);
                break;
            }
        }
    });

    let inflight: DashMap<u32, JoinHandle<()>> = DashMap::new();
    let mut draining = false;
    let result = loop {
        let packet = tokio::select! {
            read = read_packet(&mut rd) => match read {
                Ok(p) => p,
                Err(RpcError::ConnectionClosed) => break Ok(()),
                Err(e) => break Err(e),
            },
            _ = shutdown.changed() => {
                draining = true;
                break Ok(());
            }
        };
        match packet {
            Packet::Call { seq, method, args }
            | Packet::CallCompressed {
                seq, method, args, ..
            } => {
                let registry = Arc::clone(&registry);
                let resp_tx = resp_tx.clone();
                inflight.retain(|_, handle| !handle.is_finished());
                let handle = tokio::spawn(async move {
                    let response = match registry.dispatch(&method, args).await {
                        Ok(result) => Packet::response_ok(seq, result),
                        Err(e) => {
                            debug!("{} failed: {}", method, e);
                            Packet::response_err(seq, WireError::from_rpc_error(&e))
                        }
                    };
                    let _ = resp_tx.send(response).await;
                });
                inflight.insert(seq, handle);
            }
            Packet::Notify { method, args } => {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    if let Err(e) = registry.dispatch(&method, args).await {
                        debug!("notify {} failed: {}", method, e);
                    }
                });
            }
            Packet::Cancel { seq } => {
                if let Some((_, handle)) = inflight.remove(&seq) {
                    handle.abort();
                    let canceled = WireError {
                        code: -1,
                        name: "CANCELED".to_owned(),
                        desc: format!("call {seq} canceled"),
                    };
                    let _ = resp_tx.send(Packet::response_err(seq, canceled)).await;
                } else {
                    debug!("cancel for unknown seq {}", seq);
                }
            }
            Packet::Response { seq, .. } => {
                debug!("ignoring response packet for seq {} on server side", seq);
            }
        }
    };

    if draining {
        // Let in-flight calls finish and their responses flush before the
        // stream closes.
        let seqs: Vec<u32> = inflight.iter().map(|entry| *entry.key()).collect();
        for seq in seqs {
            if let Some((_, handle)) = inflight.remove(&seq) {
                let _ = handle.await;
            }
        }
    } else {
        for entry in inflight.iter() {
            entry.value().abort();
        }
    }
    drop(resp_tx);
    let _ = writer.await;
    result
}
