//! Client side of the RPC runtime.
//!
//! [`GenericClient`] is the injected-transport seam generated stubs are
//! written against: a blocking call, a compressed variant, and a
//! fire-and-forget notify. [`RpcClient`] implements it over any byte
//! stream, multiplexing concurrent calls by sequence number.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use rmpv::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::compress::CompressionType;
use crate::error::RpcError;
use crate::packet::{read_packet, write_packet, Packet};

/// Generic RPC transport injected into generated client stubs.
///
/// Arguments are the already-encoded positional tuple; the result is the
/// raw msgpack result value. Each call is a stateless, independent
/// request/response exchange; any sequencing is explicit caller data.
#[async_trait]
pub trait GenericClient: Send + Sync {
    /// Issues a call and waits for its response.
    async fn call(
        &self,
        method: &str,
        args: Value,
        timeout: Option<Duration>,
    ) -> Result<Value, RpcError>;

    /// Issues a call whose argument tuple is compressed on the wire.
    async fn call_compressed(
        &self,
        method: &str,
        args: Value,
        compression: CompressionType,
        timeout: Option<Duration>,
    ) -> Result<Value, RpcError>;

    /// Sends a one-way notification; no response is ever delivered.
    async fn notify(
        &self,
        method: &str,
        args: Value,
        timeout: Option<Duration>,
    ) -> Result<(), RpcError>;
}

#[async_trait]
impl<T: GenericClient + ?Sized> GenericClient for Arc<T> {
    async fn call(
        &self,
        method: &str,
        args: Value,
        timeout: Option<Duration>,
    ) -> Result<Value, RpcError> {
        (**self).call(method, args, timeout).await
    }

    async fn call_compressed(
        &self,
        method: &str,
        args: Value,
        compression: CompressionType,
        timeout: Option<Duration>,
    ) -> Result<Value, RpcError> {
        (**self).call_compressed(method, args, compression, timeout).await
    }

    async fn notify(
        &self,
        method: &str,
        args: Value,
        timeout: Option<Duration>,
    ) -> Result<(), RpcError> {
        (**self).notify(method, args, timeout).await
    }
}

/// Marshals a typed argument tuple, calls, and unmarshals the result.
///
/// # Errors
///
/// Returns encoding, transport, or remote errors.
pub async fn call_typed<C, A, R>(cli: &C, method: &str, args: &A) -> Result<R, RpcError>
where
    C: GenericClient + ?Sized,
    A: Serialize,
    R: DeserializeOwned,
{
    let args = rmpv::ext::to_value(args)?;
    let res = cli.call(method, args, None).await?;
    Ok(rmpv::ext::from_value(res)?)
}

/// Like [`call_typed`], requesting wire compression of the arguments.
///
/// # Errors
///
/// Returns encoding, transport, or remote errors.
pub async fn call_compressed_typed<C, A, R>(
    cli: &C,
    method: &str,
    args: &A,
    compression: CompressionType,
) -> Result<R, RpcError>
where
    C: GenericClient + ?Sized,
    A: Serialize,
    R: DeserializeOwned,
{
    let args = rmpv::ext::to_value(args)?;
    let res = cli.call_compressed(method, args, compression, None).await?;
    Ok(rmpv::ext::from_value(res)?)
}

/// Marshals a typed argument tuple and sends a one-way notification.
///
/// # Errors
///
/// Returns encoding or transport errors.
pub async fn notify_typed<C, A>(cli: &C, method: &str, args: &A) -> Result<(), RpcError>
where
    C: GenericClient + ?Sized,
    A: Serialize,
{
    let args = rmpv::ext::to_value(args)?;
    cli.notify(method, args, None).await
}

type PendingMap = DashMap<u32, oneshot::Sender<Result<Value, RpcError>>>;

/// A connected RPC client over a byte stream.
///
/// Spawns a writer task fed by an mpsc outbox and a reader task that routes
/// responses (possibly out of order) to their callers by sequence number.
/// Dropping the client closes the outbox; outstanding calls fail with
/// [`RpcError::ConnectionClosed`] once the stream ends.
pub struct RpcClient {
    next_seq: AtomicU32,
    pending: Arc<PendingMap>,
    outbox: mpsc::Sender<Packet>,
}

impl RpcClient {
    /// Takes ownership of a stream and spawns its reader/writer tasks.
    pub fn new<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (rd, wr) = tokio::io::split(stream);
        let (outbox, outbox_rx) = mpsc::channel(64);
        let pending: Arc<PendingMap> = Arc::new(DashMap::new());
        tokio::spawn(write_loop(wr, outbox_rx));
        tokio::spawn(read_loop(rd, Arc::clone(&pending)));
        Self {
            next_seq: AtomicU32::new(1),
            pending,
            outbox,
        }
    }

    async fn issue(
        &self,
        seq: u32,
        packet: Packet,
        timeout: Option<Duration>,
    ) -> Result<Value, RpcError> {
        let (tx, rx) = oneshot::channel();
        self.pending.insert(seq, tx);
        if self.outbox.send(packet).await.is_err() {
            self.pending.remove(&seq);
            return Err(RpcError::ConnectionClosed);
        }
        match timeout {
            None => rx.await.unwrap_or(Err(RpcError::ConnectionClosed)),
            Some(dur) => match tokio::time::timeout(dur, rx).await {
                Ok(res) => res.unwrap_or(Err(RpcError::ConnectionClosed)),
                Err(_) => {
                    self.pending.remove(&seq);
                    let _ = self.outbox.send(Packet::Cancel { seq }).await;
                    Err(RpcError::Timeout(dur))
                }
            },
        }
    }

    fn alloc_seq(&self) -> u32 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl GenericClient for RpcClient {
    async fn call(
        &self,
        method: &str,
        args: Value,
        timeout: Option<Duration>,
    ) -> Result<Value, RpcError> {
        let seq = self.alloc_seq();
        self.issue(seq, Packet::call(seq, method, args), timeout)
            .await
    }

    async fn call_compressed(
        &self,
        method: &str,
        args: Value,
        compression: CompressionType,
        timeout: Option<Duration>,
    ) -> Result<Value, RpcError> {
        let seq = self.alloc_seq();
        self.issue(
            seq,
            Packet::call_compressed(seq, compression, method, args),
            timeout,
        )
        .await
    }

    async fn notify(
        &self,
        method: &str,
        args: Value,
        timeout: Option<Duration>,
    ) -> Result<(), RpcError> {
        let packet = Packet::notify(method, args);
        let send = self.outbox.send(packet);
        let sent = match timeout {
            None => send.await.is_ok(),
            Some(dur) => matches!(tokio::time::timeout(dur, send).await, Ok(Ok(()))),
        };
        if sent {
            Ok(())
        } else {
            Err(RpcError::ConnectionClosed)
        }
    }
}

async fn write_loop<S>(mut wr: WriteHalf<S>, mut outbox: mpsc::Receiver<Packet>)
where
    S: AsyncRead + AsyncWrite,
{
    while let Some(packet) = outbox.recv().await {
        if let Err(e) = write_packet(&mut wr, &packet).await {
            warn!("client write failed: {}", e);
            break;
        }
    }
}

async fn read_loop<S>(mut rd: ReadHalf<S>, pending: Arc<PendingMap>)
where
    S: AsyncRead + AsyncWrite,
{
    loop {
        match read_packet(&mut rd).await {
            Ok(Packet::Response { seq, error, result }) => {
                let Some((_, tx)) = pending.remove(&seq) else {
                    debug!("response for unknown seq {}", seq);
                    continue;
                };
                let outcome = match error {
                    Some(e) => Err(e.into()),
                    None => Ok(result),
                };
                let _ = tx.send(outcome);
            }
            Ok(other) => {
                debug!("ignoring unexpected packet type {}", other.packet_type());
            }
            Err(RpcError::ConnectionClosed) => break,
            Err(e) => {
                warn!("client read failed: {}", e);
                break;
            }
        }
    }
    // Fail whatever is still outstanding.
    let keys: Vec<u32> = pending.iter().map(|entry| *entry.key()).collect();
    for seq in keys {
        if let Some((_, tx)) = pending.remove(&seq) {
            let _ = tx.send(Err(RpcError::ConnectionClosed));
        }
    }
}
