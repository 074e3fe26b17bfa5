//! Line transport over plain TCP or TLS.
//!
//! [`Transport::open`] resolves, connects and optionally wraps the stream in
//! TLS. [`Transport::split`] then yields a [`LineReader`] for the single
//! reader task and a cloneable [`LineWriter`] that any task may write through.
//! Closing from either side wakes a pending read promptly.

mod codec;
mod tls;

pub use self::codec::{LineCodec, MAX_LINE_LEN};

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::{TlsVerification, TransportKind};
use crate::error::TransportError;

/// Default connect timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Any byte stream the transport can carry lines over.
pub trait IoStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> IoStream for T {}

type BoxStream = Box<dyn IoStream>;

struct Shared {
    peer: String,
    connected: AtomicBool,
    cancel: CancellationToken,
}

impl Shared {
    fn mark_closed(&self) -> bool {
        let was = self.connected.swap(false, Ordering::SeqCst);
        self.cancel.cancel();
        was
    }
}

/// An open connection, not yet split into halves.
pub struct Transport {
    stream: BoxStream,
    charset: String,
    peer: String,
}

impl Transport {
    /// Open a connection to `host:port`.
    pub async fn open(
        host: &str,
        port: u16,
        charset: &str,
        kind: TransportKind,
        verification: TlsVerification,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| TransportError::HostUnresolved(format!("{}: {}", host, e)))?
            .collect();
        if addrs.is_empty() {
            return Err(TransportError::HostUnresolved(host.to_string()));
        }
        // Fail on a bad charset before touching the network.
        LineCodec::new(charset)?;

        let tcp = connect_any(host, port, &addrs, timeout).await?;
        if let Err(e) = enable_keepalive(&tcp) {
            warn!(error = %e, "failed to enable TCP keepalive");
        }

        let stream: BoxStream = match kind {
            TransportKind::Plain => Box::new(tcp),
            TransportKind::Tls => {
                if verification == TlsVerification::AcceptInvalid {
                    warn!(host, "TLS certificate verification disabled for this connection");
                }
                let name = tls::server_name(host)?;
                let tls = tls::connector(verification)
                    .connect(name, tcp)
                    .await
                    .map_err(|e| TransportError::Tls(e.to_string()))?;
                Box::new(tls)
            }
        };

        debug!(host, port, ?kind, charset, "connected");
        Ok(Transport {
            stream,
            charset: charset.to_string(),
            peer: format!("{}:{}", host, port),
        })
    }

    /// Wrap an already-connected stream (used by tests and embedders).
    pub fn from_stream<S>(stream: S, charset: &str, peer: &str) -> Result<Self, TransportError>
    where
        S: IoStream + 'static,
    {
        LineCodec::new(charset)?;
        Ok(Transport {
            stream: Box::new(stream),
            charset: charset.to_string(),
            peer: peer.to_string(),
        })
    }

    /// Split into the reading and writing halves.
    pub fn split(self) -> Result<(LineReader, LineWriter), TransportError> {
        let shared = Arc::new(Shared {
            peer: self.peer,
            connected: AtomicBool::new(true),
            cancel: CancellationToken::new(),
        });
        let (read, write) = tokio::io::split(self.stream);
        let reader = LineReader {
            frames: FramedRead::new(read, LineCodec::new(&self.charset)?),
            shared: Arc::clone(&shared),
        };
        let writer = LineWriter {
            sink: Arc::new(Mutex::new(FramedWrite::new(
                write,
                LineCodec::new(&self.charset)?,
            ))),
            shared,
        };
        Ok((reader, writer))
    }
}

async fn connect_any(
    host: &str,
    port: u16,
    addrs: &[SocketAddr],
    timeout: Duration,
) -> Result<TcpStream, TransportError> {
    let mut last = None;
    for addr in addrs {
        match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => return Ok(stream),
            Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => {
                debug!(%addr, "connection refused");
                last = Some(TransportError::ConnectionRefused {
                    host: host.to_string(),
                    port,
                });
            }
            Ok(Err(e)) => {
                debug!(%addr, error = %e, "connect failed");
                last = Some(TransportError::Io(e));
            }
            Err(_) => {
                debug!(%addr, "connect timed out");
                last = Some(TransportError::ConnectTimeout {
                    host: host.to_string(),
                    port,
                });
            }
        }
    }
    Err(last.unwrap_or_else(|| TransportError::HostUnresolved(host.to_string())))
}

fn enable_keepalive(stream: &TcpStream) -> std::io::Result<()> {
    use socket2::{SockRef, TcpKeepalive};

    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));
    sock.set_tcp_keepalive(&keepalive)
}

/// Reading half. Owned by one reader task.
pub struct LineReader {
    frames: FramedRead<ReadHalf<BoxStream>, LineCodec>,
    shared: Arc<Shared>,
}

impl LineReader {
    /// Next line without its terminator. `Ok(None)` on end of stream or
    /// after [`LineWriter::close`].
    pub async fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        tokio::select! {
            _ = self.shared.cancel.cancelled() => Ok(None),
            next = self.frames.next() => match next {
                Some(Ok(line)) => {
                    trace!(peer = %self.shared.peer, line = %line, "<<");
                    Ok(Some(line))
                }
                Some(Err(e)) => {
                    self.shared.mark_closed();
                    Err(e)
                }
                None => {
                    self.shared.mark_closed();
                    Ok(None)
                }
            },
        }
    }

    /// Whether the connection is still open.
    pub fn connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }
}

/// Writing half. Cheap to clone; writes are serialised.
#[derive(Clone)]
pub struct LineWriter {
    sink: Arc<Mutex<FramedWrite<WriteHalf<BoxStream>, LineCodec>>>,
    shared: Arc<Shared>,
}

impl LineWriter {
    /// Write one line, appending CRLF, and flush it.
    pub async fn write_line(&self, line: &str) -> Result<(), TransportError> {
        if !self.connected() {
            return Err(TransportError::Closed);
        }
        trace!(peer = %self.shared.peer, line, ">>");
        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.send(line.to_string()).await {
            self.shared.mark_closed();
            return Err(e);
        }
        Ok(())
    }

    /// Whether the connection is still open. Never blocks.
    pub fn connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    /// Close the connection. Safe to call more than once and from any task.
    pub async fn close(&self) {
        if !self.shared.mark_closed() {
            return;
        }
        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.close().await {
            debug!(peer = %self.shared.peer, error = %e, "error while closing");
        }
    }
}

impl std::fmt::Debug for LineWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineWriter")
            .field("peer", &self.shared.peer)
            .field("connected", &self.connected())
            .finish()
    }
}
