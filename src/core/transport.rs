/*!
Blocking TCP transport for the e2ee protocol.

Reliable exact-size byte transfer over one TCP connection, in both the
listening (server) and connecting (client) roles. All network failures
are reported through `Result`; callers decide whether the session
survives them.

There is no default deadline: a blocking call may wait indefinitely on a
silently stalled peer. [`TransportConfig`] exposes optional read/write
deadlines for callers that want an upper bound.
*/

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::debug;

use crate::core::constants::PEM_BUF_SIZE;
use crate::core::error::{Error, Result};

/// Deadlines applied to a connection's blocking reads and writes.
///
/// The default carries no deadline, matching the documented protocol
/// behavior of blocking until data, error, or peer closure.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportConfig {
    /// Upper bound for a single blocking read, if any
    pub read_deadline: Option<Duration>,
    /// Upper bound for a single blocking write, if any
    pub write_deadline: Option<Duration>,
}

#[derive(Debug)]
struct ConnectionInner {
    stream: TcpStream,
    closed: AtomicBool,
}

/// A connected TCP endpoint.
///
/// The socket is owned by this handle; clones share it, so the receive
/// loop can read while the send loop writes. [`Connection::close`] is
/// idempotent and safe to call from either thread; the underlying
/// descriptor is released when the last clone is dropped.
#[derive(Clone, Debug)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl Connection {
    fn new(stream: TcpStream) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                stream,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Apply read/write deadlines to the socket.
    pub fn apply_config(&self, config: &TransportConfig) -> Result<()> {
        self.inner
            .stream
            .set_read_timeout(config.read_deadline)
            .map_err(Error::Transfer)?;
        self.inner
            .stream
            .set_write_timeout(config.write_deadline)
            .map_err(Error::Transfer)?;
        Ok(())
    }

    /// Address of the remote peer.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.inner.stream.peer_addr().map_err(Error::Transfer)
    }

    /// Shut the connection down.
    ///
    /// Idempotent: only the first call reaches the OS. A blocked read or
    /// write on any clone of this connection returns with an error once
    /// the shutdown lands.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            debug!("closing connection");
            let _ = self.inner.stream.shutdown(Shutdown::Both);
        }
    }

    /// Whether `close` has been called on any clone.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&self.inner.stream).read(buf)
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&self.inner.stream).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&self.inner.stream).flush()
    }
}

/// Listening socket for the server role.
#[derive(Debug)]
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Bind the listening socket on `port`.
    pub fn bind(port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port)).map_err(Error::Bind)?;
        Ok(Self { listener })
    }

    /// Local address of the listening socket.
    ///
    /// Useful when binding port 0 and letting the OS pick.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(Error::Bind)
    }

    /// Block until one peer connects.
    pub fn accept(&self) -> Result<Connection> {
        let (stream, addr) = self.listener.accept().map_err(Error::Accept)?;
        debug!(peer = %addr, "accepted connection");
        Ok(Connection::new(stream))
    }

    /// Connect to `host:port`, blocking until the OS reports an outcome.
    pub fn connect(host: &str, port: u16) -> Result<Connection> {
        let stream = TcpStream::connect((host, port)).map_err(Error::Connect)?;
        if let Ok(addr) = stream.peer_addr() {
            debug!(peer = %addr, "connected");
        }
        Ok(Connection::new(stream))
    }
}

/// Send every byte of `data`, looping over partial writes.
///
/// Never short-writes silently: the call either transfers all bytes or
/// fails.
pub fn send_exact<W: Write>(writer: &mut W, data: &[u8]) -> Result<()> {
    writer.write_all(data).map_err(Error::Transfer)
}

/// Receive exactly `len` bytes, looping over partial reads.
///
/// Early peer closure is an error, never a silently short buffer.
pub fn recv_exact<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).map_err(Error::Transfer)?;
    Ok(buf)
}

/// Send a string's raw bytes.
pub fn send_text<W: Write>(writer: &mut W, text: &str) -> Result<()> {
    send_exact(writer, text.as_bytes())
}

/// Receive text with a single bounded read.
///
/// Used only for the one-shot PEM exchange, where one bounded write on
/// the sending side matches one bounded read here by protocol
/// convention; there is no length prefix. Fails if the peer closed
/// without sending anything.
pub fn recv_text<R: Read>(reader: &mut R) -> Result<String> {
    let mut buf = vec![0u8; PEM_BUF_SIZE];
    let n = reader.read(&mut buf).map_err(Error::Transfer)?;
    if n == 0 {
        return Err(Error::Transfer(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "peer closed before sending",
        )));
    }
    buf.truncate(n);
    String::from_utf8(buf).map_err(|_| Error::InvalidFrame("received text is not UTF-8".into()))
}
