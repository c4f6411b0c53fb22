/*!
Server endpoint: listen, accept one peer, and run the handshake as the
responding peer.
*/

use std::net::SocketAddr;

use tracing::debug;

use crate::core::error::Result;
use crate::core::session::{E2eeSession, Role};
use crate::core::transport::{Connection, TcpTransport, TransportConfig};

/// Server endpoint for the e2ee protocol.
///
/// The server binds a listening socket, accepts a single peer, sends its
/// public key, and unwraps the session key the client sends back.
#[derive(Debug)]
pub struct E2eeServer {
    transport: TcpTransport,
    config: TransportConfig,
}

impl E2eeServer {
    /// Bind the listening socket on `port`.
    pub fn bind(port: u16) -> Result<Self> {
        Self::bind_with_config(port, TransportConfig::default())
    }

    /// Bind with transport deadlines applied to accepted connections.
    pub fn bind_with_config(port: u16, config: TransportConfig) -> Result<Self> {
        Ok(Self {
            transport: TcpTransport::bind(port)?,
            config,
        })
    }

    /// Local address of the listening socket.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Block until one peer connects, then run the handshake.
    ///
    /// Returns the established session together with its connection; the
    /// session is `SessionReady` on success.
    pub fn accept(&self) -> Result<(E2eeSession, Connection)> {
        let mut conn = self.transport.accept()?;
        conn.apply_config(&self.config)?;

        let mut session = E2eeSession::new(Role::Server);
        session.handshake(&mut conn)?;
        debug!("session established");
        Ok((session, conn))
    }
}
