/*!
Client endpoint: connect and run the handshake as the initiating peer.
*/

use crate::core::error::Result;
use crate::core::session::{E2eeSession, Role, SessionState};
use crate::core::transport::{Connection, TcpTransport, TransportConfig};

/// Client endpoint for the e2ee protocol.
///
/// The client initiates the TCP connection, receives the server's public
/// key, and generates and wraps the session key.
pub struct E2eeClient {
    session: E2eeSession,
    config: TransportConfig,
}

impl E2eeClient {
    /// Create a new client.
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    /// Create a client with transport deadlines.
    pub fn with_config(config: TransportConfig) -> Self {
        Self {
            session: E2eeSession::new(Role::Client),
            config,
        }
    }

    /// Connect to the server and run the handshake.
    ///
    /// A single connection attempt: on failure the session does not
    /// proceed and is not retried. On success the session is
    /// `SessionReady` and the returned connection carries message frames.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<Connection> {
        let mut conn = TcpTransport::connect(host, port)?;
        conn.apply_config(&self.config)?;
        self.session.handshake(&mut conn)?;
        Ok(conn)
    }

    /// Get the current session state
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Get a reference to the underlying session
    pub fn session(&self) -> &E2eeSession {
        &self.session
    }

    /// Get a mutable reference to the underlying session
    pub fn session_mut(&mut self) -> &mut E2eeSession {
        &mut self.session
    }
}

impl Default for E2eeClient {
    fn default() -> Self {
        Self::new()
    }
}
