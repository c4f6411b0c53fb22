/*!
Session orchestration for the e2ee protocol.

This module drives the one-time key agreement over an established byte
stream and then gates per-message encryption on the session being ready.
The handshake runs exactly once per session:

- Server: generate keypair, send the public key as PEM, receive the
  wrapped session key, unwrap it.
- Client: receive the PEM, import it, generate the session key, wrap it
  under the peer key, send it.

The session key is generated exclusively by the client; the server never
generates one. Both sides must reach `SessionReady` before any message
frame is produced or consumed; out-of-order calls fail fast with an
`InvalidState` error.
*/

use std::io::{Read, Write};
use std::sync::Arc;

use tracing::debug;

use crate::core::constants::sizes;
use crate::core::crypto::{Cipher, KeyExchange};
use crate::core::error::{Error, Result};
use crate::core::message::Frame;
use crate::core::session::state::{Role, SessionState, StateManager};
use crate::core::transport::{recv_exact, recv_text, send_exact, send_text};

/// One endpoint of an encrypted session.
///
/// Generic over the stream so the handshake runs identically over a real
/// TCP connection or an in-memory pipe. The concurrent messaging loops
/// live in [`crate::protocol::duplex`]; this type provides the
/// per-message encrypt/decrypt they share.
pub struct E2eeSession {
    state: StateManager,
    key_exchange: KeyExchange,
    cipher: Option<Arc<Cipher>>,
}

impl E2eeSession {
    /// Create a new session for the given role.
    pub fn new(role: Role) -> Self {
        Self {
            state: StateManager::new(role),
            key_exchange: KeyExchange::new(),
            cipher: None,
        }
    }

    /// Get the endpoint role
    pub fn role(&self) -> Role {
        self.state.role()
    }

    /// Get the current session state
    pub fn state(&self) -> SessionState {
        self.state.state()
    }

    /// Run the one-time key agreement over `stream`.
    ///
    /// On success both peers hold the same session key and the session
    /// is `SessionReady`. Any failure leaves the session unusable; there
    /// is no retry path.
    pub fn handshake<S: Read + Write>(&mut self, stream: &mut S) -> Result<()> {
        if !self.state.can_handshake() {
            return Err(self.state_error("Idle"));
        }
        self.state.transition_to_connected();

        match self.state.role() {
            Role::Server => self.server_handshake(stream),
            Role::Client => self.client_handshake(stream),
        }
    }

    fn server_handshake<S: Read + Write>(&mut self, stream: &mut S) -> Result<()> {
        self.key_exchange.generate_keypair()?;
        let pem = self.key_exchange.public_key_pem()?;
        send_text(stream, &pem)?;
        self.state.transition_to_key_exchanged();
        debug!("public key sent, waiting for wrapped session key");

        let wrapped = recv_exact(stream, sizes::rsa::WRAPPED_KEY_BYTES)?;
        let session_key = self.key_exchange.unwrap_session_key(&wrapped)?;
        self.install_session_key(session_key);
        Ok(())
    }

    fn client_handshake<S: Read + Write>(&mut self, stream: &mut S) -> Result<()> {
        let pem = recv_text(stream)?;
        self.key_exchange.load_peer_public_key(&pem)?;
        self.state.transition_to_key_exchanged();

        let session_key = KeyExchange::generate_session_key();
        let wrapped = self.key_exchange.wrap_session_key(&session_key)?;
        send_exact(stream, &wrapped)?;
        self.install_session_key(session_key);
        Ok(())
    }

    fn install_session_key(&mut self, key: [u8; sizes::aes::KEY_SIZE]) {
        self.cipher = Some(Arc::new(Cipher::new(key)));
        self.state.transition_to_session_ready();
        debug!(role = %self.state.role(), "session key established");
    }

    /// Encrypt one message. The session key must be established.
    pub fn encrypt_message(&self, plaintext: &[u8]) -> Result<Frame> {
        self.cipher()?.encrypt(plaintext)
    }

    /// Decrypt one received frame. The session key must be established.
    pub fn decrypt_message(&self, frame: &Frame) -> Result<Vec<u8>> {
        self.cipher()?.decrypt(frame)
    }

    /// Shared handle to the established cipher, for the messaging loops.
    pub fn cipher(&self) -> Result<Arc<Cipher>> {
        match (&self.cipher, self.state.can_transfer()) {
            (Some(cipher), true) => Ok(Arc::clone(cipher)),
            _ => Err(self.state_error("SessionReady")),
        }
    }

    /// Mark the session closed. Messaging operations fail afterwards.
    pub fn close(&mut self) {
        self.state.transition_to_closed();
    }

    fn state_error(&self, expected: &str) -> Error {
        Error::InvalidState {
            expected: expected.to_string(),
            actual: self.state.state().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messaging_before_handshake_fails_fast() {
        let session = E2eeSession::new(Role::Client);
        assert_eq!(session.state(), SessionState::Idle);

        let err = session.encrypt_message(b"too early").unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));

        let frame = Frame::new([0u8; sizes::aes::IV_SIZE], vec![0u8; 16]);
        assert!(session.decrypt_message(&frame).is_err());
        assert!(session.cipher().is_err());
    }

    #[test]
    fn test_closed_session_rejects_messaging() {
        let mut session = E2eeSession::new(Role::Server);
        session.close();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.encrypt_message(b"late").is_err());
    }

    #[test]
    fn test_handshake_requires_idle_state() {
        let mut session = E2eeSession::new(Role::Server);
        session.close();

        let mut stream = std::io::Cursor::new(Vec::<u8>::new());
        let err = session.handshake(&mut stream).unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
    }
}
