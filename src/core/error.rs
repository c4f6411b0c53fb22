/*!
Error handling for the e2ee protocol.

Network failures carry their underlying `io::Error` so callers can
distinguish peer closure from other faults. Cryptographic failures are
deliberately terse: the error never reveals key or plaintext details.
*/

use std::io;

use thiserror::Error;

/// Result type for the e2ee protocol
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the e2ee protocol
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to bind the listening socket
    #[error("bind failed: {0}")]
    Bind(#[source] io::Error),

    /// Failed to accept an incoming connection
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// Failed to connect to the remote peer
    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),

    /// A send or receive did not transfer the expected bytes
    #[error("transfer failed: {0}")]
    Transfer(#[source] io::Error),

    /// Cryptographic error (limited details for security)
    #[error("cryptographic operation failed")]
    Crypto(#[source] CryptoError),

    /// Malformed message frame received from the peer
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// Session not in the correct state for the requested operation
    #[error("session not in correct state: expected {expected}, but was {actual}")]
    InvalidState { expected: String, actual: String },
}

impl Error {
    /// Whether this error means the peer closed the connection.
    pub fn is_peer_closed(&self) -> bool {
        matches!(self, Error::Transfer(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

/// Cryptographic errors with limited details to prevent leaking information
#[derive(Error, Debug)]
pub enum CryptoError {
    /// RSA keypair generation failed
    #[error("key generation failed")]
    KeyGenerationFailed,

    /// Local public key could not be PEM-encoded
    #[error("key encoding failed")]
    KeyEncodeFailed,

    /// Peer public key PEM could not be parsed
    #[error("key parse failed")]
    KeyParseFailed,

    /// Session key could not be wrapped under the peer's public key
    #[error("session key wrap failed")]
    WrapFailed,

    /// Decryption failed: wrong key, corrupted frame, or truncated input
    #[error("decryption failed")]
    DecryptionFailed,
}

/// Convert from Error to io::Error (for compatibility)
impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Bind(e) | Error::Accept(e) | Error::Connect(e) | Error::Transfer(e) => e,
            Error::Crypto(_) => io::Error::new(io::ErrorKind::InvalidData, "cryptographic error"),
            Error::InvalidFrame(msg) => io::Error::new(io::ErrorKind::InvalidData, msg),
            Error::InvalidState { expected, actual } => io::Error::new(
                io::ErrorKind::NotConnected,
                format!("invalid state: expected {expected}, but was {actual}"),
            ),
        }
    }
}
