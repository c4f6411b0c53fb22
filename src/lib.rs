/*!
# e2ee-protocol

A point-to-point encrypted chat protocol over TCP. An RSA-2048 key
exchange establishes a per-session AES-256 key, after which both peers
exchange encrypted message frames concurrently over one socket.

## Overview

This library provides:

- RSA-2048 public key exchange (PEM) with the session key wrapped under
  OAEP-SHA-256
- AES-256-CBC message encryption with a fresh random IV per message
- Exact-byte blocking TCP transport with idempotent teardown
- Two-thread duplex messaging: independent send and receive loops over
  one connection

## Protocol

The server listens and sends its public key as PEM text; the client
generates the 32-byte session key, wraps it under the server's key, and
sends back exactly 256 bytes of RSA ciphertext. Both sides then hold the
same key and exchange frames of the form `IV || length || ciphertext`
until either side terminates.

The key exchange is not authenticated (any received public key is
trusted) and messages carry no MAC; padding failure on decrypt is the
only corruption signal. Both properties are documented protocol
behavior; see the module docs in `core::crypto`.
*/

// Core protocol components
pub mod core;

// Role endpoints and messaging loops
pub mod protocol;

// Re-export commonly used types for convenience
pub use crate::core::constants::{MAX_FRAME_SIZE, sizes};
pub use crate::core::crypto::{Cipher, KeyExchange};
pub use crate::core::error::{CryptoError, Error, Result};
pub use crate::core::message::Frame;
pub use crate::core::session::{E2eeSession, Role, SessionState, StateManager};
pub use crate::core::transport::{
    Connection, TcpTransport, TransportConfig, recv_exact, recv_text, send_exact, send_text,
};
pub use crate::protocol::client::E2eeClient;
pub use crate::protocol::duplex::{MessageSink, MessageSource, StopSignal, run_duplex};
pub use crate::protocol::server::E2eeServer;
