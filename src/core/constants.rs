/*!
Constants for the e2ee protocol.

This module contains the protocol's fixed sizes and limits: key and IV
sizes, the wrapped-session-key width, and frame bounds.
*/

/// Maximum ciphertext length accepted in a single message frame (1 MiB)
pub const MAX_FRAME_SIZE: usize = 1_048_576;

/// Buffer size for the one-shot PEM public key exchange.
///
/// A PKCS#1 PEM encoding of a 2048-bit public key is well under 1 KiB;
/// the buffer leaves generous headroom.
pub const PEM_BUF_SIZE: usize = 4096;

/// Size constants for the protocol
pub mod sizes {
    /// RSA key transport constants
    pub mod rsa {
        /// RSA modulus size in bits
        pub const KEY_BITS: usize = 2048;

        /// Size of the RSA-wrapped session key in bytes.
        ///
        /// Equal to the modulus size; every wrapped key is exactly this
        /// long on the wire.
        pub const WRAPPED_KEY_BYTES: usize = 256;
    }

    /// AES-256-CBC constants
    pub mod aes {
        /// Size of the AES session key in bytes
        pub const KEY_SIZE: usize = 32;

        /// Size of the CBC initialization vector in bytes
        pub const IV_SIZE: usize = 16;

        /// Cipher block size in bytes
        pub const BLOCK_SIZE: usize = 16;
    }

    /// Width of the ciphertext-length field in a message frame
    pub const LEN_FIELD_SIZE: usize = 4;
}
