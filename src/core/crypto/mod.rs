/*!
Cryptographic engines for the e2ee protocol.

Pure transformation code, no I/O: [`KeyExchange`] handles the RSA-2048
keypair and session-key transport, [`Cipher`] handles AES-256-CBC message
encryption. Neither side authenticates the other and frames carry no
MAC; any decrypt failure terminates the session.
*/

pub mod cipher;
pub mod key_exchange;

pub use cipher::Cipher;
pub use key_exchange::KeyExchange;
