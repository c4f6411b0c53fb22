/*!
Core protocol components.

Everything under this module is either pure transformation code (crypto,
framing, session state) or the blocking TCP transport. The messaging
loops that tie these together live in [`crate::protocol`].
*/

pub mod constants;
pub mod crypto;
pub mod error;
pub mod message;
pub mod session;
pub mod transport;
