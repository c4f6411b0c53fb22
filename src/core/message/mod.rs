/*!
Wire framing for encrypted messages.
*/

pub mod frame;

pub use frame::Frame;
