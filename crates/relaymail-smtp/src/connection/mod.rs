//! Connection management: the line channel and TCP setup.

mod channel;
mod stream;

pub use channel::LineChannel;
pub(crate) use channel::strip_terminator;
pub use stream::{address_literal, connect};
