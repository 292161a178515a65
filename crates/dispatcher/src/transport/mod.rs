//! Transport implementations
//!
//! Contains the line codecs and the stream/datagram connection.

mod codec;
mod connection;

pub use self::codec::{GzipCodec, LineCodec, PlainCodec};
pub use self::connection::Connection;
