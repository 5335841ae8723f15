//! Consensus serialization primitives and shared value types.

pub mod encoding;
pub mod hash;
pub mod outpoint;

pub use encoding::{decode, encode, Decodable, DecodeError, Decoder, Encodable, Encoder};
pub use hash::{sha256, sha256d};
pub use outpoint::OutPoint;
