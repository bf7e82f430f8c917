//! Session token claims and HS256 signing.

pub mod claims;
pub mod codec;

pub use claims::Claims;
pub use codec::JwtCodec;
