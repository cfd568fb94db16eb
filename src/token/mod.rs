pub mod codec;

pub use codec::{decode_expiry, is_expired, time_until_expiry, DecodeError};
