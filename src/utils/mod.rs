pub mod error;
#[cfg(test)]
pub mod test_utils;

pub use error::{ConfigError, ProtocolError, TransportError};
