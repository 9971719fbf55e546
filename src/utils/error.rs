use std::time::Duration;
use thiserror::Error;

use crate::modbus::exception::ModbusException;

/// Failures of a single connect / write / read exchange with the board.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection to {addr} failed: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timeout after {after:?} talking to {addr}")]
    Timeout { addr: String, after: Duration },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Outcome of a protocol call that did not produce a value.
///
/// The three variants map onto what an operator should be told:
/// the board could not be reached, the board rejected the request,
/// or whatever answered on that port is not speaking this protocol.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Device exception 0x{code:02X} ({name}): {description}")]
    DeviceException {
        code: u8,
        name: &'static str,
        description: &'static str,
    },

    #[error("Malformed response: expected at least {expected} bytes, got {actual}")]
    MalformedResponse { expected: usize, actual: usize },
}

impl ProtocolError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ProtocolError::Transport(_))
    }

    pub fn is_device_exception(&self) -> bool {
        matches!(self, ProtocolError::DeviceException { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, ProtocolError::MalformedResponse { .. })
    }

    /// Exception code reported by the device, if this is a device exception.
    pub fn exception_code(&self) -> Option<u8> {
        match self {
            ProtocolError::DeviceException { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<ModbusException> for ProtocolError {
    fn from(exception: ModbusException) -> Self {
        ProtocolError::DeviceException {
            code: exception.code,
            name: exception.name,
            description: exception.description,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_converts_to_device_exception() {
        let err: ProtocolError = ModbusException::from_code(0x02).into();

        assert!(err.is_device_exception());
        assert_eq!(err.exception_code(), Some(0x02));
        assert_eq!(
            err.to_string(),
            "Device exception 0x02 (Illegal Data Address): requested data address incorrect"
        );
    }

    #[test]
    fn test_error_categories_are_distinct() {
        let transport: ProtocolError = TransportError::Timeout {
            addr: "10.0.0.1:502".to_string(),
            after: Duration::from_secs(5),
        }
        .into();
        let malformed = ProtocolError::MalformedResponse { expected: 10, actual: 3 };

        assert!(transport.is_transport());
        assert!(!transport.is_malformed());
        assert!(malformed.is_malformed());
        assert!(!malformed.is_device_exception());
        assert_eq!(malformed.exception_code(), None);
    }
}
