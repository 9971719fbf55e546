//! Waveshare Modbus POE ETH Relay Library
//!
//! Switches relay channels on (optionally with an auto-off timer) and off,
//! polls channel status and reads board metadata over the board's
//! Modbus-TCP-style protocol. One short-lived TCP connection per request.

pub mod cli;
pub mod config;
pub mod devices;
pub mod modbus;
pub mod output;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use devices::{
    read_device_address, read_firmware_version, read_relay_status, set_relay, DeviceInfo,
    RelayBoard,
};
pub use modbus::{
    build_coil_read, build_register_read, build_relay_command, exchange, ModbusException,
    RelayCommand, RelayTransport, TcpExchange,
};
pub use output::{ConsoleFormatter, JsonFormatter, StatusFormatter};
pub use services::{PollStats, StatusPoller, StatusSnapshot};
pub use utils::error::{ConfigError, ProtocolError, TransportError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
