pub mod client;
pub mod decoder;
pub mod exception;
pub mod protocol;

pub use client::{exchange, RelayTransport, TcpExchange, DEFAULT_PORT, DEFAULT_TIMEOUT};
pub use decoder::{
    decode_coil_status, decode_device_address, decode_firmware_version, decode_relay_ack,
    validate_response,
};
pub use exception::ModbusException;
pub use protocol::{
    build_coil_read, build_register_read, build_relay_command, FunctionCode, RelayCommand, Request,
};
