pub mod relay_board;

pub use relay_board::{
    read_device_address, read_firmware_version, read_relay_status, set_relay, DeviceInfo,
    RelayBoard, MANUFACTURER, MODEL,
};
