use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;
use crate::modbus::decoder;
use crate::modbus::protocol::{
    build_coil_read, build_register_read, build_relay_command, FunctionCode, RelayCommand,
    DEVICE_ADDRESS_REGISTER, FIRMWARE_VERSION_REGISTER,
};
use crate::modbus::{RelayTransport, TcpExchange};
use crate::utils::error::{ProtocolError, TransportError};

pub const MANUFACTURER: &str = "Waveshare";
pub const MODEL: &str = "Modbus POE ETH Relay";

/// Address and firmware version, each from its own exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub address: Option<u8>,
    pub firmware_version: Option<String>,
}

/// The four protocol operations against one relay board.
///
/// Every call is independent: build a frame, run one exchange, decode the
/// reply. Nothing is cached between calls and nothing serializes calls to the
/// same board; callers that need ordering must provide it themselves.
pub struct RelayBoard<T = TcpExchange> {
    transport: T,
}

impl RelayBoard<TcpExchange> {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_transport(TcpExchange::new(host, port))
    }

    pub fn with_timeout(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self::with_transport(TcpExchange::with_timeout(host, port, timeout))
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_timeout(config.host.clone(), config.port, config.timeout())
    }
}

impl<T: RelayTransport> RelayBoard<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `interval` in deciseconds: `> 0` timed on, `0` permanently on, `< 0` off.
    pub async fn set_relay(&self, relay_address: u8, interval: i32) -> Result<(), ProtocolError> {
        let command = RelayCommand::from_interval(interval);
        debug!("Relay {} on {} -> {:?}", relay_address, self.transport.peer(), command);

        let frame = build_relay_command(relay_address, interval);
        let response = self.transport.exchange(&frame).await?;
        decoder::decode_relay_ack(&response)
    }

    /// One status bit per channel, `start_channel` first.
    pub async fn read_relay_status(
        &self,
        start_channel: u16,
        num_channels: u16,
    ) -> Result<Vec<bool>, ProtocolError> {
        let frame = build_coil_read(FunctionCode::ReadCoils.code(), start_channel, num_channels);
        let response = self.transport.exchange(&frame).await?;
        let status = decoder::decode_coil_status(&response, num_channels)?;
        debug!("Relay statuses from {}: {:?}", self.transport.peer(), status);
        Ok(status)
    }

    pub async fn read_device_address(&self) -> Result<u8, ProtocolError> {
        let frame = build_register_read(
            FunctionCode::ReadHoldingRegisters.code(),
            DEVICE_ADDRESS_REGISTER,
        );
        let response = self.transport.exchange(&frame).await?;
        decoder::decode_device_address(&response)
    }

    pub async fn read_firmware_version(&self) -> Result<String, ProtocolError> {
        let frame = build_register_read(
            FunctionCode::ReadHoldingRegisters.code(),
            FIRMWARE_VERSION_REGISTER,
        );
        let response = self.transport.exchange(&frame).await?;
        decoder::decode_firmware_version(&response)
    }

    /// `deciseconds == 0` leaves the channel on until turned off.
    pub async fn turn_on(&self, channel: u8, deciseconds: u16) -> Result<(), ProtocolError> {
        self.set_relay(channel, i32::from(deciseconds)).await?;
        info!("✅ Channel {} on ({} ds)", channel, deciseconds);
        Ok(())
    }

    pub async fn turn_off(&self, channel: u8) -> Result<(), ProtocolError> {
        self.set_relay(channel, -1).await?;
        info!("✅ Channel {} off", channel);
        Ok(())
    }

    pub async fn read_channel(&self, channel: u8) -> Result<bool, ProtocolError> {
        let status = self.read_relay_status(u16::from(channel), 1).await?;
        Ok(status[0])
    }

    /// A failed read leaves the matching field empty instead of failing the whole call.
    pub async fn read_device_info(&self) -> DeviceInfo {
        let address = match self.read_device_address().await {
            Ok(address) => Some(address),
            Err(e) => {
                warn!("⚠️  Could not read device address from {}: {}", self.transport.peer(), e);
                None
            }
        };

        let firmware_version = match self.read_firmware_version().await {
            Ok(version) => Some(version),
            Err(e) => {
                warn!("⚠️  Could not read firmware version from {}: {}", self.transport.peer(), e);
                None
            }
        };

        DeviceInfo {
            address,
            firmware_version,
        }
    }

    pub async fn probe(&self) -> Result<(), TransportError> {
        self.transport.probe().await
    }
}

pub async fn set_relay(
    address: &str,
    port: u16,
    relay_address: u8,
    interval: i32,
) -> Result<(), ProtocolError> {
    RelayBoard::new(address, port).set_relay(relay_address, interval).await
}

pub async fn read_relay_status(
    address: &str,
    port: u16,
    start_channel: u16,
    num_channels: u16,
) -> Result<Vec<bool>, ProtocolError> {
    RelayBoard::new(address, port)
        .read_relay_status(start_channel, num_channels)
        .await
}

pub async fn read_device_address(address: &str, port: u16) -> Result<u8, ProtocolError> {
    RelayBoard::new(address, port).read_device_address().await
}

pub async fn read_firmware_version(address: &str, port: u16) -> Result<String, ProtocolError> {
    RelayBoard::new(address, port).read_firmware_version().await
}
