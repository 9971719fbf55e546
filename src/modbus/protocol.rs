use bytes::BufMut;

/// Every request reuses transaction id 1; requests are never pipelined.
pub const TRANSACTION_ID: u16 = 0x0001;
pub const PROTOCOL_ID: u16 = 0x0000;
/// Length field of the MBAP header: unit id + function code + 4 payload bytes.
pub const HEADER_LENGTH: u16 = 0x0006;
pub const UNIT_ID: u8 = 0x01;
pub const FRAME_LEN: usize = 12;

pub const DEVICE_ADDRESS_REGISTER: u16 = 0x4000;
pub const FIRMWARE_VERSION_REGISTER: u16 = 0x8000;

/// Marks a response as a device exception when OR-ed into the function code.
pub const EXCEPTION_FLAG: u8 = 0x80;

const RELAY_FLASH_ON: u8 = 0x02;
const RELAY_IDLE: u8 = 0x00;

pub type Frame = [u8; FRAME_LEN];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FunctionCode {
    ReadCoils = 0x01,
    ReadHoldingRegisters = 0x03,
    /// Write-single-coil code, with the board's own payload layout.
    WriteRelay = 0x05,
}

impl FunctionCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// What a relay write asks the board to do, derived from a signed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCommand {
    /// Switch on and let the board switch off after `deciseconds`.
    TurnOnTimed { deciseconds: u16 },
    TurnOnPermanent,
    TurnOff,
}

impl RelayCommand {
    /// `interval > 0` is a timed flash, `0` is permanently on, `< 0` is off.
    ///
    /// Positive intervals are masked to 16 bits, so 65536 deciseconds wraps to 0.
    pub fn from_interval(interval: i32) -> Self {
        match interval {
            i if i > 0 => RelayCommand::TurnOnTimed {
                deciseconds: (i & 0xFFFF) as u16,
            },
            0 => RelayCommand::TurnOnPermanent,
            _ => RelayCommand::TurnOff,
        }
    }

    /// `(relay_command, interval_hi, interval_lo)` as they appear on the wire.
    pub fn wire_bytes(self) -> (u8, u8, u8) {
        match self {
            RelayCommand::TurnOnTimed { deciseconds } => {
                let [hi, lo] = deciseconds.to_be_bytes();
                (RELAY_FLASH_ON, hi, lo)
            }
            RelayCommand::TurnOnPermanent => (RELAY_IDLE, 0xFF, 0x00),
            RelayCommand::TurnOff => (RELAY_IDLE, 0x00, 0x00),
        }
    }
}

/// Converts a user-facing duration in seconds to the wire unit, truncating toward zero.
///
/// `None` when the value is not finite or its decisecond count does not fit an `i32`.
pub fn seconds_to_deciseconds(seconds: f64) -> Option<i32> {
    let deciseconds = (seconds * 10.0).trunc();
    if deciseconds.is_finite() && deciseconds >= f64::from(i32::MIN) && deciseconds <= f64::from(i32::MAX) {
        Some(deciseconds as i32)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub transaction_id: u16,
    pub protocol_id: u16,
    pub unit_id: u8,
    pub function_code: u8,
    pub payload: [u8; 4],
}

impl Request {
    pub fn new(function_code: u8, payload: [u8; 4]) -> Self {
        Self {
            transaction_id: TRANSACTION_ID,
            protocol_id: PROTOCOL_ID,
            unit_id: UNIT_ID,
            function_code,
            payload,
        }
    }

    pub fn encode(&self) -> Frame {
        let mut frame = [0u8; FRAME_LEN];
        let mut buf = &mut frame[..];
        buf.put_u16(self.transaction_id);
        buf.put_u16(self.protocol_id);
        buf.put_u16(HEADER_LENGTH);
        buf.put_u8(self.unit_id);
        buf.put_u8(self.function_code);
        buf.put_slice(&self.payload);
        frame
    }
}

pub fn build_relay_command(relay_address: u8, interval: i32) -> Frame {
    let (relay_command, interval_hi, interval_lo) = RelayCommand::from_interval(interval).wire_bytes();
    Request::new(
        FunctionCode::WriteRelay.code(),
        [relay_command, relay_address, interval_hi, interval_lo],
    )
    .encode()
}

/// Single-register read; quantity is always 1.
pub fn build_register_read(function_code: u8, start_address: u16) -> Frame {
    let [start_hi, start_lo] = start_address.to_be_bytes();
    Request::new(function_code, [start_hi, start_lo, 0x00, 0x01]).encode()
}

pub fn build_coil_read(function_code: u8, start_channel: u16, quantity: u16) -> Frame {
    let [start_hi, start_lo] = start_channel.to_be_bytes();
    let [qty_hi, qty_lo] = quantity.to_be_bytes();
    Request::new(function_code, [start_hi, start_lo, qty_hi, qty_lo]).encode()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: [u8; 7] = [0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01];

    #[test]
    fn test_relay_command_timed() {
        let frame = build_relay_command(3, 10);
        assert_eq!(frame[..7], HEADER);
        assert_eq!(frame[7..], [0x05, 0x02, 0x03, 0x00, 0x0A]);
    }

    #[test]
    fn test_relay_command_permanent_on() {
        let frame = build_relay_command(3, 0);
        assert_eq!(frame[7..], [0x05, 0x00, 0x03, 0xFF, 0x00]);
    }

    #[test]
    fn test_relay_command_off() {
        assert_eq!(build_relay_command(3, -1)[7..], [0x05, 0x00, 0x03, 0x00, 0x00]);
        assert_eq!(build_relay_command(3, i32::MIN)[7..], [0x05, 0x00, 0x03, 0x00, 0x00]);
    }

    #[test]
    fn test_interval_split_is_big_endian() {
        for interval in [1, 0xFF, 0x100, 600, 6000, 0xFFFF] {
            let frame = build_relay_command(0, interval);
            assert_eq!(frame[8], 0x02);
            assert_eq!(frame[10], (interval >> 8) as u8);
            assert_eq!(frame[11], (interval & 0xFF) as u8);
        }
    }

    #[test]
    fn test_interval_above_16_bits_wraps() {
        assert_eq!(
            RelayCommand::from_interval(0x1_0000),
            RelayCommand::TurnOnTimed { deciseconds: 0 }
        );
        assert_eq!(
            RelayCommand::from_interval(0x1_0005),
            RelayCommand::TurnOnTimed { deciseconds: 5 }
        );
        assert_eq!(build_relay_command(1, 0x1_0005)[8..], [0x02, 0x01, 0x00, 0x05]);
    }

    #[test]
    fn test_relay_command_variants() {
        assert_eq!(RelayCommand::from_interval(1), RelayCommand::TurnOnTimed { deciseconds: 1 });
        assert_eq!(RelayCommand::from_interval(0), RelayCommand::TurnOnPermanent);
        assert_eq!(RelayCommand::from_interval(-5), RelayCommand::TurnOff);
    }

    #[test]
    fn test_register_reads() {
        let address = build_register_read(FunctionCode::ReadHoldingRegisters.code(), DEVICE_ADDRESS_REGISTER);
        assert_eq!(
            address,
            [0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x40, 0x00, 0x00, 0x01]
        );

        let version = build_register_read(FunctionCode::ReadHoldingRegisters.code(), FIRMWARE_VERSION_REGISTER);
        assert_eq!(version[8..], [0x80, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_coil_read() {
        let frame = build_coil_read(FunctionCode::ReadCoils.code(), 0, 8);
        assert_eq!(
            frame,
            [0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x01, 0x00, 0x00, 0x00, 0x08]
        );

        let frame = build_coil_read(FunctionCode::ReadCoils.code(), 0x0102, 0x0020);
        assert_eq!(frame[8..], [0x01, 0x02, 0x00, 0x20]);
    }

    #[test]
    fn test_seconds_to_deciseconds() {
        assert_eq!(seconds_to_deciseconds(5.0), Some(50));
        assert_eq!(seconds_to_deciseconds(0.25), Some(2));
        assert_eq!(seconds_to_deciseconds(0.0), Some(0));
        assert_eq!(seconds_to_deciseconds(-1.0), Some(-10));
        assert_eq!(seconds_to_deciseconds(600.0), Some(6000));
    }

    #[test]
    fn test_seconds_to_deciseconds_rejects_unrepresentable_values() {
        assert_eq!(seconds_to_deciseconds(f64::NAN), None);
        assert_eq!(seconds_to_deciseconds(f64::INFINITY), None);
        assert_eq!(seconds_to_deciseconds(f64::NEG_INFINITY), None);
        assert_eq!(seconds_to_deciseconds(1e10), None);
        assert_eq!(seconds_to_deciseconds(-1e10), None);
    }
}
