use serde::Serialize;
use std::fmt;

/// A device-reported exception, looked up from the fixed code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModbusException {
    pub code: u8,
    pub name: &'static str,
    pub description: &'static str,
}

const EXCEPTION_TABLE: [ModbusException; 6] = [
    ModbusException {
        code: 0x01,
        name: "Illegal Function",
        description: "requested function code not supported",
    },
    ModbusException {
        code: 0x02,
        name: "Illegal Data Address",
        description: "requested data address incorrect",
    },
    ModbusException {
        code: 0x03,
        name: "Illegal Data Value",
        description: "requested data value/operation cannot be executed",
    },
    ModbusException {
        code: 0x04,
        name: "Server Device Error",
        description: "server device malfunction",
    },
    ModbusException {
        code: 0x05,
        name: "Acknowledge",
        description: "request received, being processed",
    },
    ModbusException {
        code: 0x06,
        name: "Device Busy",
        description: "device busy",
    },
];

pub const UNKNOWN_EXCEPTION_NAME: &str = "Unknown Exception";
pub const UNKNOWN_EXCEPTION_DESCRIPTION: &str = "unrecognized exception code";

impl ModbusException {
    /// Never fails: codes outside the table map to the "Unknown Exception" placeholder.
    pub fn from_code(code: u8) -> Self {
        EXCEPTION_TABLE
            .iter()
            .copied()
            .find(|e| e.code == code)
            .unwrap_or(ModbusException {
                code,
                name: UNKNOWN_EXCEPTION_NAME,
                description: UNKNOWN_EXCEPTION_DESCRIPTION,
            })
    }

    pub fn is_known(&self) -> bool {
        self.name != UNKNOWN_EXCEPTION_NAME
    }
}

impl fmt::Display for ModbusException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X} {}: {}", self.code, self.name, self.description)
    }
}
