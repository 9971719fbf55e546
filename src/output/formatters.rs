use chrono::Utc;
use serde_json::Value;

use crate::devices::relay_board::{DeviceInfo, MANUFACTURER, MODEL};

pub trait StatusFormatter: Send + Sync {
    /// `start_channel` is the 0-based address of `status[0]`; output numbers channels from 1.
    fn format_status(&self, start_channel: u16, status: &[bool]) -> String;
    fn format_device_info(&self, device_name: &str, info: &DeviceInfo) -> String;
    fn format_header(&self) -> String;
}

/// Picks a formatter by name, falling back to the console one.
pub fn formatter_for(name: &str) -> Box<dyn StatusFormatter> {
    match name {
        "json" => Box::new(JsonFormatter),
        _ => Box::new(ConsoleFormatter),
    }
}

fn on_off(state: bool) -> &'static str {
    if state {
        "ON"
    } else {
        "OFF"
    }
}

pub struct ConsoleFormatter;

impl StatusFormatter for ConsoleFormatter {
    fn format_status(&self, start_channel: u16, status: &[bool]) -> String {
        let mut output = String::from("🔹 Relay Status:\n");

        for (offset, state) in status.iter().enumerate() {
            let channel = usize::from(start_channel) + offset + 1;
            output.push_str(&format!("  Channel {:>2}: {}\n", channel, on_off(*state)));
        }
        output
    }

    fn format_device_info(&self, device_name: &str, info: &DeviceInfo) -> String {
        let address = info
            .address
            .map(|a| a.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let version = info.firmware_version.as_deref().unwrap_or("unknown");

        format!(
            "📟 {}\n  Manufacturer: {}\n  Model: {}\n  Device address: {}\n  Firmware: {}\n",
            device_name, MANUFACTURER, MODEL, address, version
        )
    }

    fn format_header(&self) -> String {
        format!("🚀 Waveshare Relay - {}\n", Utc::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

pub struct JsonFormatter;

impl StatusFormatter for JsonFormatter {
    fn format_status(&self, start_channel: u16, status: &[bool]) -> String {
        let channels: Vec<Value> = status
            .iter()
            .enumerate()
            .map(|(offset, state)| {
                serde_json::json!({
                    "channel": usize::from(start_channel) + offset + 1,
                    "on": state,
                })
            })
            .collect();

        let result = serde_json::json!({
            "timestamp": Utc::now().timestamp(),
            "channels": channels,
        });

        serde_json::to_string_pretty(&result).unwrap_or_default()
    }

    fn format_device_info(&self, device_name: &str, info: &DeviceInfo) -> String {
        let result = serde_json::json!({
            "name": device_name,
            "manufacturer": MANUFACTURER,
            "model": MODEL,
            "address": info.address,
            "firmware_version": info.firmware_version,
        });

        serde_json::to_string_pretty(&result).unwrap_or_default()
    }

    fn format_header(&self) -> String {
        String::new() // JSON doesn't need headers
    }
}
