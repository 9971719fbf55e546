pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::modbus::protocol::seconds_to_deciseconds;

pub use commands::{handle_command, run_menu};

/// Accepts an interval in seconds that converts to a representable decisecond count.
pub fn parse_interval_seconds(value: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .ok()
        .filter(|seconds| seconds_to_deciseconds(*seconds).is_some())
        .ok_or_else(|| format!("Invalid interval: {}", value))
}

#[derive(Debug, Parser)]
#[command(name = "waveshare-relay", version, about = "CLI for Waveshare Modbus POE ETH relay boards")]
pub struct Cli {
    /// IP address or hostname of the relay board
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Modbus TCP port of the relay board
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Number of relay channels on the board
    #[arg(long, global = true)]
    pub channels: Option<u16>,

    /// Output format: console or json
    #[arg(long, global = true, default_value = "console")]
    pub format: String,

    /// Log protocol frames
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Read the status of all channels, or of one channel
    Status {
        /// 1-based channel number
        #[arg(long)]
        channel: Option<u16>,
    },
    /// Switch a channel on
    On {
        /// 1-based channel number
        channel: u16,
        /// Seconds until the board switches the channel off again; 0 keeps it on
        #[arg(long, value_parser = parse_interval_seconds)]
        seconds: Option<f64>,
        /// Keep polling the channel until the board reports it off
        #[arg(long)]
        watch: bool,
    },
    /// Switch a channel off
    Off {
        /// 1-based channel number
        channel: u16,
    },
    /// Read device address and firmware version
    Info,
    /// Check that the board accepts connections
    Probe,
    /// Poll channel status periodically until ctrl-c
    Poll {
        /// Seconds between polls (defaults to the configured scan interval)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Interactive menu
    Menu,
    /// Write a default configuration file
    InitConfig {
        path: PathBuf,
    },
}
