use anyhow::{bail, Context, Result};
use log::info;
use std::io::{self, BufRead, Write};
use std::time::Duration;

use super::Commands;
use crate::config::Config;
use crate::devices::RelayBoard;
use crate::modbus::protocol::seconds_to_deciseconds;
use crate::modbus::RelayTransport;
use crate::output::StatusFormatter;
use crate::services::StatusPoller;

pub async fn handle_command(
    command: &Commands,
    config: &Config,
    formatter: &dyn StatusFormatter,
) -> Result<()> {
    let board = RelayBoard::from_config(config);

    match command {
        Commands::Status { channel } => {
            let (start, count) = match channel {
                Some(channel) => (u16::from(config.relay_address(*channel)?), 1),
                None => (0, config.channels),
            };
            let status = board.read_relay_status(start, count).await?;
            print!("{}", formatter.format_header());
            println!("{}", formatter.format_status(start, &status));
        }

        Commands::On { channel, seconds, watch } => {
            let relay_address = config.relay_address(*channel)?;
            let interval = match seconds {
                Some(seconds) => seconds_to_deciseconds(*seconds)
                    .with_context(|| format!("Invalid interval: {}", seconds))?,
                None => i32::from(config.on_interval(relay_address)),
            };

            info!("🔛 Channel {} with interval {} ds", channel, interval);
            board.set_relay(relay_address, interval).await?;
            println!("✅ Command sent to channel {}", channel);

            if *watch && interval > 0 {
                let poller = StatusPoller::new(board, config.channels);
                let polls = poller.watch_channel(relay_address, config.watch_interval()).await;
                println!("⏹️  Channel {} switched off after {} polls", channel, polls);
            }
        }

        Commands::Off { channel } => {
            let relay_address = config.relay_address(*channel)?;
            board.turn_off(relay_address).await?;
            println!("✅ Channel {} off", channel);
        }

        Commands::Info => {
            let info = board.read_device_info().await;
            println!("{}", formatter.format_device_info(&config.device_name, &info));
        }

        Commands::Probe => {
            board
                .probe()
                .await
                .with_context(|| format!("cannot connect to {}:{}", config.host, config.port))?;
            println!("✅ {}:{} is reachable", config.host, config.port);
        }

        Commands::Poll { interval } => {
            let period = interval
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.scan_interval());
            if period.is_zero() {
                bail!("poll interval must be greater than 0");
            }

            let mut poller = StatusPoller::new(board, config.channels);
            let stats = poller
                .run(period, |result| match result {
                    Ok(snapshot) => println!("{}", formatter.format_status(0, &snapshot.channels)),
                    Err(e) => println!("💥 Poll failed: {}", e),
                })
                .await;
            println!(
                "📈 Success rate: {:.1}% ({}/{})",
                stats.success_rate(),
                stats.successful_reads,
                stats.total()
            );
        }

        Commands::Menu => {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            run_menu(&board, &mut stdin.lock(), &mut stdout).await?;
        }

        Commands::InitConfig { path } => {
            config
                .save_to_file(path)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("✅ Wrote configuration to {}", path.display());
        }
    }

    Ok(())
}

fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, message: &str) -> Result<Option<String>> {
    write!(output, "{}", message)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn parse_channel(value: &str) -> Option<u8> {
    match value.parse::<u8>() {
        Ok(channel) if channel > 0 => Some(channel - 1),
        _ => None,
    }
}

/// Interactive loop: read one channel, send a timed/permanent/off command, or exit.
/// Ends on "3" or end of input.
pub async fn run_menu<T, R, W>(board: &RelayBoard<T>, input: &mut R, output: &mut W) -> Result<()>
where
    T: RelayTransport,
    R: BufRead,
    W: Write,
{
    loop {
        writeln!(output, "\nMain Menu:")?;
        writeln!(output, "1. Read channel status")?;
        writeln!(output, "2. Send command to channel")?;
        writeln!(output, "3. Exit")?;

        let Some(choice) = prompt(input, output, "Enter your choice: ")? else {
            return Ok(());
        };

        match choice.as_str() {
            "1" => {
                let Some(value) = prompt(input, output, "Enter channel number (1-based index): ")? else {
                    return Ok(());
                };
                let Some(relay_address) = parse_channel(&value) else {
                    writeln!(output, "Invalid channel: {}", value)?;
                    continue;
                };

                match board.read_channel(relay_address).await {
                    Ok(state) => writeln!(output, "Status of channel {}: {}", value, u8::from(state))?,
                    Err(e) => writeln!(output, "Failed to read relay status: {}", e)?,
                }
            }
            "2" => {
                let Some(value) = prompt(input, output, "Enter channel number (1-based index): ")? else {
                    return Ok(());
                };
                let Some(relay_address) = parse_channel(&value) else {
                    writeln!(output, "Invalid channel: {}", value)?;
                    continue;
                };
                let Some(text) = prompt(
                    input,
                    output,
                    "Enter interval for the command in seconds [-1 for permanent off, 0 for permanent on]: ",
                )?
                else {
                    return Ok(());
                };
                let Some((seconds, interval)) = text
                    .parse::<f64>()
                    .ok()
                    .and_then(|seconds| seconds_to_deciseconds(seconds).map(|interval| (seconds, interval)))
                else {
                    writeln!(output, "Invalid interval: {}", text)?;
                    continue;
                };

                match board.set_relay(relay_address, interval).await {
                    Ok(()) => writeln!(
                        output,
                        "Command sent to channel {} with interval {} seconds.",
                        value, seconds
                    )?,
                    Err(e) => writeln!(output, "Failed to send command: {}", e)?,
                }
            }
            "3" => {
                writeln!(output, "Exiting program.")?;
                return Ok(());
            }
            _ => writeln!(output, "Invalid choice. Please try again.")?,
        }
    }
}
