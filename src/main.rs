use anyhow::Result;
use clap::{CommandFactory, FromArgMatches};
use log::{debug, error};

use waveshare_relay::cli::{handle_command, Cli};
use waveshare_relay::output::formatter_for;
use waveshare_relay::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let config = Config::from_matches(&matches)?;
    debug!(
        "🖥️  {} v{} -> {}:{} ({} channels)",
        config.device_name,
        waveshare_relay::VERSION,
        config.host,
        config.port,
        config.channels
    );

    let formatter = formatter_for(&cli.format);
    if let Err(e) = handle_command(&cli.command, &config, formatter.as_ref()).await {
        error!("❌ {:#}", e);
        return Err(e);
    }

    Ok(())
}
