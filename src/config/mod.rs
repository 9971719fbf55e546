pub mod settings;

pub use settings::{
    Config,
    DEFAULT_CHANNELS,
    DEFAULT_CHANNEL_INTERVAL_SECONDS,
    DEFAULT_DEVICE_NAME,
    DEFAULT_HOST,
    MAX_CHANNELS,
    MAX_CHANNEL_INTERVAL_SECONDS,
};
