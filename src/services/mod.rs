pub mod status_poller;

pub use status_poller::{PollStats, StatusPoller, StatusSnapshot};
