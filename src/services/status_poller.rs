use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use std::future::Future;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};

use crate::devices::RelayBoard;
use crate::modbus::{RelayTransport, TcpExchange};
use crate::utils::error::ProtocolError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub timestamp: DateTime<Utc>,
    pub channels: Vec<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollStats {
    pub successful_reads: u32,
    pub failed_reads: u32,
}

impl PollStats {
    pub fn total(&self) -> u32 {
        self.successful_reads + self.failed_reads
    }

    pub fn success_rate(&self) -> f32 {
        if self.total() == 0 {
            return 0.0;
        }
        (self.successful_reads as f32 / self.total() as f32) * 100.0
    }
}

/// Periodic status reads for all channels of one board.
///
/// Polls run strictly one after another, so the poller never has two
/// exchanges in flight against its board.
pub struct StatusPoller<T = TcpExchange> {
    board: RelayBoard<T>,
    channels: u16,
    stats: PollStats,
}

impl<T: RelayTransport> StatusPoller<T> {
    pub fn new(board: RelayBoard<T>, channels: u16) -> Self {
        Self {
            board,
            channels,
            stats: PollStats::default(),
        }
    }

    pub fn board(&self) -> &RelayBoard<T> {
        &self.board
    }

    pub fn stats(&self) -> PollStats {
        self.stats
    }

    pub async fn poll_once(&mut self) -> Result<StatusSnapshot, ProtocolError> {
        match self.board.read_relay_status(0, self.channels).await {
            Ok(channels) => {
                self.stats.successful_reads += 1;
                Ok(StatusSnapshot {
                    timestamp: Utc::now(),
                    channels,
                })
            }
            Err(e) => {
                self.stats.failed_reads += 1;
                Err(e)
            }
        }
    }

    /// Polls every `period` until ctrl-c.
    pub async fn run<F>(&mut self, period: Duration, on_update: F) -> PollStats
    where
        F: FnMut(&Result<StatusSnapshot, ProtocolError>),
    {
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("❌ Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        };
        self.run_until(period, shutdown, on_update).await
    }

    /// Polls every `period`, the first poll immediately, until `shutdown` completes.
    pub async fn run_until<S, F>(&mut self, period: Duration, shutdown: S, mut on_update: F) -> PollStats
    where
        S: Future<Output = ()>,
        F: FnMut(&Result<StatusSnapshot, ProtocolError>),
    {
        info!("🔄 Polling {} channels every {:?}", self.channels, period);

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("🛑 Stopping status poller");
                    break;
                }
                _ = ticker.tick() => {
                    let result = self.poll_once().await;
                    if let Err(e) = &result {
                        warn!("📵 Status poll failed: {}", e);
                    }
                    on_update(&result);
                }
            }
        }

        info!(
            "📊 Poller finished: {} ok, {} failed ({:.1}% success)",
            self.stats.successful_reads,
            self.stats.failed_reads,
            self.stats.success_rate()
        );
        self.stats
    }

    /// Re-reads `channel` every `period` until the board reports it off.
    ///
    /// Read failures are logged and the watch keeps going; drop the future
    /// to stop watching early.
    pub async fn watch_channel(&self, channel: u8, period: Duration) -> u32 {
        let mut polls = 0;
        loop {
            sleep(period).await;
            polls += 1;

            match self.board.read_channel(channel).await {
                Ok(false) => {
                    info!("Relay channel {} is off", channel);
                    return polls;
                }
                Ok(true) => {}
                Err(e) => error!("Error reading relay status for channel {}: {}", channel, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{data_response, timeout_error, ScriptedTransport};

    fn poller(responses: Vec<Result<Vec<u8>, crate::utils::error::TransportError>>, channels: u16) -> StatusPoller<ScriptedTransport> {
        StatusPoller::new(RelayBoard::with_transport(ScriptedTransport::new(responses)), channels)
    }

    #[tokio::test]
    async fn test_poll_once_counts_results() {
        let mut poller = poller(
            vec![Ok(data_response(0x01, &[0b0000_0011])), Err(timeout_error())],
            4,
        );

        let snapshot = poller.poll_once().await.unwrap();
        assert_eq!(snapshot.channels, vec![true, true, false, false]);
        assert!(poller.poll_once().await.is_err());

        assert_eq!(
            poller.stats(),
            PollStats {
                successful_reads: 1,
                failed_reads: 1,
            }
        );
        assert_eq!(poller.stats().success_rate(), 50.0);
        assert_eq!(poller.board().transport().sent()[0][8..], [0x00, 0x00, 0x00, 0x04]);
    }

    #[tokio::test]
    async fn test_run_until_stops_on_shutdown() {
        let mut poller = poller(
            vec![
                Ok(data_response(0x01, &[0x01])),
                Ok(data_response(0x01, &[0x00])),
                Ok(data_response(0x01, &[0x00])),
            ],
            8,
        );
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let mut updates = Vec::new();
        let mut tx = Some(tx);

        let stats = poller
            .run_until(
                Duration::from_millis(50),
                async {
                    let _ = rx.await;
                },
                |result| {
                    updates.push(result.as_ref().map(|s| s.channels[0]).ok());
                    if updates.len() == 2 {
                        if let Some(tx) = tx.take() {
                            let _ = tx.send(());
                        }
                    }
                },
            )
            .await;

        assert_eq!(updates, vec![Some(true), Some(false)]);
        assert_eq!(stats.successful_reads, 2);
    }

    #[tokio::test]
    async fn test_watch_channel_until_off() {
        let poller = poller(
            vec![
                Ok(data_response(0x01, &[0x01])),
                Err(timeout_error()),
                Ok(data_response(0x01, &[0x00])),
            ],
            8,
        );

        let polls = poller.watch_channel(2, Duration::from_millis(1)).await;

        assert_eq!(polls, 3);
        assert_eq!(poller.board().transport().sent()[0][8..], [0x00, 0x02, 0x00, 0x01]);
    }

    #[test]
    fn test_empty_stats() {
        assert_eq!(PollStats::default().success_rate(), 0.0);
    }
}
