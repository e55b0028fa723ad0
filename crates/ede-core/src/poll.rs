use std::time::Duration;

use kanal::AsyncSender;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Periodic refresh for views whose rows change server-side.
///
/// Ticks are sent as `event` clones on the view's channel. The first tick
/// fires one interval after `start`, and dropping the poller stops it.
pub struct Poller {
    interval: Duration,
    cancel: Option<CancellationToken>,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            cancel: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.cancel.is_some()
    }

    /// Start ticking. A running poller is restarted.
    pub fn start<E>(&mut self, tx: AsyncSender<E>, event: E)
    where
        E: Clone + Send + 'static,
    {
        self.stop();

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let period = self.interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if tx.send(event.clone()).await.is_err() {
                            tracing::debug!("poll receiver closed");
                            break;
                        }
                    }
                }
            }
        });

        tracing::debug!("polling every {:?}", self.interval);
        self.cancel = Some(cancel);
    }

    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
            tracing::debug!("polling stopped");
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_after_each_interval() {
        let (tx, rx) = kanal::unbounded_async::<u8>();
        let mut poller = Poller::new(Duration::from_secs(10));
        poller.start(tx, 1);
        assert!(poller.is_running());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(rx.len(), 0);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(rx.recv().await.unwrap(), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(rx.recv().await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_ticks() {
        let (tx, rx) = kanal::unbounded_async::<u8>();
        let mut poller = Poller::new(Duration::from_secs(1));
        poller.start(tx, 1);
        poller.stop();
        assert!(!poller.is_running());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_halts_ticks() {
        let (tx, rx) = kanal::unbounded_async::<u8>();
        {
            let mut poller = Poller::new(Duration::from_secs(1));
            poller.start(tx, 1);
        }

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.is_empty());
    }
}
