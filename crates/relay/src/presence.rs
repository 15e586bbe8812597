//! Typing indicator kept alive while a reply is being produced.

use relaycord_core::channel::ChannelClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Smallest accepted interval; tokio intervals must be non-zero.
const MIN_INTERVAL: Duration = Duration::from_millis(100);

pub struct PresenceKeeper;

impl PresenceKeeper {
    /// Send a typing signal to `channel_id` now and then every `interval`
    /// until the returned guard is stopped or dropped.
    pub fn start(
        client: Arc<dyn ChannelClient>,
        channel_id: impl Into<String>,
        interval: Duration,
    ) -> PresenceGuard {
        let channel_id = channel_id.into();
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = client.send_typing(&channel_id).await {
                            warn!(channel_id = %channel_id, error = %e, "Failed to send typing indicator");
                        }
                    }
                }
            }
            debug!(channel_id = %channel_id, "Typing indicator stopped");
        });

        PresenceGuard {
            token,
            handle: Some(handle),
        }
    }
}

/// Owns the typing task. Dropping it cancels the task; `stop` also waits for
/// the task to finish.
pub struct PresenceGuard {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PresenceGuard {
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Typing indicator task failed");
            }
        }
    }
}

impl Drop for PresenceGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
