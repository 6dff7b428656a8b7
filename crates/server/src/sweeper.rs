use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use printquote_core::session::{RequesterLocks, SessionStore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Purges idle sessions every `interval` and forgets requester locks that
/// nobody holds. Runs until the returned task is aborted.
pub fn spawn(
    sessions: Arc<dyn SessionStore>,
    locks: RequesterLocks,
    interval: Duration,
) -> JoinHandle<()> {
    info!(
        event_name = "system.sweeper.start",
        correlation_id = "bootstrap",
        interval_secs = interval.as_secs(),
        "session sweeper started"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sweep_once(sessions.as_ref(), &locks).await;
        }
    })
}

pub async fn sweep_once(sessions: &dyn SessionStore, locks: &RequesterLocks) -> usize {
    match sessions.purge_expired(Utc::now()).await {
        Ok(purged) => {
            let released = locks.prune();
            if purged > 0 || released > 0 {
                info!(
                    event_name = "session.sweep",
                    correlation_id = "sweeper",
                    purged,
                    released_locks = released,
                    "expired sessions purged"
                );
            } else {
                debug!(
                    event_name = "session.sweep",
                    correlation_id = "sweeper",
                    "nothing to purge"
                );
            }
            purged
        }
        Err(error) => {
            warn!(
                event_name = "session.sweep_failed",
                correlation_id = "sweeper",
                error = %error,
                "session sweep failed"
            );
            0
        }
    }
}
