//! Time-driven purge of expired games.
//!
//! A sweep deletes every game whose expiration instant has passed. The
//! scheduler runs one sweep at startup to catch games that expired while
//! the process was down, then aligns to UTC midnight and sweeps once per
//! day, recomputing the wait each cycle so the cadence stays predictable
//! across restarts. The loop is self-healing: sweep failures are logged
//! and retried after a fixed backoff, never fatal.

use std::time::Duration;

use time::OffsetDateTime;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::{error::ServiceError, state::SharedState};

/// Wait before retrying after a failed sweep.
const RETRY_BACKOFF: Duration = Duration::from_secs(3600);
/// Fallback wait when the next midnight cannot be computed.
const ONE_DAY: Duration = Duration::from_secs(86_400);

/// Delete every game whose expiration instant is set and `<= now`.
///
/// Each deletion is attempted independently: one failure is logged and
/// recorded without aborting the sweep for the remaining games. Returns
/// the number of games purged. Safe to invoke manually; a sweep with
/// nothing to do is a no-op.
pub async fn run_purge_sweep(
    state: &SharedState,
    now: OffsetDateTime,
) -> Result<usize, ServiceError> {
    let store = state.store().await?;

    let expired = store.expired_games(now).await?;
    if expired.is_empty() {
        debug!("no expired games found");
        return Ok(0);
    }

    info!(count = expired.len(), "found expired games");

    let mut purged = 0usize;
    for game in expired {
        match store.delete_game(game.code.clone()).await {
            Ok(true) => {
                purged += 1;
                info!(
                    code = %game.code,
                    created_at = %game.created_at,
                    "auto-purged expired game"
                );
            }
            Ok(false) => {
                debug!(code = %game.code, "expired game already gone");
            }
            Err(err) => {
                error!(code = %game.code, error = %err, "failed to purge expired game");
            }
        }
    }

    info!(purged, "purge sweep completed");
    Ok(purged)
}

/// Background scheduler driving daily sweeps for the life of the process.
///
/// Runs until the owning task is dropped at shutdown; the only long-lived
/// suspension is the wait for the next cycle, which is safely interruptible.
pub async fn run_scheduler(state: SharedState) {
    info!("purge scheduler started; running startup sweep");
    sweep_now(&state).await;

    loop {
        let now = OffsetDateTime::now_utc();
        let wait = until_next_midnight(now);
        info!(
            hours = wait.as_secs_f64() / 3600.0,
            "next purge sweep scheduled at midnight UTC"
        );
        sleep(wait).await;

        sweep_now(&state).await;
    }
}

/// Run one sweep against the current clock, logging instead of propagating
/// failures and backing off before the scheduler continues.
async fn sweep_now(state: &SharedState) {
    match run_purge_sweep(state, OffsetDateTime::now_utc()).await {
        Ok(purged) => {
            if purged > 0 {
                info!(purged, "scheduled purge removed expired games");
            }
        }
        Err(err) => {
            warn!(error = %err, "purge sweep failed; retrying after backoff");
            sleep(RETRY_BACKOFF).await;
        }
    }
}

/// Seconds until the next UTC midnight, computed fresh for each cycle.
fn until_next_midnight(now: OffsetDateTime) -> Duration {
    let Some(tomorrow) = now.date().next_day() else {
        // Calendar overflow; fall back to a plain daily interval.
        return ONE_DAY;
    };
    let midnight = tomorrow.midnight().assume_utc();
    (midnight - now).try_into().unwrap_or(ONE_DAY)
}
