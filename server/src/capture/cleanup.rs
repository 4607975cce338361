//! Capture session cleanup loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::manager::{CaptureSessionManager, SweepReport};

/// Start the background sweep of capture sessions.
///
/// Runs every `period` until `shutdown` is cancelled. The first tick is
/// consumed immediately so no sweep runs during startup.
pub fn spawn_cleanup_task(
    manager: Arc<CaptureSessionManager>,
    period: Duration,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    spawn_sweep_loop(period, shutdown, move || manager.sweep())
}

/// Each sweep runs in its own task; a panic there is logged and the loop
/// keeps going.
fn spawn_sweep_loop<F>(period: Duration, shutdown: CancellationToken, sweep: F) -> tokio::task::JoinHandle<()>
where
    F: Fn() -> SweepReport + Send + Sync + 'static,
{
    let sweep = Arc::new(sweep);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await; // consume immediate first tick

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }

            let sweep = Arc::clone(&sweep);
            match tokio::spawn(async move { (*sweep)() }).await {
                Ok(report) => {
                    tracing::trace!(
                        expired = report.expired,
                        removed = report.removed,
                        "Capture cleanup tick"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "Capture cleanup sweep failed; continuing");
                }
            }
        }

        tracing::info!("Capture cleanup loop stopped");
    })
}
