// Ctrl+C signal handler.
//
// Uses tokio::select! to wait for either job cancellation or Ctrl+C signal.

use dcrm_rs::JobCancellationToken;
use tokio::task::JoinHandle;
use tokio::{select, signal};
use tracing::{debug, warn};

/// Cancel `cancellation_token` on Ctrl+C.
///
/// The bridge's shutdown token is passed here, so the running job stops at
/// its next batch boundary and reports what it already deleted.
pub fn spawn_ctrl_c_handler(cancellation_token: JobCancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        select! {
            _ = cancellation_token.cancelled() => {
                debug!("cancellation_token canceled.")
            }
            _ = signal::ctrl_c() => {
                warn!("ctrl-c received, stopping after the current batch.");
                cancellation_token.cancel();
            }
        }
    })
}
