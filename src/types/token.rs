/// A cancellation token used to stop a running deletion job.
///
/// This is a type alias for [`tokio_util::sync::CancellationToken`]. The job
/// checks it between channels and between deletion batches; call
/// [`cancel()`](tokio_util::sync::CancellationToken::cancel) to request a
/// graceful stop (e.g., in a Ctrl+C handler).
pub type JobCancellationToken = tokio_util::sync::CancellationToken;

/// Create a new [`JobCancellationToken`].
///
/// # Example
///
/// ```
/// use dcrm_rs::create_job_cancellation_token;
///
/// let token = create_job_cancellation_token();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
pub fn create_job_cancellation_token() -> JobCancellationToken {
    tokio_util::sync::CancellationToken::new()
}
