use std::future::Future;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

/// Why [`poll_until`] gave up.
#[derive(Debug)]
pub enum PollError<E> {
    /// The probe itself failed.
    Probe(E),
    /// The probe never reported readiness within the timeout.
    TimedOut { waited: Duration, attempts: usize },
}

/// Calls `probe` until it yields `Some`, sleeping `interval` between calls.
///
/// The total wait is bounded by `timeout`; the last sleep is shortened so the
/// deadline is not overshot by more than one probe. Dropping the returned
/// future cancels the wait.
pub async fn poll_until<T, E, Fut, F>(
    mut probe: F,
    interval: Duration,
    timeout: Duration,
) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let started = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;
        match probe().await {
            Ok(Some(ready)) => return Ok(ready),
            Ok(None) => {}
            Err(e) => return Err(PollError::Probe(e)),
        }

        let waited = started.elapsed();
        if waited >= timeout {
            return Err(PollError::TimedOut { waited, attempts });
        }

        let delay = interval.min(timeout - waited);
        debug!("Not ready after attempt {attempts}, checking again in {delay:?}");
        sleep(delay).await;
    }
}
