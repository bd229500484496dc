use std::sync::Arc;
use std::time::Duration;

use leaky_bucket::RateLimiter;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

use crate::config::Config;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Enforces a minimum delay between destructive requests.
///
/// [`Pacer::wait`] returns only once at least `interval` has elapsed since the
/// previous `wait` returned. The first call returns immediately. Clones share
/// the same schedule.
#[derive(Clone)]
pub struct Pacer {
    limiter: Arc<RateLimiter>,
    last_release: Arc<Mutex<Option<Instant>>>,
    interval: Duration,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        let interval = interval.max(MIN_INTERVAL);
        Self {
            limiter: Arc::new(
                RateLimiter::builder()
                    .max(1)
                    .initial(1)
                    .refill(1)
                    .interval(interval)
                    .fair(true)
                    .build(),
            ),
            last_release: Arc::new(Mutex::new(None)),
            interval,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.pace_interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn wait(&self) {
        let mut last_release = self.last_release.lock().await;

        self.limiter.acquire_one().await;

        // The limiter refills on a fixed grid; a token saved up while idle
        // must not shorten the gap to the previous release.
        if let Some(last) = *last_release {
            let earliest = last + self.interval;
            if Instant::now() < earliest {
                tokio::time::sleep_until(earliest).await;
            }
        }

        let now = Instant::now();
        trace!(interval_ms = self.interval.as_millis() as u64, "pacer released.");
        *last_release = Some(now);
    }
}
