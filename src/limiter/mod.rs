//! Per-client token bucket rate limiting.
//!
//! Every client address owns a bucket that starts full (`burst` tokens) and
//! refills continuously at `rps` tokens per second. A background sweep evicts
//! buckets that have not been seen for a while so the map stays bounded under
//! traffic from many distinct clients.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::config::LimiterConfig;

/// How often the background sweep runs
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Buckets idle for longer than this are evicted by the sweep
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(3 * 60);

#[derive(Debug, Clone)]
struct ClientBucket {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

impl ClientBucket {
    fn full(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
            last_seen: now,
        }
    }

    fn refill(&mut self, rate: f64, capacity: f64, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(capacity);
        self.last_refill = now;
    }

    fn try_take(&mut self) -> bool {
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Shared map of client address -> bucket.
///
/// All mutations (create, refill + consume, evict) happen under one mutex that
/// is held only for the single map operation and never across an `.await`.
#[derive(Debug)]
pub struct TokenBucketRegistry {
    config: LimiterConfig,
    clients: Mutex<HashMap<IpAddr, ClientBucket>>,
}

impl TokenBucketRegistry {
    pub fn new(config: LimiterConfig) -> Self {
        Self {
            config,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Take one token for `client`, returning whether the request may proceed
    pub fn allow(&self, client: IpAddr) -> bool {
        self.allow_at(client, Instant::now())
    }

    pub fn allow_at(&self, client: IpAddr, now: Instant) -> bool {
        if !self.config.enabled {
            return true;
        }

        let capacity = f64::from(self.config.burst);
        let mut clients = self.lock();
        let bucket = clients
            .entry(client)
            .or_insert_with(|| ClientBucket::full(capacity, now));

        bucket.refill(self.config.rps, capacity, now);
        let allowed = bucket.try_take();
        bucket.last_seen = now;

        allowed
    }

    /// Remove buckets last seen more than `idle` before `now`; returns how many were dropped
    pub fn sweep_at(&self, now: Instant, idle: Duration) -> usize {
        let mut clients = self.lock();
        let before = clients.len();
        clients.retain(|_, bucket| now.saturating_duration_since(bucket.last_seen) <= idle);
        before - clients.len()
    }

    /// Number of tracked clients
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start the once-a-minute eviction task. It stops on its own once the
    /// registry has been dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        self.spawn_sweeper_with(SWEEP_INTERVAL, IDLE_TIMEOUT)
    }

    pub fn spawn_sweeper_with(self: &Arc<Self>, every: Duration, idle: Duration) -> JoinHandle<()> {
        let registry = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let Some(registry) = registry.upgrade() else {
                    break;
                };

                let removed = registry.sweep_at(Instant::now(), idle);
                if removed > 0 {
                    debug!("Rate limiter evicted {} idle client(s)", removed);
                }
            }
        })
    }

    // A panic while holding the lock cannot leave a bucket half-written, so a
    // poisoned map is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<IpAddr, ClientBucket>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn config(rps: f64, burst: u32) -> LimiterConfig {
        LimiterConfig {
            enabled: true,
            rps,
            burst,
        }
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn burst_is_allowed_then_rejected() {
        let registry = TokenBucketRegistry::new(config(2.0, 4));
        let now = Instant::now();

        for _ in 0..4 {
            assert!(registry.allow_at(ip(1), now));
        }
        assert!(!registry.allow_at(ip(1), now));
    }

    #[test]
    fn clients_have_independent_buckets() {
        let registry = TokenBucketRegistry::new(config(1.0, 1));
        let now = Instant::now();

        assert!(registry.allow_at(ip(1), now));
        assert!(!registry.allow_at(ip(1), now));
        assert!(registry.allow_at(ip(2), now));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn tokens_refill_with_elapsed_time() {
        let registry = TokenBucketRegistry::new(config(2.0, 2));
        let start = Instant::now();

        assert!(registry.allow_at(ip(1), start));
        assert!(registry.allow_at(ip(1), start));
        assert!(!registry.allow_at(ip(1), start));

        // Half a second at 2 rps buys exactly one token
        let later = start + Duration::from_millis(500);
        assert!(registry.allow_at(ip(1), later));
        assert!(!registry.allow_at(ip(1), later));
    }

    #[test]
    fn refill_is_capped_at_burst() {
        let registry = TokenBucketRegistry::new(config(100.0, 3));
        let start = Instant::now();
        assert!(registry.allow_at(ip(1), start));

        let later = start + Duration::from_secs(60);
        for _ in 0..3 {
            assert!(registry.allow_at(ip(1), later));
        }
        assert!(!registry.allow_at(ip(1), later));
    }

    #[test]
    fn sustained_rate_below_limit_is_never_rejected() {
        let registry = TokenBucketRegistry::new(config(2.0, 4));
        let mut now = Instant::now();

        for _ in 0..200 {
            assert!(registry.allow_at(ip(1), now));
            now += Duration::from_millis(550);
        }
    }

    #[test]
    fn disabled_limiter_always_allows() {
        let registry = TokenBucketRegistry::new(LimiterConfig {
            enabled: false,
            rps: 0.0,
            burst: 0,
        });
        let now = Instant::now();

        for _ in 0..50 {
            assert!(registry.allow_at(ip(1), now));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn sweep_evicts_idle_clients_and_they_start_full() {
        let registry = TokenBucketRegistry::new(config(0.0001, 2));
        let start = Instant::now();

        assert!(registry.allow_at(ip(1), start));
        assert!(registry.allow_at(ip(1), start));
        assert!(!registry.allow_at(ip(1), start));

        let recent = start + Duration::from_secs(150);
        assert!(registry.allow_at(ip(2), recent));

        let removed = registry.sweep_at(start + IDLE_TIMEOUT + Duration::from_secs(1), IDLE_TIMEOUT);
        assert_eq!(removed, 1);
        assert_eq!(registry.len(), 1);

        let after = start + Duration::from_secs(200);
        assert!(registry.allow_at(ip(1), after));
        assert!(registry.allow_at(ip(1), after));
        assert!(!registry.allow_at(ip(1), after));
    }

    #[test]
    fn concurrent_requests_never_overspend_a_bucket() {
        let registry = TokenBucketRegistry::new(config(0.0001, 5));
        let now = Instant::now();
        let allowed = std::sync::atomic::AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..16 {
                scope.spawn(|| {
                    for _ in 0..4 {
                        if registry.allow_at(ip(9), now) {
                            allowed.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        assert_eq!(allowed.into_inner(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn background_sweep_runs_every_minute() {
        let registry = Arc::new(TokenBucketRegistry::new(config(1.0, 1)));
        let _sweeper = registry.spawn_sweeper();

        assert!(registry.allow(ip(1)));
        assert_eq!(registry.len(), 1);

        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(registry.len(), 1);

        tokio::time::sleep(Duration::from_secs(91)).await;
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_exits_when_registry_is_dropped() {
        let registry = Arc::new(TokenBucketRegistry::new(config(1.0, 1)));
        let sweeper = registry.spawn_sweeper();
        drop(registry);

        tokio::time::timeout(Duration::from_secs(120), sweeper)
            .await
            .expect("sweeper should stop")
            .expect("sweeper should not panic");
    }
}
