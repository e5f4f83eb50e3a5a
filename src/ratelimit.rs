//! Minimum-interval gate for the narration services (vision captioning and TTS).

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

/// One-permit-per-interval limiter for a single category.
pub type CategoryLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiCategory {
    Vision,
    Tts,
}

impl fmt::Display for ApiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApiCategory::Vision => "vision",
            ApiCategory::Tts => "tts",
        })
    }
}

struct Slot {
    interval: Duration,
    limiter: CategoryLimiter,
}

/// Blocks callers until the configured interval since the previous call of the same category
/// has elapsed. Categories without an interval pass straight through.
///
/// Each category has its own limiter, so a TTS wait never delays a vision call.
pub struct RateGate {
    slots: HashMap<ApiCategory, Slot>,
    clock: DefaultClock,
}

impl fmt::Debug for RateGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|(c, s)| (c, s.interval)))
            .finish()
    }
}

impl Default for RateGate {
    /// Vision every 3 s, TTS every 15 s.
    fn default() -> Self {
        Self::new([
            (ApiCategory::Vision, Duration::from_secs(3)),
            (ApiCategory::Tts, Duration::from_secs(15)),
        ])
    }
}

impl RateGate {
    /// A zero interval leaves its category unconfigured.
    pub fn new(intervals: impl IntoIterator<Item = (ApiCategory, Duration)>) -> Self {
        let slots = intervals
            .into_iter()
            .filter_map(|(category, interval)| {
                let quota = Quota::with_period(interval)?;
                Some((
                    category,
                    Slot {
                        interval,
                        limiter: RateLimiter::direct(quota),
                    },
                ))
            })
            .collect();
        Self {
            slots,
            clock: DefaultClock::default(),
        }
    }

    pub fn interval(&self, category: ApiCategory) -> Option<Duration> {
        self.slots.get(&category).map(|s| s.interval)
    }

    /// Wait out the remaining interval for `category`, then take its permit.
    ///
    /// Returns how long the caller was blocked.
    pub fn wait(&self, category: ApiCategory) -> Duration {
        let Some(slot) = self.slots.get(&category) else {
            return Duration::ZERO;
        };
        let mut waited = Duration::ZERO;
        while let Err(not_until) = slot.limiter.check() {
            let wait = not_until.wait_time_from(self.clock.now());
            tracing::info!(category = %category, wait_secs = wait.as_secs_f64(), "rate limiting");
            std::thread::sleep(wait);
            waited += wait;
        }
        waited
    }
}
