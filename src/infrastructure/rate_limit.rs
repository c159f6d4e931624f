use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub window: Duration,
    pub max_requests: u32,
}

pub const REGISTER_LIMIT: RateLimitPolicy = RateLimitPolicy {
    window: Duration::from_secs(60 * 60),
    max_requests: 3,
};
pub const BOOKMARK_LIMIT: RateLimitPolicy = RateLimitPolicy {
    window: Duration::from_secs(60),
    max_requests: 60,
};
pub const API_LIMIT: RateLimitPolicy = RateLimitPolicy {
    window: Duration::from_secs(60),
    max_requests: 100,
};

#[derive(Debug)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window request counter keyed by caller identity. Owned by the
/// application state; expired windows are dropped by [`RateLimiter::sweep`].
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one request against `key` and reports whether it is allowed.
    pub fn check(&self, key: &str, policy: RateLimitPolicy) -> bool {
        self.check_at(key, policy, Instant::now())
    }

    fn check_at(&self, key: &str, policy: RateLimitPolicy, now: Instant) -> bool {
        let mut windows = self.windows.lock();
        match windows.get_mut(key) {
            Some(window) if now <= window.reset_at => {
                window.count = window.count.saturating_add(1);
                window.count <= policy.max_requests
            }
            _ => {
                windows.insert(
                    key.to_string(),
                    Window {
                        count: 1,
                        reset_at: now + policy.window,
                    },
                );
                true
            }
        }
    }

    /// Drops expired windows and returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|_, window| now <= window.reset_at);
        before - windows.len()
    }

    pub fn tracked(&self) -> usize {
        self.windows.lock().len()
    }
}
