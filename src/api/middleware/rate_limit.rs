//! Login rate limiting.
//!
//! A keyed limiter (per username) throttles credential guessing on the
//! login endpoint.

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Keyed rate limiter shared through the application state.
pub type LoginRateLimiter =
    Arc<RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>>;

/// Default login attempts allowed per username per minute.
const LOGIN_ATTEMPTS_PER_MINUTE: u32 = 5;

/// Create the login limiter with default settings.
pub fn create_login_limiter() -> LoginRateLimiter {
    create_login_limiter_with_quota(LOGIN_ATTEMPTS_PER_MINUTE)
}

/// Create a login limiter with a custom per-minute quota.
pub fn create_login_limiter_with_quota(attempts_per_minute: u32) -> LoginRateLimiter {
    let quota = Quota::per_minute(
        NonZeroU32::new(attempts_per_minute)
            .unwrap_or(NonZeroU32::new(LOGIN_ATTEMPTS_PER_MINUTE).unwrap()),
    );
    Arc::new(RateLimiter::keyed(quota))
}
