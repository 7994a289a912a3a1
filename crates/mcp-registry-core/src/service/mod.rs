//! Domain services
//!
//! Gate checks that run against the storage port before a publish commits.

mod rate_limiter;
mod remote_guard;

pub use rate_limiter::{RateDecision, RateLimiter, RATE_LIMIT_WINDOW_HOURS};
pub use remote_guard::RemoteUrlGuard;
