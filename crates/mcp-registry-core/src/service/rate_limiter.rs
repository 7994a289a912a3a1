//! Per-subject publish quota
//!
//! Counts a subject's publishes over a rolling 24 hour window through the
//! storage port. The quota doubles as the global kill switch: a quota of 0
//! disables publishing for everyone except admins, a negative quota turns
//! limiting off.

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{RegistryError, RegistryResult};
use crate::repository::ServerRepository;

/// Length of the rolling quota window
pub const RATE_LIMIT_WINDOW_HOURS: u32 = 24;

/// Outcome of a quota check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Caller bypasses limits or limiting is off
    Unlimited,
    /// Within quota; `used` publishes already counted in the window
    Allowed { used: u64, limit: u64 },
    /// Over quota
    Exceeded { used: u64, limit: u64 },
    /// Quota is zero and the caller is not an admin
    Disabled,
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Unlimited | Self::Allowed { .. })
    }
}

pub struct RateLimiter {
    repo: Arc<dyn ServerRepository>,
    daily_quota: i64,
}

impl RateLimiter {
    pub fn new(repo: Arc<dyn ServerRepository>, daily_quota: i64) -> Self {
        Self { repo, daily_quota }
    }

    pub fn daily_quota(&self) -> i64 {
        self.daily_quota
    }

    /// Decide whether `subject` may publish now.
    pub async fn decide(&self, subject: &str, is_admin: bool) -> RegistryResult<RateDecision> {
        if is_admin || self.daily_quota < 0 {
            return Ok(RateDecision::Unlimited);
        }
        if self.daily_quota == 0 {
            return Ok(RateDecision::Disabled);
        }

        let limit = self.daily_quota as u64;
        let used = self
            .repo
            .count_recent_publishes_by_subject(subject, RATE_LIMIT_WINDOW_HOURS)
            .await?;

        debug!(
            subject = subject,
            used = used,
            limit = limit,
            "[RateLimiter] Counted recent publishes"
        );

        if used < limit {
            Ok(RateDecision::Allowed { used, limit })
        } else {
            Ok(RateDecision::Exceeded { used, limit })
        }
    }

    /// `true` iff the subject may publish now
    pub async fn allow(&self, subject: &str, is_admin: bool) -> RegistryResult<bool> {
        Ok(self.decide(subject, is_admin).await?.is_allowed())
    }

    /// Like [`Self::allow`] but maps refusals to typed errors.
    pub async fn check(&self, subject: &str, is_admin: bool) -> RegistryResult<()> {
        match self.decide(subject, is_admin).await? {
            RateDecision::Unlimited | RateDecision::Allowed { .. } => Ok(()),
            RateDecision::Disabled => Err(RegistryError::PublishingDisabled),
            RateDecision::Exceeded { used, limit } => {
                info!(
                    subject = subject,
                    used = used,
                    limit = limit,
                    "[RateLimiter] Publish quota exceeded"
                );
                Err(RegistryError::RateLimitExceeded {
                    subject: subject.to_string(),
                    count: used,
                    limit,
                })
            }
        }
    }
}
