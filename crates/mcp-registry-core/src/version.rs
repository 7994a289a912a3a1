//! Version ordering for "which version is latest".
//!
//! Versions are free-form strings. Two strict semantic versions compare by
//! semver precedence; two non-semver strings compare by publish time; when
//! exactly one side is semver, that side wins. The empty string sorts below
//! everything.

use chrono::{DateTime, Utc};
use semver::Version;
use std::cmp::Ordering;

/// Parse `raw` as a strict `major.minor.patch[-pre][+build]` version.
///
/// One leading `v`/`V` is tolerated. Anything else the semver grammar does
/// not accept (two-part versions, four-part versions, empty prerelease,
/// leading zeros) is not a semantic version.
pub fn parse_semver(raw: &str) -> Option<Version> {
    let trimmed = raw
        .strip_prefix('v')
        .or_else(|| raw.strip_prefix('V'))
        .unwrap_or(raw);
    Version::parse(trimmed).ok()
}

pub fn is_semver(raw: &str) -> bool {
    parse_semver(raw).is_some()
}

/// Semver precedence: build metadata is ignored.
fn precedence(a: &Version, b: &Version) -> Ordering {
    a.major
        .cmp(&b.major)
        .then(a.minor.cmp(&b.minor))
        .then(a.patch.cmp(&b.patch))
        .then_with(|| a.pre.cmp(&b.pre))
}

/// Order version `a` (published at `a_time`) against `b` (published at `b_time`).
pub fn compare_versions(
    a: &str,
    a_time: DateTime<Utc>,
    b: &str,
    b_time: DateTime<Utc>,
) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }

    match (parse_semver(a), parse_semver(b)) {
        (Some(va), Some(vb)) => precedence(&va, &vb),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a_time.cmp(&b_time),
    }
}

/// Whether `candidate` should replace `current` as the latest version.
pub fn is_newer(
    candidate: &str,
    candidate_time: DateTime<Utc>,
    current: &str,
    current_time: DateTime<Utc>,
) -> bool {
    compare_versions(candidate, candidate_time, current, current_time) == Ordering::Greater
}
