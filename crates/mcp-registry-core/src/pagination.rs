//! Pagination cursor protocol
//!
//! Backends order records by a storage-assigned sequence that never changes
//! and does not depend on the filter. A cursor is the sequence of the last
//! record on a page, encoded so callers treat it as opaque:
//!
//! - `list(filter, None, limit)` returns the first `limit` matches in order
//! - `list(filter, Some(cursor), limit)` returns matches strictly after it
//! - `next_cursor` is `None` iff fewer than `limit` records came back

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::domain::{ServerFilter, ServerRecord};
use crate::repository::{RepoResult, ServerRepository, StorageError};

/// One page of results plus the cursor for the next page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }

    /// Build a page from `(sequence, item)` pairs already cut to at most `limit`.
    pub fn from_sequenced(entries: Vec<(u64, T)>, limit: usize) -> Self {
        let next_cursor = match entries.last() {
            Some((seq, _)) if limit > 0 && entries.len() == limit => Some(Cursor::new(*seq).encode()),
            _ => None,
        };
        Self {
            items: entries.into_iter().map(|(_, item)| item).collect(),
            next_cursor,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Decoded position in a backend's sequence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(u64);

impl Cursor {
    pub fn new(sequence: u64) -> Self {
        Self(sequence)
    }

    pub fn sequence(&self) -> u64 {
        self.0
    }

    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0.to_string())
    }

    pub fn decode(raw: &str) -> Result<Self, StorageError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(raw)
            .map_err(|_| StorageError::InvalidCursor(raw.to_string()))?;
        std::str::from_utf8(&bytes)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Self)
            .ok_or_else(|| StorageError::InvalidCursor(raw.to_string()))
    }

    /// Decode an optional cursor; `None` and `""` both mean "from the start".
    pub fn decode_opt(raw: Option<&str>) -> Result<Option<Self>, StorageError> {
        match raw {
            None | Some("") => Ok(None),
            Some(raw) => Self::decode(raw).map(Some),
        }
    }
}

/// Apply cursor and limit to records already filtered and sorted by sequence.
pub fn paginate<I>(entries: I, cursor: Option<&str>, limit: usize) -> RepoResult<Page<ServerRecord>>
where
    I: IntoIterator<Item = (u64, ServerRecord)>,
{
    let after = Cursor::decode_opt(cursor)?.map(|c| c.sequence());
    let page: Vec<_> = entries
        .into_iter()
        .filter(|(seq, _)| after.map_or(true, |after| *seq > after))
        .take(limit)
        .collect();
    Ok(Page::from_sequenced(page, limit))
}

/// Walk every page of `filter`, stopping once `ceiling` records are collected.
pub async fn collect_all(
    repo: &dyn ServerRepository,
    filter: &ServerFilter,
    page_size: usize,
    ceiling: usize,
) -> RepoResult<Vec<ServerRecord>> {
    let page_size = page_size.max(1);
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = repo.list(filter, cursor.as_deref(), page_size).await?;
        records.extend(page.items);
        if records.len() >= ceiling {
            records.truncate(ceiling);
            break;
        }
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(records)
}
