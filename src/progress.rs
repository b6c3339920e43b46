//! Reading progress and scroll position persistence.
//!
//! Records live in a [`KeyValueStore`] under the page's key conventions:
//! `reading_<novelId>` holds a JSON [`ProgressRecord`] and
//! `scroll_<novelId>_<chapter>` holds the raw scroll percentage.
//! Malformed or incomplete data never fails an operation; the affected record
//! is skipped and the reason is logged at debug level.


use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::store::KeyValueStore;

pub const PROGRESS_KEY_PREFIX: &str = "reading_";
pub const SCROLL_KEY_PREFIX: &str = "scroll_";
pub const DEFAULT_CONTINUE_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub novel_id: String,
    pub chapter: u32,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContinueReadingEntry {
    pub novel_id: String,
    pub title: String,
    pub cover: String,
    pub chapter: u32,
    pub timestamp: DateTime<Utc>,
}

impl ContinueReadingEntry {
    pub fn chapter_url(&self) -> String {
        format!("/novels/{}/chapter-{}.html", self.novel_id, self.chapter)
    }
}

/// Why a record was left out of a result.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("malformed value under {key}: {detail}")]
    Parse { key: String, detail: String },
    #[error("missing novel id or chapter")]
    MissingInput,
    #[error("novel {0} is not in the catalog")]
    NoMatch(String),
}

pub fn progress_key(novel_id: &str) -> String {
    format!("{PROGRESS_KEY_PREFIX}{novel_id}")
}

pub fn scroll_key(novel_id: &str, chapter: u32) -> String {
    format!("{SCROLL_KEY_PREFIX}{novel_id}_{chapter}")
}

fn has_input(novel_id: &str, chapter: u32) -> bool {
    !novel_id.trim().is_empty() && chapter > 0
}

pub struct ReadingProgressStore<S> {
    store: S,
}

impl<S: KeyValueStore> ReadingProgressStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Overwrites the progress record for `novel_id`. Returns `false` when the
    /// input is incomplete and nothing was written.
    pub fn save_progress(&self, novel_id: &str, chapter: u32, now: DateTime<Utc>) -> Result<bool> {
        if !has_input(novel_id, chapter) {
            log::debug!("progress not saved: {}", SkipReason::MissingInput);
            return Ok(false);
        }
        let record = ProgressRecord {
            novel_id: novel_id.to_string(),
            chapter,
            timestamp: now,
        };
        let value = serde_json::to_string(&record)?;
        self.store.set(&progress_key(novel_id), &value)?;
        log::debug!("saved progress {novel_id} chapter {chapter}");
        Ok(true)
    }

    /// Stores `percent` as given; callers debounce and nothing is clamped here.
    pub fn save_scroll(&self, novel_id: &str, chapter: u32, percent: f64) -> Result<bool> {
        if !has_input(novel_id, chapter) {
            log::debug!("scroll not saved: {}", SkipReason::MissingInput);
            return Ok(false);
        }
        self.store
            .set(&scroll_key(novel_id, chapter), &percent.to_string())?;
        log::trace!("saved scroll {novel_id} chapter {chapter} at {percent}");
        Ok(true)
    }

    pub fn load_scroll(&self, novel_id: &str, chapter: u32) -> Result<Option<f64>> {
        let key = scroll_key(novel_id, chapter);
        let Some(raw) = self.store.get(&key)? else {
            return Ok(None);
        };
        match raw.trim().parse::<f64>() {
            Ok(percent) if percent.is_finite() => Ok(Some(percent)),
            _ => {
                let reason = SkipReason::Parse {
                    key,
                    detail: format!("{raw:?} is not a number"),
                };
                log::debug!("ignoring scroll position: {reason}");
                Ok(None)
            }
        }
    }

    pub fn load_progress(&self, novel_id: &str) -> Result<Option<ProgressRecord>> {
        let key = progress_key(novel_id);
        let Some(raw) = self.store.get(&key)? else {
            return Ok(None);
        };
        match parse_progress(&key, &raw) {
            Ok(record) => Ok(Some(record)),
            Err(reason) => {
                log::debug!("ignoring progress: {reason}");
                Ok(None)
            }
        }
    }

    /// Every valid progress record, most recently written first.
    ///
    /// Records with equal timestamps are ordered by novel id so the listing
    /// does not depend on the backend's key order.
    pub fn list_all_progress(&self) -> Result<Vec<ProgressRecord>> {
        let mut out = Vec::new();
        for key in self.store.keys()? {
            if !key.starts_with(PROGRESS_KEY_PREFIX) {
                continue;
            }
            let Some(raw) = self.store.get(&key)? else {
                continue;
            };
            match parse_progress(&key, &raw) {
                Ok(record) => out.push(record),
                Err(reason) => log::debug!("skipping progress entry: {reason}"),
            }
        }

        out.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.novel_id.cmp(&b.novel_id))
        });
        Ok(out)
    }

    /// The `limit` most recent records joined against `catalog`. Records for
    /// novels missing from the catalog are dropped without being replaced.
    pub fn continue_reading(
        &self,
        catalog: &Catalog,
        limit: usize,
    ) -> Result<Vec<ContinueReadingEntry>> {
        let entries = self
            .list_all_progress()?
            .into_iter()
            .take(limit)
            .filter_map(|record| {
                let Some(novel) = catalog.get(&record.novel_id) else {
                    log::debug!(
                        "dropping continue-reading entry: {}",
                        SkipReason::NoMatch(record.novel_id.clone())
                    );
                    return None;
                };
                Some(ContinueReadingEntry {
                    novel_id: novel.id.clone(),
                    title: novel.title.clone(),
                    cover: novel.cover.clone(),
                    chapter: record.chapter,
                    timestamp: record.timestamp,
                })
            })
            .collect();
        Ok(entries)
    }
}

fn parse_progress(key: &str, raw: &str) -> Result<ProgressRecord, SkipReason> {
    let record: ProgressRecord = serde_json::from_str(raw).map_err(|err| SkipReason::Parse {
        key: key.to_string(),
        detail: err.to_string(),
    })?;
    if !has_input(&record.novel_id, record.chapter) {
        return Err(SkipReason::MissingInput);
    }
    Ok(record)
}

/// `Date.prototype.toISOString` layout: millisecond precision, `Z` suffix.
/// Any RFC 3339 offset is accepted when reading.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
