//! Collection progress for a daily snapshot job.
//!
//! One [`ProgressState`] exists per job name and calendar date. It is the
//! only thing that survives between invocations, so every field needed to
//! resume collection lives here.

use crate::TypeError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Opaque pagination cursor returned by the holder-listing API.
///
/// The API hands back a JSON object (`next_page_params`) that must be echoed
/// on the next request. We never interpret its contents except when
/// rebuilding it from the last seen record after a cold start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageParams(pub Map<String, Value>);

impl PageParams {
    /// Wrap a JSON object.
    pub fn new(params: Map<String, Value>) -> Self {
        Self(params)
    }

    /// Rebuild the cursor that follows `last` after `items_count` items.
    ///
    /// The shape mirrors what the API returns in `next_page_params`.
    pub fn after_record(last: &LastRecord, items_count: u64) -> Self {
        let mut params = Map::new();
        params.insert("address_hash".into(), Value::String(last.address.clone()));
        params.insert("value".into(), Value::String(last.raw_value.clone()));
        params.insert("items_count".into(), Value::from(items_count));
        Self(params)
    }

    /// Flatten into query-string pairs. Nulls are dropped and non-string
    /// scalars are rendered as JSON text.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key.clone(), s.clone())),
                other => Some((key.clone(), other.to_string())),
            })
            .collect()
    }

    /// Convert to a plain JSON value for storage.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Parse from a stored JSON value. Anything but an object is rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }
}

/// Identifying key of the last holder written, kept so that the next page
/// request can be reconstructed if the continuation token is lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastRecord {
    /// Holder address as reported by the API.
    pub address: String,

    /// Raw balance string in the token's smallest unit.
    pub raw_value: String,
}

/// Explicit state of a job's daily cycle.
///
/// ```text
/// NotStarted -> Collecting -> TargetReached | Exhausted -> Classifying -> Done
/// ```
///
/// `Collecting` repeats across invocations until the target is reached or
/// the API runs out of pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobPhase {
    NotStarted,
    Collecting,
    TargetReached,
    Exhausted,
    Classifying,
    Done,
}

impl JobPhase {
    /// Storage tag for this phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobPhase::NotStarted => "NOT_STARTED",
            JobPhase::Collecting => "COLLECTING",
            JobPhase::TargetReached => "TARGET_REACHED",
            JobPhase::Exhausted => "EXHAUSTED",
            JobPhase::Classifying => "CLASSIFYING",
            JobPhase::Done => "DONE",
        }
    }

    /// Parse a storage tag.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        match s {
            "NOT_STARTED" => Ok(JobPhase::NotStarted),
            "COLLECTING" => Ok(JobPhase::Collecting),
            "TARGET_REACHED" => Ok(JobPhase::TargetReached),
            "EXHAUSTED" => Ok(JobPhase::Exhausted),
            "CLASSIFYING" => Ok(JobPhase::Classifying),
            "DONE" => Ok(JobPhase::Done),
            other => Err(TypeError::InvalidPhase(other.to_string())),
        }
    }

    /// True once collection has stopped for the day.
    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            JobPhase::TargetReached | JobPhase::Exhausted | JobPhase::Classifying | JobPhase::Done
        )
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted cursor for one job on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    /// Logical job name.
    pub job_name: String,

    /// Calendar date (UTC) this cycle belongs to.
    pub snapshot_date: NaiveDate,

    /// Pages already fetched this cycle.
    pub last_page: u32,

    /// Cursor for the next page. `None` means start from page 1.
    pub continuation_token: Option<PageParams>,

    /// Holder rows written so far today.
    pub total_collected: u64,

    /// True once the target or API exhaustion was reached.
    pub is_complete: bool,

    /// Explicit cycle state.
    pub phase: JobPhase,

    /// Key of the last holder written.
    pub last_record: Option<LastRecord>,

    /// Optimistic concurrency counter, bumped on every write.
    pub version: i64,

    /// Time of the last write.
    pub updated_at: DateTime<Utc>,
}

impl ProgressState {
    /// A zeroed row for a job that has not run yet today.
    pub fn new(job_name: &str, snapshot_date: NaiveDate) -> Self {
        Self {
            job_name: job_name.to_string(),
            snapshot_date,
            last_page: 0,
            continuation_token: None,
            total_collected: 0,
            is_complete: false,
            phase: JobPhase::NotStarted,
            last_record: None,
            version: 0,
            updated_at: Utc::now(),
        }
    }

    /// Cursor for the next request.
    ///
    /// Prefers the stored continuation token. When it is missing after at
    /// least one page, the cursor is rebuilt from the last record.
    pub fn next_page_params(&self, page_size: u32) -> Option<PageParams> {
        if let Some(token) = &self.continuation_token {
            return Some(token.clone());
        }

        match &self.last_record {
            Some(last) if self.last_page > 0 => Some(PageParams::after_record(
                last,
                u64::from(self.last_page) * u64::from(page_size),
            )),
            _ => None,
        }
    }

    /// Apply a partial update in place. Fields left as `None` are kept.
    pub fn apply(&mut self, update: &ProgressUpdate) {
        if let Some(last_page) = update.last_page {
            self.last_page = last_page;
        }
        if let Some(token) = &update.continuation_token {
            self.continuation_token = token.clone();
        }
        if let Some(total) = update.total_collected {
            self.total_collected = total;
        }
        if let Some(phase) = update.phase {
            self.phase = phase;
            self.is_complete = phase.is_complete();
        }
        if let Some(last) = &update.last_record {
            self.last_record = Some(last.clone());
        }
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

/// Partial write to a [`ProgressState`]. Only `Some` fields are applied.
///
/// `continuation_token` is doubly optional: `Some(None)` clears the token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressUpdate {
    pub last_page: Option<u32>,
    pub continuation_token: Option<Option<PageParams>>,
    pub total_collected: Option<u64>,
    pub phase: Option<JobPhase>,
    pub last_record: Option<LastRecord>,
}

impl ProgressUpdate {
    /// Update that only moves the phase.
    pub fn phase(phase: JobPhase) -> Self {
        Self {
            phase: Some(phase),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn last() -> LastRecord {
        LastRecord {
            address: "0x1111111111111111111111111111111111111111".to_string(),
            raw_value: "1000".to_string(),
        }
    }

    #[test]
    fn test_new_state_is_zeroed() {
        let state = ProgressState::new("holders", date());
        assert_eq!(state.last_page, 0);
        assert_eq!(state.total_collected, 0);
        assert!(!state.is_complete);
        assert_eq!(state.phase, JobPhase::NotStarted);
        assert!(state.next_page_params(50).is_none());
    }

    #[test]
    fn test_next_page_prefers_token() {
        let mut state = ProgressState::new("holders", date());
        let token = PageParams::from_value(json!({"items_count": 100})).unwrap();
        state.continuation_token = Some(token.clone());
        state.last_page = 2;
        state.last_record = Some(last());
        assert_eq!(state.next_page_params(50), Some(token));
    }

    #[test]
    fn test_next_page_rebuilt_from_last_record() {
        let mut state = ProgressState::new("holders", date());
        state.last_page = 3;
        state.last_record = Some(last());

        let params = state.next_page_params(50).unwrap();
        assert_eq!(params.0["items_count"], json!(150));
        assert_eq!(params.0["value"], json!("1000"));
        assert_eq!(
            params.0["address_hash"],
            json!("0x1111111111111111111111111111111111111111")
        );
    }

    #[test]
    fn test_apply_partial_update() {
        let mut state = ProgressState::new("holders", date());
        state.apply(&ProgressUpdate {
            last_page: Some(1),
            total_collected: Some(50),
            ..Default::default()
        });
        assert_eq!(state.last_page, 1);
        assert_eq!(state.total_collected, 50);
        assert_eq!(state.phase, JobPhase::NotStarted);
        assert_eq!(state.version, 1);

        state.apply(&ProgressUpdate::phase(JobPhase::Exhausted));
        assert!(state.is_complete);
        assert_eq!(state.last_page, 1);
        assert_eq!(state.version, 2);
    }

    #[test]
    fn test_apply_clears_token() {
        let mut state = ProgressState::new("holders", date());
        state.continuation_token = PageParams::from_value(json!({"a": 1}));
        state.apply(&ProgressUpdate {
            continuation_token: Some(None),
            ..Default::default()
        });
        assert!(state.continuation_token.is_none());
    }

    #[test]
    fn test_query_pairs_drop_nulls() {
        let params =
            PageParams::from_value(json!({"address_hash": "0xabc", "items_count": 50, "id": null}))
                .unwrap();
        let mut pairs = params.to_query_pairs();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("address_hash".to_string(), "0xabc".to_string()),
                ("items_count".to_string(), "50".to_string()),
            ]
        );
    }

    #[test]
    fn test_phase_tags() {
        for phase in [
            JobPhase::NotStarted,
            JobPhase::Collecting,
            JobPhase::TargetReached,
            JobPhase::Exhausted,
            JobPhase::Classifying,
            JobPhase::Done,
        ] {
            assert_eq!(JobPhase::parse(phase.as_str()).unwrap(), phase);
        }
        assert!(JobPhase::parse("PAUSED").is_err());
        assert!(!JobPhase::Collecting.is_complete());
        assert!(JobPhase::Done.is_complete());
    }
}
