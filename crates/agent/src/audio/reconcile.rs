//! Session reconciliation.
//!
//! Turns the mixer tool's raw endpoint rows into the canonical per-application
//! session list: application rows only, one row per name, first occurrence wins.
//! First-wins is an arbitrary policy (not loudest, not latest); later duplicate
//! streams from the same process are dropped, never merged.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use xeneon_protocol::AudioSession;

use super::Enumeration;

/// Row type the mixer tool uses for per-process sessions.
pub const APPLICATION_ROW: &str = "Application";

/// One row of the tool's JSON dump. Keys are the tool's column titles.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSessionRow {
    #[serde(rename = "Name", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "Type", default, deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(rename = "Device Name", default, deserialize_with = "lenient_string")]
    pub device_name: String,
    #[serde(rename = "Volume Percent", default, deserialize_with = "lenient_string")]
    pub volume_percent: String,
    #[serde(rename = "Muted", default, deserialize_with = "lenient_string")]
    pub muted: String,
    #[serde(
        rename = "Process ID",
        alias = "ProcessID",
        default,
        deserialize_with = "lenient_string"
    )]
    pub process_id: String,
}

impl RawSessionRow {
    fn into_session(self) -> AudioSession {
        AudioSession {
            muted: self.muted.trim().eq_ignore_ascii_case("yes"),
            name: self.name,
            device_name: self.device_name,
            volume_percent: self.volume_percent,
            process_id: self.process_id,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("session dump is not valid text: {0}")]
    Encoding(String),

    #[error("session dump is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("session dump root is not an array")]
    NotAnArray,
}

/// Filter to application rows, then keep the first row per name.
pub fn reconcile(rows: Vec<RawSessionRow>) -> Vec<AudioSession> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| row.kind == APPLICATION_ROW)
        .filter(|row| seen.insert(row.name.clone()))
        .map(RawSessionRow::into_session)
        .collect()
}

/// Decode and parse a dump file into raw rows.
///
/// Elements that are not row objects are skipped; a non-array root is an error.
pub fn parse_session_dump(bytes: &[u8]) -> Result<Vec<RawSessionRow>, ReconcileError> {
    let text = decode_text(bytes)?;
    let root: Value = serde_json::from_str(text.trim_start_matches('\u{feff}'))?;
    let Value::Array(items) = root else {
        return Err(ReconcileError::NotAnArray);
    };

    let total = items.len();
    let rows: Vec<RawSessionRow> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();

    if rows.len() < total {
        debug!(
            component = "audio",
            event = "audio.dump.rows_skipped",
            skipped = total - rows.len(),
            "Skipped malformed session rows"
        );
    }

    Ok(rows)
}

/// Parse + reconcile. Never fails: unreadable input degrades to no sessions.
pub fn reconcile_dump(bytes: &[u8]) -> Enumeration {
    match parse_session_dump(bytes) {
        Ok(rows) => Enumeration::Ok(reconcile(rows)),
        Err(e) => Enumeration::Degraded(e.to_string()),
    }
}

fn decode_text(bytes: &[u8]) -> Result<String, ReconcileError> {
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        if rest.len() % 2 != 0 {
            return Err(ReconcileError::Encoding("odd-length UTF-16 data".into()));
        }
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16(&units).map_err(|e| ReconcileError::Encoding(e.to_string()));
    }

    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8(bytes.to_vec()).map_err(|e| ReconcileError::Encoding(e.to_string()))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Bool(b) => (if b { "Yes" } else { "No" }).to_string(),
        other => other.to_string(),
    })
}
