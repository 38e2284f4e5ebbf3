use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One request observed by the mock engine.
///
/// The mock engine publishes one JSON object per request; fields beyond the
/// ones below (`headers`, `project_id`) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub project_slug: String,
    pub method: String,
    pub path: String,
    #[serde(rename = "status")]
    pub status_code: u16,
    /// Epoch seconds, possibly fractional.
    #[serde(rename = "timestamp")]
    pub timestamp_seconds: f64,
    /// Set by the mock engine when the request did not reach a project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl LogEntry {
    /// Decodes one push-channel text frame.
    pub fn from_frame(frame: &str) -> Result<Self> {
        Ok(serde_json::from_str(frame)?)
    }

    pub fn is_failure(&self) -> bool {
        self.status_code >= 400
    }

    /// Wall-clock time of the request in the local timezone, `HH:MM:SS`.
    ///
    /// Returns `None` for timestamps chrono cannot represent.
    pub fn local_time(&self) -> Option<String> {
        let secs = self.timestamp_seconds.floor();
        let nanos = ((self.timestamp_seconds - secs) * 1e9) as u32;
        let utc = DateTime::from_timestamp(secs as i64, nanos)?;
        Some(utc.with_timezone(&Local).format("%H:%M:%S").to_string())
    }
}
