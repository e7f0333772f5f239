//! Query-related data models.
//!
//! This module defines the date range accepted by the query builders and the
//! built query handed back to callers for execution.

use crate::error::{DbError, DbResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Default query timeout in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u32 = 30;

/// Maximum query timeout in seconds.
pub const MAX_QUERY_TIMEOUT_SECS: u32 = 300;

/// Inclusive date bounds for incremental queries. Either side is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// No bound on either side.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Parse optional bounds given as `YYYY-MM-DD`, `YYYY-MM-DDThh:mm:ss` or RFC 3339.
    ///
    /// Timestamps are truncated to their date because the timestamp table stores dates.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> DbResult<Self> {
        Ok(Self {
            from: from.map(parse_date).transpose()?,
            to: to.map(parse_date).transpose()?,
        })
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

fn parse_date(s: &str) -> DbResult<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.date());
    }
    Err(DbError::invalid_input(format!(
        "Invalid date '{s}': expected YYYY-MM-DD or an RFC 3339 timestamp"
    )))
}

/// SQL text built by a dialect, plus the values to bind to its placeholders.
///
/// Construction is separated from execution: callers may log, batch or rewrite
/// the text before running it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuiltQuery {
    pub sql: String,
    /// Date bounds, in placeholder order
    pub params: Vec<NaiveDate>,
    /// Positive row cap requested by the caller. Never embedded in `sql`.
    pub limit: Option<u32>,
}

impl BuiltQuery {
    pub fn new(sql: String, params: Vec<NaiveDate>, limit: Option<u32>) -> Self {
        Self { sql, params, limit }
    }
}
