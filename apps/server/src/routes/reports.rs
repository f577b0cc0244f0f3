//! Report endpoints.
//!
//! Date parsing and window validation live here, at the boundary; the
//! aggregator below assumes valid, already-parsed timestamps.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use till_core::ReportSummary;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn parse_date(value: Option<&str>, param: &str) -> Result<NaiveDate, ApiError> {
    let value = value.ok_or_else(|| ApiError::validation(format!("{param} is required")))?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("{param} must be a YYYY-MM-DD date")))
}

/// GET /api/v1/report?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD
///
/// The window is half-open over whole days: `[start 00:00, end 00:00)`,
/// so the end date's own day is excluded. `start_date == end_date` is a
/// legal, empty window.
#[tracing::instrument(skip(state))]
pub async fn range(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<Json<ReportSummary>, ApiError> {
    let start_date = parse_date(params.start_date.as_deref(), "start_date")?;
    let end_date = parse_date(params.end_date.as_deref(), "end_date")?;

    if start_date > end_date {
        return Err(ApiError::validation(
            "start_date must not be after end_date",
        ));
    }

    let start = start_date.and_time(NaiveTime::MIN).and_utc();
    let end = end_date.and_time(NaiveTime::MIN).and_utc();

    Ok(Json(state.reports.report(start, end).await?))
}

/// GET /api/v1/report/today — the current UTC day.
#[tracing::instrument(skip(state))]
pub async fn today(State(state): State<AppState>) -> Result<Json<ReportSummary>, ApiError> {
    let summary = state.reports.daily_report(Utc::now().date_naive()).await?;
    Ok(Json(summary))
}
