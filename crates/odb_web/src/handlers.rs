use axum::{
    extract::{Path, Query, State},
    Json,
};
use odb_core::{DevotionalPage, DevotionalRecord};
use odb_scrapers::listing::DEFAULT_LIMIT;
use serde::Deserialize;
use serde_json::{json, Value};
use std::num::IntErrorKind;
use std::sync::Arc;

use crate::{ApiError, AppState};

pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Our Daily Bread Devotional API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Read-only access to Our Daily Bread Ministries daily devotionals",
        "endpoints": {
            "today": "/today",
            "by_date": "/date/{YYYY-MM-DD}",
            "by_slug": "/devotional/{slug}",
            "list": "/list?limit=10&offset=0"
        }
    }))
}

pub async fn today(State(state): State<Arc<AppState>>) -> Result<Json<DevotionalRecord>, ApiError> {
    state
        .service
        .today()
        .await
        .map(Json)
        .map_err(|e| ApiError::from_service(e, "Error fetching today's devotional"))
}

pub async fn by_date(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> Result<Json<DevotionalRecord>, ApiError> {
    state
        .service
        .by_date(&date)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_service(e, "Error fetching devotional"))
}

pub async fn by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<DevotionalRecord>, ApiError> {
    state
        .service
        .by_slug(&slug)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_service(e, "Error fetching devotional"))
}

/// Raw query values; parsed by hand so a bad value gets a JSON `detail`.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<DevotionalPage>, ApiError> {
    let limit = parse_param("limit", params.limit.as_deref())?.unwrap_or(DEFAULT_LIMIT as i64);
    let offset = parse_param("offset", params.offset.as_deref())?.unwrap_or(0).max(0) as usize;

    state
        .service
        .list(limit, offset)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_service(e, "Error fetching devotional list"))
}

/// Integers outside `i64` saturate; they are clamped later anyway.
fn parse_param(name: &str, raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    raw.map(|value| match value.trim().parse::<i64>() {
        Ok(parsed) => Ok(parsed),
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(ApiError::BadRequest(format!(
                "{} must be an integer, got {:?}",
                name, value
            ))),
        },
    })
    .transpose()
}
