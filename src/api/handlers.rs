use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::error::ApiError;
use crate::analytics::identity::{header_identity, resolve_identity};
use crate::analytics::{day_of, StatsSnapshot};
use crate::likes::{LikeOutcome, LikeRequest, LikesSnapshot, ANONYMOUS};
use crate::ratings::{RatingEntry, RatingScores, SubmitRatingRequest};
use crate::Beacon;

/// How far in the past a client-supplied ping timestamp may lie
const MAX_CLIENT_SKEW: TimeDelta = TimeDelta::minutes(5);

pub struct AppState {
    pub beacon: Arc<Beacon>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingRequest {
    pub user_id: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: StatsSnapshot,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingUser {
    pub id: String,
    pub is_new_today: bool,
    pub is_new_overall: bool,
}

#[derive(Serialize)]
pub struct PingResponse {
    pub success: bool,
    pub stats: StatsSnapshot,
    pub user: PingUser,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub rating_id: String,
    pub can_edit_after: DateTime<Utc>,
    pub replaced: bool,
}

/// Public view of a rating; the submitter's identity stays private
#[derive(Serialize)]
struct RatingView<'a> {
    id: &'a str,
    #[serde(flatten)]
    scores: RatingScores,
    comment: Option<&'a str>,
    timestamp: DateTime<Utc>,
}

impl<'a> From<&'a RatingEntry> for RatingView<'a> {
    fn from(entry: &'a RatingEntry) -> Self {
        Self {
            id: &entry.id,
            scores: entry.scores,
            comment: entry.comment.as_deref(),
            timestamp: entry.submitted_at,
        }
    }
}

#[derive(Serialize)]
struct RatingsResponse<'a> {
    success: bool,
    ratings: Vec<RatingView<'a>>,
    total: usize,
    average: f64,
    updated: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikesResponse {
    pub success: bool,
    #[serde(flatten)]
    pub likes: LikesSnapshot,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: LikeOutcome,
}

/// Client-supplied ping time, or `now` when absent, malformed, in the
/// future, or too far in the past
pub fn resolve_timestamp(raw: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|at| at.with_timezone(&Utc))
        .filter(|at| *at <= now && now - *at <= MAX_CLIENT_SKEW)
        .unwrap_or(now)
}

fn json_payload<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::MalformedPayload(rejection.body_text()))
}

/// Record a visit heartbeat
///
/// The body is optional and parsed leniently: a missing or malformed body
/// still counts the visit.
pub async fn record_ping(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<PingResponse> {
    let request = if body.is_empty() {
        PingRequest::default()
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|e| {
            debug!(error = %e, "ignoring malformed ping body");
            PingRequest::default()
        })
    };

    let now = resolve_timestamp(request.timestamp.as_deref(), Utc::now());
    let identity = resolve_identity(&headers, request.user_id.as_deref(), day_of(now));
    let report = state.beacon.ping(&identity, now);

    Json(PingResponse {
        success: true,
        stats: report.stats,
        user: PingUser {
            id: identity,
            is_new_today: report.is_new_today,
            is_new_overall: report.is_new_all_time,
        },
    })
}

/// Current visitor stats; always succeeds
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        success: true,
        stats: state.beacon.stats(Utc::now()),
    })
}

/// Submit or edit a rating
pub async fn submit_rating(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<SubmitRatingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let request = json_payload(payload)?;
    let now = Utc::now();
    let identity = resolve_identity(&headers, request.user_id.as_deref(), day_of(now));

    let submission = request.validate(identity)?;
    let receipt = state.beacon.submit_rating(submission, now)?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            rating_id: receipt.rating_id,
            can_edit_after: receipt.editable_until,
            replaced: receipt.replaced,
        }),
    ))
}

/// All ratings with the cached aggregate
pub async fn get_ratings(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.beacon.ratings(Utc::now());

    Json(RatingsResponse {
        success: true,
        ratings: snapshot.entries.iter().map(RatingView::from).collect(),
        total: snapshot.count,
        average: snapshot.average,
        updated: snapshot.computed_at,
    })
    .into_response()
}

/// Likes identify the caller by header first, then body, then anonymous
fn likes_identity(headers: &HeaderMap, body_user_id: Option<&str>) -> String {
    header_identity(headers)
        .or_else(|| {
            body_user_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| ANONYMOUS.to_string())
}

pub async fn get_likes(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<LikesResponse> {
    let identity = likes_identity(&headers, None);

    Json(LikesResponse {
        success: true,
        likes: state.beacon.likes(&identity),
    })
}

pub async fn add_like(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<LikeRequest>, JsonRejection>,
) -> Result<Json<LikeResponse>, ApiError> {
    let request = json_payload(payload)?;
    let identity = likes_identity(&headers, request.user_id.as_deref());
    let outcome = state.beacon.like(&identity, request.track_id.as_deref())?;

    Ok(Json(LikeResponse {
        success: true,
        outcome,
    }))
}

pub async fn remove_like(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<LikeRequest>, JsonRejection>,
) -> Result<Json<LikeResponse>, ApiError> {
    let request = json_payload(payload)?;
    let identity = likes_identity(&headers, request.user_id.as_deref());
    let outcome = state.beacon.unlike(&identity, request.track_id.as_deref())?;

    Ok(Json(LikeResponse {
        success: true,
        outcome,
    }))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: String,
    }

    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
