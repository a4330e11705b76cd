use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult, ValidationError},
    middleware::RequestId,
    models::{Book, Extra, FeedbackType, InteractionEvent, RecommendationCategory},
};

use super::AppState;

const SERVICE_NAME: &str = "library-recommendation-api";
const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 50;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct TrackBehaviorRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub book_title: String,
    #[serde(default)]
    pub behavior_type: String,
    pub stay_time_seconds: Option<i64>,
    pub read_time_minutes: Option<i64>,
    #[serde(default)]
    pub extra: Option<Extra>,
}

impl TryFrom<TrackBehaviorRequest> for InteractionEvent {
    type Error = ValidationError;

    fn try_from(request: TrackBehaviorRequest) -> Result<Self, Self::Error> {
        Ok(InteractionEvent {
            behavior_type: request.behavior_type.trim().parse()?,
            user_id: request.user_id,
            item_key: request.book_title,
            stay_time_seconds: request.stay_time_seconds,
            read_time_minutes: request.read_time_minutes,
            extra: request.extra.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TrackBehaviorResponse {
    pub success: bool,
    pub message: String,
    pub behavior_type: String,
    pub feedback_type: FeedbackType,
    pub user_id: String,
    pub book_title: String,
}

#[derive(Debug, Deserialize)]
pub struct PersonalQuery {
    pub user_id: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    pub title: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub success: bool,
    pub recommendations: Vec<Book>,
    pub count: usize,
    pub category: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: Vec<RecommendationCategory>,
    pub count: usize,
}

/// Falls back to the default for missing, unparsable or out-of-range limits
fn parse_limit(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|l| (1..=MAX_LIMIT).contains(l))
        .unwrap_or(DEFAULT_LIMIT)
}

fn required_param(value: Option<String>, name: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidInput(format!("{} is required", name)))
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "timestamp": Utc::now().timestamp(),
    }))
}

/// Build information
pub async fn version_info() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "service": SERVICE_NAME,
        "description": "Behavior-driven book recommendations backed by a collaborative-filtering engine",
    }))
}

/// Records a user interaction with a book
pub async fn track_behavior(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<TrackBehaviorRequest>, JsonRejection>,
) -> AppResult<Json<TrackBehaviorResponse>> {
    let Json(request) = payload?;
    let behavior_type = request.behavior_type.clone();
    let event = InteractionEvent::try_from(request)?;

    tracing::info!(
        request_id = %request_id,
        user_id = %event.user_id,
        behavior = %event.behavior_type,
        "Tracking user behavior"
    );

    let user_id = event.user_id.clone();
    let book_title = event.item_key.clone();
    let feedback_type = state.recommendations.record_behavior(event).await?;

    Ok(Json(TrackBehaviorResponse {
        success: true,
        message: "Behavior recorded".to_string(),
        behavior_type,
        feedback_type,
        user_id,
        book_title,
    }))
}

/// Personalized recommendations with cold-start fallback
pub async fn personal_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<PersonalQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let user_id = required_param(params.user_id, "user_id")?;
    let limit = parse_limit(params.limit.as_deref());

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        limit = limit,
        "Processing personalized recommendation request"
    );

    let result = state
        .recommendations
        .get_recommendations(&user_id, limit)
        .await?;

    Ok(Json(RecommendationResponse {
        success: true,
        count: result.items.len(),
        recommendations: result.items,
        category: result.category,
        reason: result.reason,
        user_id: Some(user_id),
        base_title: None,
    }))
}

/// Most popular books
pub async fn popular_books(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let limit = parse_limit(params.limit.as_deref());
    let result = state.recommendations.get_popular(limit).await?;

    Ok(Json(RecommendationResponse {
        success: true,
        count: result.items.len(),
        recommendations: result.items,
        category: result.category,
        reason: result.reason,
        user_id: None,
        base_title: None,
    }))
}

/// Books similar to a given title
pub async fn similar_books(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SimilarQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let title = required_param(params.title, "title")?;
    let limit = parse_limit(params.limit.as_deref());

    tracing::info!(
        request_id = %request_id,
        title = %title,
        limit = limit,
        "Processing similar books request"
    );

    let result = state
        .recommendations
        .get_similar_items(&title, limit)
        .await?;

    Ok(Json(RecommendationResponse {
        success: true,
        count: result.items.len(),
        recommendations: result.items,
        category: result.category,
        reason: result.reason,
        user_id: None,
        base_title: Some(title),
    }))
}

/// Category overview; categories that fail to load are omitted
pub async fn category_recommendations(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> Json<CategoriesResponse> {
    let limit = parse_limit(params.limit.as_deref());
    let categories = state
        .recommendations
        .get_category_recommendations(limit)
        .await;

    Json(CategoriesResponse {
        success: true,
        count: categories.len(),
        categories,
    })
}
