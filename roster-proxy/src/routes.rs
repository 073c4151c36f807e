use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use roster_parser::{
    export_file_name, import_events, parse_reply, to_ics, CalendarEvent, DateRange, EventPatch,
    ImportEntry, MappingRules, NewEvent, ScheduleEntry, ScheduleSummary,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::cache::AnalysisCache;
use crate::error::ApiError;
use crate::planner::{ImportReport, Planner, Saved};
use crate::rules_file::RulesFile;
use crate::vision::{RosterImage, VisionClient};

#[derive(Clone)]
pub struct AppState {
    pub vision: Arc<VisionClient>,
    pub planner: Arc<Planner>,
    pub rules: Arc<RulesFile>,
    pub cache: Arc<AnalysisCache>,
}

pub fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/api/analyze-schedule", post(analyze_schedule))
        .route("/api/events", get(list_events).post(create_event))
        .route("/api/events/export", get(export_events))
        .route("/api/events/:id", patch(update_event).delete(delete_event))
        .route("/api/schedule/import", post(import_schedule))
        .route("/api/mapping-rules", get(get_rules).put(put_rules))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::TooLarge
        } else {
            ApiError::Body(rejection.body_text())
        }
    })
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| ApiError::Body(rejection.body_text()))
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    #[serde(rename = "imageBase64", default)]
    image_base64: Option<String>,
}

#[derive(Serialize)]
struct AnalyzeResponse<'a> {
    schedule: &'a [ScheduleEntry],
    raw: bool,
    summary: ScheduleSummary,
}

impl<'a> AnalyzeResponse<'a> {
    fn new(schedule: &'a [ScheduleEntry]) -> Self {
        Self {
            schedule,
            raw: true,
            summary: ScheduleSummary::of(schedule),
        }
    }
}

async fn analyze_schedule(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = json_body(body)?;
    let image = RosterImage::from_base64(request.image_base64.as_deref().unwrap_or_default())?;

    if let Some(schedule) = state.cache.get(&image).await {
        log::debug!("Serving cached analysis of {} roster", image.media_type());
        return Ok(Json(AnalyzeResponse::new(&schedule)).into_response());
    }

    let reply = state.vision.describe_roster(&image).await?;
    let schedule = parse_reply(&reply)?;

    let summary = ScheduleSummary::of(&schedule);
    log::info!(
        "Analyzed roster: {} days ({} off, {} work, {} other)",
        summary.total,
        summary.off,
        summary.work,
        summary.other
    );

    let schedule = state.cache.insert(&image, schedule).await;
    Ok(Json(AnalyzeResponse::new(&schedule)).into_response())
}

#[derive(Deserialize)]
struct RangeQuery {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl From<RangeQuery> for DateRange {
    fn from(query: RangeQuery) -> Self {
        let default = DateRange::default();
        DateRange::new(
            query.start.unwrap_or(default.start),
            query.end.unwrap_or(default.end),
        )
    }
}

async fn list_events(
    State(state): State<AppState>,
    range: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<Vec<CalendarEvent>>, ApiError> {
    let range = query_params(range)?;
    Ok(Json(state.planner.list(range.into()).await))
}

async fn create_event(
    State(state): State<AppState>,
    body: Result<Json<NewEvent>, JsonRejection>,
) -> Result<(StatusCode, Json<Saved>), ApiError> {
    let event = json_body(body)?.normalized()?;
    Ok((StatusCode::CREATED, Json(state.planner.add(event).await)))
}

async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<EventPatch>, JsonRejection>,
) -> Result<Json<CalendarEvent>, ApiError> {
    let patch = json_body(body)?.normalized()?;
    if patch.is_empty() {
        return Err(ApiError::EmptyPatch);
    }

    Ok(Json(state.planner.update(&id, patch).await?))
}

async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.planner.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportRequest {
    entries: Vec<ImportEntry>,
    #[serde(default)]
    apply_rules: bool,
}

async fn import_schedule(
    State(state): State<AppState>,
    body: Result<Json<ImportRequest>, JsonRejection>,
) -> Result<Json<ImportReport>, ApiError> {
    let request = json_body(body)?;

    let rules = match request.apply_rules {
        true => Some(state.rules.load().await),
        false => None,
    };

    let events = import_events(&request.entries, rules.as_ref())
        .into_iter()
        .filter_map(|event| event.normalized().ok())
        .collect::<Vec<_>>();

    let skipped = request.entries.len() - events.len();
    log::info!(
        "Importing {} roster rows, skipping {skipped}",
        events.len()
    );

    let mut report = state.planner.import(events).await;
    report.skipped = skipped;
    Ok(Json(report))
}

async fn export_events(
    State(state): State<AppState>,
    range: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let range = query_params(range)?;
    let events = state.planner.list(range.into()).await;
    if events.is_empty() {
        return Err(ApiError::NothingToExport);
    }

    let now = Utc::now();
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_file_name(now.date_naive())
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        to_ics(&events, now).to_string(),
    )
        .into_response())
}

async fn get_rules(State(state): State<AppState>) -> Json<MappingRules> {
    Json(state.rules.load().await)
}

async fn put_rules(
    State(state): State<AppState>,
    body: Result<Json<MappingRules>, JsonRejection>,
) -> Result<Json<MappingRules>, ApiError> {
    let rules = json_body(body)?;
    state.rules.save(&rules).await?;
    Ok(Json(rules))
}
