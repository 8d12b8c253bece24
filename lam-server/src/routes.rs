use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use chrono::{SecondsFormat, Utc};
use lam_core::{JsonFile, ListQuery, ModerationAction, RankingService, Submission};
use log::info;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{error::AppError, state::AppState};

pub type SharedState = Arc<AppState>;
type ApiResult = Result<Json<Value>, AppError>;

/// Raw `GET /api/rankings/list` parameters. Kept as strings so that a bad
/// number falls back to its default instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    sinner: Option<String>,
    floor_level: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
    page: Option<String>,
    limit: Option<String>,
    page_size: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ModerationBody {
    #[serde(default)]
    action: Option<String>,
}

fn parse_id(raw: &str) -> Result<u64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::InvalidId(raw.to_string()))
}

/// Run a store operation on the blocking pool, holding the service lock for
/// the whole call.
async fn with_service<T, F>(state: &SharedState, op: F) -> Result<T, AppError>
where
    F: FnOnce(&mut RankingService<JsonFile>) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || op(&mut state.service.blocking_lock())).await?
}

pub async fn submit_handler(
    State(state): State<SharedState>,
    payload: Result<Json<Submission>, JsonRejection>,
) -> ApiResult {
    let Json(submission) = payload?;
    let id = with_service(&state, move |service| Ok(service.submit(submission)?)).await?;

    Ok(Json(json!({
        "code": 200,
        "success": true,
        "message": "提交成功！请等待审核",
        "data": { "id": id },
    })))
}

pub async fn list_handler(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> ApiResult {
    let query = ListQuery::from_params(
        params.sinner.as_deref(),
        params.floor_level.as_deref(),
        params.sort_by.as_deref(),
        params.sort_order.as_deref(),
        params.page.as_deref(),
        params.limit.as_deref(),
        params.page_size.as_deref(),
    )?;
    let page = with_service(&state, move |service| Ok(service.list(&query)?)).await?;

    Ok(Json(json!({
        "code": 200,
        "success": true,
        "data": page,
    })))
}

pub async fn pending_handler(State(state): State<SharedState>) -> ApiResult {
    let records = with_service(&state, |service| Ok(service.pending()?)).await?;
    Ok(Json(json!({ "code": 200, "data": records })))
}

pub async fn get_handler(State(state): State<SharedState>, Path(id): Path<String>) -> ApiResult {
    let id = parse_id(&id)?;
    let record = with_service(&state, move |service| Ok(service.get(id)?)).await?;
    Ok(Json(json!({ "code": 200, "data": record })))
}

pub async fn delete_handler(State(state): State<SharedState>, Path(id): Path<String>) -> ApiResult {
    let id = parse_id(&id)?;
    with_service(&state, move |service| Ok(service.delete(id)?)).await?;
    Ok(Json(json!({ "code": 200, "message": "删除成功" })))
}

pub async fn moderate_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<ModerationBody>, JsonRejection>,
) -> ApiResult {
    let id = parse_id(&id)?;

    let action = with_service(&state, move |service| {
        // An unknown record is reported before a bad body or action.
        service.get(id)?;
        let Json(body) = payload?;
        let action: ModerationAction = body.action.unwrap_or_default().parse()?;
        let record = service.moderate(id, action)?;
        info!("Moderated record #{id}: {}", record.status);
        Ok(action)
    })
    .await?;

    let message = match action {
        ModerationAction::Approve => "审核通过",
        ModerationAction::Reject => "已拒绝",
    };
    Ok(Json(json!({ "code": 200, "message": message })))
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "code": 200,
        "message": "LAM 排行榜 API 运行正常",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_numeric() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(matches!(parse_id("abc"), Err(AppError::InvalidId(raw)) if raw == "abc"));
        assert!(parse_id("-1").is_err());
    }
}
