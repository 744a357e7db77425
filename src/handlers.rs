use crate::activity::build_activity;
use crate::aggregate::recent_activity;
use crate::errors::AppError;
use crate::manage;
use crate::models::{
    ActivityStats, ProgressUpdateRequest, ReadingActivity, ReadingStateDetail, RepairReport,
};
use crate::repair::repair_all;
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Json,
};
use tracing::error;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let store = state.store.as_ref();
    match recent_activity(store, store, store, state.limits).await {
        Ok(rows) => Html(render_index(Ok(rows.as_slice()))),
        Err(err) => {
            error!("failed to build recent activity: {err}");
            Html(render_index(Err(&err.to_string())))
        }
    }
}

pub async fn get_recent(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReadingActivity>>, AppError> {
    let store = state.store.as_ref();
    let rows = recent_activity(store, store, store, state.limits).await?;
    Ok(Json(rows))
}

pub async fn repair(State(state): State<AppState>) -> Result<Json<RepairReport>, AppError> {
    let store = state.store.as_ref();
    Ok(Json(repair_all(store, store).await?))
}

pub async fn get_reading_state(
    State(state): State<AppState>,
    Path((owner_id, state_id)): Path<(String, String)>,
) -> Result<Json<ReadingStateDetail>, AppError> {
    let store = state.store.as_ref();
    let detail = manage::reading_state_detail(store, store, store, &owner_id, &state_id).await?;
    Ok(Json(detail))
}

pub async fn update_progress(
    State(state): State<AppState>,
    Path((owner_id, state_id)): Path<(String, String)>,
    Json(payload): Json<ProgressUpdateRequest>,
) -> Result<StatusCode, AppError> {
    manage::update_progress(state.store.as_ref(), &owner_id, &state_id, payload.percent).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_reading_state(
    State(state): State<AppState>,
    Path((owner_id, state_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    manage::delete_reading_state(state.store.as_ref(), &owner_id, &state_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<ActivityStats>, AppError> {
    let store = state.store.as_ref();
    Ok(Json(build_activity(store, store, store).await?))
}
