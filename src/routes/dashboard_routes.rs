use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState},
    services::dashboard_service::{self, DashboardOverview, DashboardRow, StatusFilter},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(appointments))
        .route("/overview", get(overview))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DashboardQuery {
    pub search: String,
    pub status: String,
}

pub async fn appointments(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(q): Query<DashboardQuery>,
) -> Result<Json<ApiOk<Vec<DashboardRow>>>, ApiError> {
    auth.ensure_staff()?;

    let status: StatusFilter = q
        .status
        .parse()
        .map_err(|e: String| ApiError::BadRequest("VALIDATION_ERROR", e))?;

    let data = dashboard_service::appointment_rows(
        state.store.as_ref(),
        auth.user.id,
        auth.user.role,
        &q.search,
        status,
    )
    .await;
    Ok(Json(ApiOk { data }))
}

pub async fn overview(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ApiOk<DashboardOverview>>, ApiError> {
    auth.ensure_staff()?;

    let today = Utc::now().date_naive();
    let data =
        dashboard_service::overview(state.store.as_ref(), auth.user.id, auth.user.role, today)
            .await?;
    Ok(Json(ApiOk { data }))
}
