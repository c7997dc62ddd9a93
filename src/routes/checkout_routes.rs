use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState},
    services::booking_service::{self, CheckoutSummary},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/checkout/{appointment_id}", get(checkout))
}

pub async fn checkout(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiOk<CheckoutSummary>>, ApiError> {
    let data = booking_service::checkout_summary(
        state.store.as_ref(),
        appointment_id,
        auth.user.id,
        auth.user.role,
    )
    .await?;
    Ok(Json(ApiOk { data }))
}
