use axum::{Json, Router, extract::State, routing::get};

use crate::{
    error::ApiError,
    models::{ApiOk, AppState, ClinicSettings},
    services::directory_service,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/clinic", get(get_clinic))
}

pub async fn get_clinic(
    State(state): State<AppState>,
) -> Result<Json<ApiOk<ClinicSettings>>, ApiError> {
    let data = directory_service::clinic_settings(state.store.as_ref()).await?;
    Ok(Json(ApiOk { data }))
}
