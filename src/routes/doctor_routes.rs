use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{ApiOk, AppState, Availability, DoctorSummary},
    services::directory_service,
    validation::parse_booking_date,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_doctors))
        .route("/{doctor_id}/availability", get(doctor_availability))
        .route("/{doctor_id}/slots", get(doctor_slots))
}

pub async fn list_doctors(State(state): State<AppState>) -> Json<ApiOk<Vec<DoctorSummary>>> {
    let data = directory_service::get_doctors(state.store.as_ref()).await;
    Json(ApiOk { data })
}

pub async fn doctor_availability(
    State(state): State<AppState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<ApiOk<Vec<Availability>>>, ApiError> {
    let data = state.store.list_availability(doctor_id).await?;
    Ok(Json(ApiOk { data }))
}

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SlotsData {
    pub date: chrono::NaiveDate,
    pub slots: Vec<String>,
}

pub async fn doctor_slots(
    State(state): State<AppState>,
    Path(doctor_id): Path<Uuid>,
    Query(q): Query<SlotsQuery>,
) -> Result<Json<ApiOk<SlotsData>>, ApiError> {
    let date = q
        .date
        .as_deref()
        .and_then(parse_booking_date)
        .ok_or_else(|| {
            ApiError::BadRequest("VALIDATION_ERROR", "date must be YYYY-MM-DD".into())
        })?;

    let store = state.store.as_ref();
    let step = directory_service::clinic_settings(store)
        .await?
        .default_appointment_duration
        .max(1) as u32;
    let slots = directory_service::available_slots(store, doctor_id, date, step).await?;

    Ok(Json(ApiOk {
        data: SlotsData { date, slots },
    }))
}
