use axum::{
    Form, Json, Router,
    extract::{Path, State},
    routing::{get, patch},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{ActionError, ApiError},
    middleware::auth_context::AuthContext,
    models::{
        ActionResponse, ApiOk, AppState, Appointment, AppointmentDetail, AppointmentStatus,
        BookingForm, UserRole,
    },
    services::{booking_service, directory_service},
};

pub fn router() -> Router<AppState> {
    Router::new()
        // /api/v1/appointments
        .route("/", get(list_appointments).post(book_appointment))
        // /api/v1/appointments/{appointment_id}/status
        .route("/{appointment_id}/status", patch(update_status))
}

/// Public booking form. No session required; the patient is matched or
/// provisioned by email.
pub async fn book_appointment(
    State(state): State<AppState>,
    Form(form): Form<BookingForm>,
) -> Result<Json<ActionResponse>, ActionError> {
    let appointment = booking_service::book_appointment(state.store.as_ref(), &form).await?;
    Ok(Json(ActionResponse::booked(appointment.id)))
}

pub async fn list_appointments(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Json<ApiOk<Vec<AppointmentDetail>>> {
    let viewer = match auth.user.role {
        UserRole::Admin => None,
        role => Some((auth.user.id, role)),
    };
    let data = directory_service::get_appointments(state.store.as_ref(), viewer).await;
    Json(ApiOk { data })
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ApiOk<Appointment>>, ApiError> {
    auth.ensure_admin()?;

    let next: AppointmentStatus = req
        .status
        .parse()
        .map_err(|e: String| ApiError::BadRequest("VALIDATION_ERROR", e))?;

    let data = booking_service::update_status(state.store.as_ref(), appointment_id, next).await?;
    Ok(Json(ApiOk { data }))
}
