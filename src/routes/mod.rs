use crate::models::AppState;
use axum::Router;

pub mod appointment_routes;
pub mod auth_routes;
pub mod checkout_routes;
pub mod clinic_routes;
pub mod dashboard_routes;
pub mod doctor_routes;
pub mod health_routes;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1/auth", auth_routes::router())
        .nest("/api/v1/appointments", appointment_routes::router())
        .nest("/api/v1/doctors", doctor_routes::router())
        .nest("/api/v1/dashboard", dashboard_routes::router())
        .nest("/api/v1", clinic_routes::router())
        .nest("/api/v1", checkout_routes::router())
        .nest("/api", health_routes::router())
        .with_state(state)
}
