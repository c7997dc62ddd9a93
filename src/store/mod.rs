//! Persistence seam. Handlers receive an `Arc<dyn ClinicStore>` through
//! `AppState` instead of reaching for a process-wide client.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentDetail, AppointmentFilter, AppointmentStatus, Availability,
    ClinicSettings, DoctorSummary, NewAppointment, NewAvailability, NewUser, User, UserRole,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("db error: {0}")]
    Database(#[from] sqlx::Error),

    /// A unique constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("row decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ClinicStore: Send + Sync {
    /// Cheap connectivity check for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn close(&self);

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Fails with `StoreError::Conflict` when the email is taken.
    async fn insert_user(&self, new_user: NewUser) -> Result<User, StoreError>;

    async fn list_doctors(&self) -> Result<Vec<DoctorSummary>, StoreError>;

    async fn count_users_by_role(&self, role: UserRole) -> Result<i64, StoreError>;

    async fn list_availability(&self, doctor_id: Uuid) -> Result<Vec<Availability>, StoreError>;

    async fn insert_availability(
        &self,
        new_availability: NewAvailability,
    ) -> Result<Availability, StoreError>;

    /// Fails with `StoreError::Conflict` when a live appointment already
    /// holds the doctor's date and time.
    async fn insert_appointment(
        &self,
        new_appointment: NewAppointment,
    ) -> Result<Appointment, StoreError>;

    async fn find_appointment(&self, id: Uuid) -> Result<Option<AppointmentDetail>, StoreError>;

    /// True when a non-cancelled appointment occupies the slot.
    async fn slot_taken(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: &str,
    ) -> Result<bool, StoreError>;

    /// Ordered by date ascending, then creation time.
    async fn list_appointments(
        &self,
        filter: AppointmentFilter,
    ) -> Result<Vec<AppointmentDetail>, StoreError>;

    /// Compare-and-set: moves the appointment to `to` only while it is
    /// still in `from`. `None` when the id is unknown or the status moved.
    async fn update_appointment_status(
        &self,
        id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Option<Appointment>, StoreError>;

    async fn load_clinic_settings(&self) -> Result<Option<ClinicSettings>, StoreError>;

    async fn save_clinic_settings(
        &self,
        settings: ClinicSettings,
    ) -> Result<ClinicSettings, StoreError>;
}
