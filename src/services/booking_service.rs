use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::hash_password,
    error::{ActionError, ApiError},
    models::{
        Appointment, AppointmentStatus, AppointmentType, BookingForm, NewAppointment, NewUser,
        PaymentMethod, User, UserRole,
    },
    services::directory_service::clinic_settings,
    store::{ClinicStore, StoreError},
    validation::{ValidBooking, validate_booking},
};

/// Fee charged when the doctor has no consultation fee configured.
pub const DEFAULT_CONSULTATION_FEE: f64 = 150.0;

/// Password given to patients provisioned by a booking. They are expected
/// to reset it before signing in.
pub const PLACEHOLDER_PASSWORD: &str = "temp123";

async fn find_or_create_patient(
    store: &dyn ClinicStore,
    booking: &ValidBooking,
) -> Result<User, ActionError> {
    if let Some(existing) = store.find_user_by_email(&booking.email).await? {
        return Ok(existing);
    }

    let password_hash = hash_password(PLACEHOLDER_PASSWORD).map_err(ActionError::Unexpected)?;
    let created = store
        .insert_user(NewUser {
            email: booking.email.clone(),
            password_hash,
            first_name: booking.first_name.clone(),
            last_name: booking.last_name.clone(),
            phone: Some(booking.phone.clone()),
            role: UserRole::Patient,
            ..Default::default()
        })
        .await;

    match created {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "provisioned patient from booking");
            Ok(user)
        }
        // a concurrent booking created the same email first
        Err(StoreError::Conflict(_)) => store
            .find_user_by_email(&booking.email)
            .await?
            .ok_or_else(|| ActionError::Unexpected(anyhow::anyhow!("patient vanished after conflict"))),
        Err(e) => Err(e.into()),
    }
}

/// Validate the booking form, find or provision the patient by email and
/// create a `PENDING` appointment priced at the doctor's consultation fee.
///
/// The patient is created before the doctor lookup and is kept when a
/// later step fails. A slot already held by a live appointment is
/// rejected.
pub async fn book_appointment(
    store: &dyn ClinicStore,
    form: &BookingForm,
) -> Result<Appointment, ActionError> {
    let booking = validate_booking(form)?;

    let patient = find_or_create_patient(store, &booking).await?;

    let doctor = match Uuid::parse_str(&booking.doctor_id) {
        Ok(id) => store.find_user_by_id(id).await?,
        Err(_) => None,
    };
    let Some(doctor) = doctor.filter(|d| d.role == UserRole::Doctor) else {
        return Err(ActionError::DoctorNotFound);
    };

    if store.slot_taken(doctor.id, booking.date, &booking.time).await? {
        return Err(ActionError::SlotTaken);
    }

    let appointment = store
        .insert_appointment(NewAppointment {
            patient_id: patient.id,
            doctor_id: doctor.id,
            date: booking.date,
            time: booking.time.clone(),
            appointment_type: AppointmentType::from_reason(&booking.reason),
            status: AppointmentStatus::Pending,
            reason: Some(booking.reason.clone()),
            notes: booking.notes.clone(),
            fee: doctor.consultation_fee.unwrap_or(DEFAULT_CONSULTATION_FEE),
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ActionError::SlotTaken,
            other => other.into(),
        })?;

    tracing::info!(
        appointment_id = %appointment.id,
        doctor_id = %doctor.id,
        date = %appointment.date,
        time = %appointment.time,
        "appointment booked"
    );
    Ok(appointment)
}

/// Admin status change, restricted to the forward lifecycle.
pub async fn update_status(
    store: &dyn ClinicStore,
    appointment_id: Uuid,
    next: AppointmentStatus,
) -> Result<Appointment, ApiError> {
    let current = store
        .find_appointment(appointment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("NOT_FOUND", "Appointment not found".into()))?;

    let from = current.appointment.status;
    if !from.can_transition_to(next) {
        return Err(ApiError::Conflict(
            "INVALID_TRANSITION",
            format!("Cannot change status from {} to {}", from.as_str(), next.as_str()),
        ));
    }

    let updated = store
        .update_appointment_status(appointment_id, from, next)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict(
                "STATUS_CHANGED",
                "Appointment status changed, reload and try again".into(),
            )
        })?;

    tracing::info!(
        appointment_id = %appointment_id,
        from = from.as_str(),
        to = next.as_str(),
        "appointment status changed"
    );
    Ok(updated)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub appointment_id: Uuid,
    pub doctor: String,
    pub specialty: Option<String>,
    pub date: chrono::NaiveDate,
    pub time: String,
    pub duration_minutes: i32,
    pub fee: f64,
    pub status: AppointmentStatus,
    pub accepted_payment_methods: Vec<PaymentMethod>,
}

/// Summary shown on the checkout page. Only the booking patient and
/// admins may view it.
pub async fn checkout_summary(
    store: &dyn ClinicStore,
    appointment_id: Uuid,
    viewer_id: Uuid,
    viewer_role: UserRole,
) -> Result<CheckoutSummary, ApiError> {
    let detail = store
        .find_appointment(appointment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("NOT_FOUND", "Appointment not found".into()))?;

    if viewer_role != UserRole::Admin && detail.appointment.patient_id != viewer_id {
        return Err(ApiError::Forbidden(
            "FORBIDDEN",
            "You can only check out your own appointments".into(),
        ));
    }

    let settings = clinic_settings(store).await?;

    Ok(CheckoutSummary {
        appointment_id,
        doctor: format!("Dr. {} {}", detail.doctor.first_name, detail.doctor.last_name),
        specialty: detail.doctor.specialty,
        date: detail.appointment.date,
        time: detail.appointment.time,
        duration_minutes: settings.default_appointment_duration,
        fee: detail.appointment.fee,
        status: detail.appointment.status,
        accepted_payment_methods: settings.accepted_payment_methods,
    })
}
