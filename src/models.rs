use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::ClinicStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ClinicStore>,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
    pub allow_admin_signup: bool,
}

/* -------------------------
   Enums
--------------------------*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    Patient,
    Doctor,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Patient => "PATIENT",
            UserRole::Doctor => "DOCTOR",
            UserRole::Admin => "ADMIN",
        }
    }
}

/// Accepts the stored upper-case form as well as the lower-case values
/// the sign-up form posts.
impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PATIENT" => Ok(UserRole::Patient),
            "DOCTOR" => Ok(UserRole::Doctor),
            "ADMIN" => Ok(UserRole::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentType {
    Consultation,
    FollowUp,
    CheckUp,
    Emergency,
}

impl AppointmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentType::Consultation => "CONSULTATION",
            AppointmentType::FollowUp => "FOLLOW_UP",
            AppointmentType::CheckUp => "CHECK_UP",
            AppointmentType::Emergency => "EMERGENCY",
        }
    }

    /// Maps the booking form's reason code. Unknown codes (including
    /// `other`) book a consultation.
    pub fn from_reason(reason: &str) -> Self {
        match reason {
            "checkup" => AppointmentType::CheckUp,
            "followup" => AppointmentType::FollowUp,
            "emergency" => AppointmentType::Emergency,
            _ => AppointmentType::Consultation,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AppointmentType::Consultation => "Consultation",
            AppointmentType::FollowUp => "Follow-up",
            AppointmentType::CheckUp => "Check-up",
            AppointmentType::Emergency => "Emergency",
        }
    }
}

impl FromStr for AppointmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONSULTATION" => Ok(AppointmentType::Consultation),
            "FOLLOW_UP" => Ok(AppointmentType::FollowUp),
            "CHECK_UP" => Ok(AppointmentType::CheckUp),
            "EMERGENCY" => Ok(AppointmentType::Emergency),
            other => Err(format!("unknown appointment type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::Completed => "COMPLETED",
        }
    }

    /// Admin-driven lifecycle. Cancelled and completed are terminal.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(AppointmentStatus::Pending),
            "CONFIRMED" => Ok(AppointmentStatus::Confirmed),
            "CANCELLED" => Ok(AppointmentStatus::Cancelled),
            "COMPLETED" => Ok(AppointmentStatus::Completed),
            other => Err(format!("unknown appointment status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Insurance,
}

/* -------------------------
   Users
--------------------------*/

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: String,
    pub relationship: String,
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub avatar: Option<String>,

    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,

    // doctor profile
    pub specialty: Option<String>,
    pub license_number: Option<String>,
    pub experience: Option<i32>,
    pub education: Vec<String>,
    pub certifications: Vec<String>,
    pub bio: Option<String>,
    pub consultation_fee: Option<f64>,

    // patient medical metadata
    pub blood_type: Option<String>,
    pub allergies: Vec<String>,
    pub emergency_contact: Option<EmergencyContact>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert shape for a user. Profile fields default to empty.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub avatar: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub specialty: Option<String>,
    pub license_number: Option<String>,
    pub experience: Option<i32>,
    pub education: Vec<String>,
    pub certifications: Vec<String>,
    pub bio: Option<String>,
    pub consultation_fee: Option<f64>,
    pub blood_type: Option<String>,
    pub allergies: Vec<String>,
    pub emergency_contact: Option<EmergencyContact>,
}

/// Reduced projection returned by session lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub avatar: Option<String>,
}

impl From<&User> for CurrentUser {
    fn from(u: &User) -> Self {
        CurrentUser {
            id: u.id,
            email: u.email.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            role: u.role,
            avatar: u.avatar.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub specialty: Option<String>,
    pub consultation_fee: Option<f64>,
    pub bio: Option<String>,
    pub experience: Option<i32>,
}

impl From<&User> for DoctorSummary {
    fn from(u: &User) -> Self {
        DoctorSummary {
            id: u.id,
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            specialty: u.specialty.clone(),
            consultation_fee: u.consultation_fee,
            bio: u.bio.clone(),
            experience: u.experience,
        }
    }
}

/* -------------------------
   Availability
--------------------------*/

/// Recurring weekly window. `day_of_week` counts from Sunday = 0 and the
/// times are 24h `HH:MM` strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: i16,
    pub start_time: String,
    pub end_time: String,
    pub break_start_time: Option<String>,
    pub break_end_time: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewAvailability {
    pub doctor_id: Uuid,
    pub day_of_week: i16,
    pub start_time: String,
    pub end_time: String,
    pub break_start_time: Option<String>,
    pub break_end_time: Option<String>,
    pub is_active: bool,
}

/* -------------------------
   Appointments
--------------------------*/

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub fee: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub fee: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientBrief {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorBrief {
    pub first_name: String,
    pub last_name: String,
    pub specialty: Option<String>,
}

/// Appointment joined with patient and doctor display fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDetail {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient: PatientBrief,
    pub doctor: DoctorBrief,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppointmentFilter {
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
}

/* -------------------------
   Clinic settings
--------------------------*/

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BusinessHours {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub closed: bool,
}

impl BusinessHours {
    pub fn open(open: &str, close: &str) -> Self {
        BusinessHours {
            open: Some(open.to_string()),
            close: Some(close.to_string()),
            closed: false,
        }
    }

    pub fn closed() -> Self {
        BusinessHours {
            open: None,
            close: None,
            closed: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClinicSettings {
    pub clinic_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    /// Keyed by lower-case weekday name.
    pub business_hours: BTreeMap<String, BusinessHours>,
    pub default_appointment_duration: i32,
    pub advance_booking_days: i32,
    pub cancellation_hours: i32,
    pub accepted_payment_methods: Vec<PaymentMethod>,
    pub email_notifications: bool,
    pub sms_notifications: bool,
}

impl Default for ClinicSettings {
    fn default() -> Self {
        ClinicSettings {
            clinic_name: "Clinic".to_string(),
            address: None,
            phone: None,
            email: None,
            website: None,
            business_hours: BTreeMap::new(),
            default_appointment_duration: 30,
            advance_booking_days: 30,
            cancellation_hours: 24,
            accepted_payment_methods: vec![PaymentMethod::CreditCard],
            email_notifications: true,
            sms_notifications: false,
        }
    }
}

/* -------------------------
   Form DTOs
--------------------------*/

// Missing fields deserialize as empty strings so validation, not the
// extractor, reports them.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignUpForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BookingForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub doctor_id: String,
    pub date: String,
    pub time: String,
    pub reason: String,
    pub notes: Option<String>,
}

/* -------------------------
   Action results
--------------------------*/

/// Result shape returned by every form action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<Uuid>,
}

impl ActionResponse {
    pub fn ok() -> Self {
        ActionResponse {
            success: true,
            error: None,
            appointment_id: None,
        }
    }

    pub fn booked(appointment_id: Uuid) -> Self {
        ActionResponse {
            success: true,
            error: None,
            appointment_id: Some(appointment_id),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ActionResponse {
            success: false,
            error: Some(message.into()),
            appointment_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiOk<T> {
    pub data: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_form_values() {
        assert_eq!("patient".parse::<UserRole>().unwrap(), UserRole::Patient);
        assert_eq!("DOCTOR".parse::<UserRole>().unwrap(), UserRole::Doctor);
        assert!("nurse".parse::<UserRole>().is_err());
    }

    #[test]
    fn reason_codes_map_to_types() {
        assert_eq!(AppointmentType::from_reason("checkup"), AppointmentType::CheckUp);
        assert_eq!(AppointmentType::from_reason("followup"), AppointmentType::FollowUp);
        assert_eq!(AppointmentType::from_reason("emergency"), AppointmentType::Emergency);
        assert_eq!(AppointmentType::from_reason("other"), AppointmentType::Consultation);
        assert_eq!(AppointmentType::from_reason("???"), AppointmentType::Consultation);
    }

    #[test]
    fn status_lifecycle() {
        use AppointmentStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Completed.can_transition_to(Cancelled));
    }

    #[test]
    fn action_response_omits_empty_fields() {
        let json = serde_json::to_value(ActionResponse::failure("Doctor not found")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "Doctor not found"}));

        let id = Uuid::new_v4();
        let json = serde_json::to_value(ActionResponse::booked(id)).unwrap();
        assert_eq!(json["appointmentId"], serde_json::json!(id.to_string()));
    }
}
