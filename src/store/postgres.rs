use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, types::Json};
use uuid::Uuid;

use super::{ClinicStore, StoreError};
use crate::models::{
    Appointment, AppointmentDetail, AppointmentFilter, AppointmentStatus, Availability,
    BusinessHours, ClinicSettings, DoctorBrief, DoctorSummary, EmergencyContact, NewAppointment,
    NewAvailability, NewUser, PatientBrief, PaymentMethod, User, UserRole,
};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_write_err(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(db.message().to_string())
        }
        _ => StoreError::Database(e),
    }
}

/* -------------------------
   Row types
--------------------------*/

const USER_COLUMNS: &str = r#"
    user_id, email, password_hash, first_name, last_name, phone, role, avatar,
    date_of_birth, gender, address, city, state, zip_code,
    specialty, license_number, experience, education, certifications, bio, consultation_fee,
    blood_type, allergies, emergency_contact, created_at, updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    role: String,
    avatar: Option<String>,
    date_of_birth: Option<NaiveDate>,
    gender: Option<String>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
    specialty: Option<String>,
    license_number: Option<String>,
    experience: Option<i32>,
    education: Vec<String>,
    certifications: Vec<String>,
    bio: Option<String>,
    consultation_fee: Option<f64>,
    blood_type: Option<String>,
    allergies: Vec<String>,
    emergency_contact: Option<Json<EmergencyContact>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let role: UserRole = r.role.parse().map_err(StoreError::Decode)?;
        Ok(User {
            id: r.user_id,
            email: r.email,
            password_hash: r.password_hash,
            first_name: r.first_name,
            last_name: r.last_name,
            phone: r.phone,
            role,
            avatar: r.avatar,
            date_of_birth: r.date_of_birth,
            gender: r.gender,
            address: r.address,
            city: r.city,
            state: r.state,
            zip_code: r.zip_code,
            specialty: r.specialty,
            license_number: r.license_number,
            experience: r.experience,
            education: r.education,
            certifications: r.certifications,
            bio: r.bio,
            consultation_fee: r.consultation_fee,
            blood_type: r.blood_type,
            allergies: r.allergies,
            emergency_contact: r.emergency_contact.map(|Json(c)| c),
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DoctorSummaryRow {
    user_id: Uuid,
    first_name: String,
    last_name: String,
    specialty: Option<String>,
    consultation_fee: Option<f64>,
    bio: Option<String>,
    experience: Option<i32>,
}

#[derive(Debug, sqlx::FromRow)]
struct AvailabilityRow {
    availability_id: Uuid,
    doctor_id: Uuid,
    day_of_week: i16,
    start_time: String,
    end_time: String,
    break_start_time: Option<String>,
    break_end_time: Option<String>,
    is_active: bool,
}

impl From<AvailabilityRow> for Availability {
    fn from(r: AvailabilityRow) -> Self {
        Availability {
            id: r.availability_id,
            doctor_id: r.doctor_id,
            day_of_week: r.day_of_week,
            start_time: r.start_time,
            end_time: r.end_time,
            break_start_time: r.break_start_time,
            break_end_time: r.break_end_time,
            is_active: r.is_active,
        }
    }
}

const APPOINTMENT_COLUMNS: &str = r#"
    appointment_id, patient_id, doctor_id, appointment_date, appointment_time, appointment_type, status,
    reason, notes, fee, created_at, updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    appointment_id: Uuid,
    patient_id: Uuid,
    doctor_id: Uuid,
    appointment_date: NaiveDate,
    appointment_time: String,
    appointment_type: String,
    status: String,
    reason: Option<String>,
    notes: Option<String>,
    fee: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = StoreError;

    fn try_from(r: AppointmentRow) -> Result<Self, Self::Error> {
        Ok(Appointment {
            id: r.appointment_id,
            patient_id: r.patient_id,
            doctor_id: r.doctor_id,
            date: r.appointment_date,
            time: r.appointment_time,
            appointment_type: r.appointment_type.parse().map_err(StoreError::Decode)?,
            status: r.status.parse().map_err(StoreError::Decode)?,
            reason: r.reason,
            notes: r.notes,
            fee: r.fee,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AppointmentDetailRow {
    #[sqlx(flatten)]
    appointment: AppointmentRow,
    p_first: String,
    p_last: String,
    p_phone: Option<String>,
    p_email: String,
    d_first: String,
    d_last: String,
    d_specialty: Option<String>,
}

impl TryFrom<AppointmentDetailRow> for AppointmentDetail {
    type Error = StoreError;

    fn try_from(r: AppointmentDetailRow) -> Result<Self, Self::Error> {
        Ok(AppointmentDetail {
            appointment: r.appointment.try_into()?,
            patient: PatientBrief {
                first_name: r.p_first,
                last_name: r.p_last,
                phone: r.p_phone,
                email: r.p_email,
            },
            doctor: DoctorBrief {
                first_name: r.d_first,
                last_name: r.d_last,
                specialty: r.d_specialty,
            },
        })
    }
}

const APPOINTMENT_DETAIL_SELECT: &str = r#"
    SELECT
      a.appointment_id, a.patient_id, a.doctor_id, a.appointment_date, a.appointment_time, a.appointment_type,
      a.status, a.reason, a.notes, a.fee, a.created_at, a.updated_at,

      p.first_name AS p_first,
      p.last_name  AS p_last,
      p.phone      AS p_phone,
      p.email      AS p_email,

      d.first_name AS d_first,
      d.last_name  AS d_last,
      d.specialty  AS d_specialty
    FROM appointment a
    JOIN app_user p ON p.user_id = a.patient_id
    JOIN app_user d ON d.user_id = a.doctor_id
"#;

#[derive(Debug, sqlx::FromRow)]
struct ClinicSettingsRow {
    clinic_name: String,
    address: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    website: Option<String>,
    business_hours: Json<BTreeMap<String, BusinessHours>>,
    default_appointment_duration: i32,
    advance_booking_days: i32,
    cancellation_hours: i32,
    accepted_payment_methods: Json<Vec<PaymentMethod>>,
    email_notifications: bool,
    sms_notifications: bool,
}

impl From<ClinicSettingsRow> for ClinicSettings {
    fn from(r: ClinicSettingsRow) -> Self {
        ClinicSettings {
            clinic_name: r.clinic_name,
            address: r.address,
            phone: r.phone,
            email: r.email,
            website: r.website,
            business_hours: r.business_hours.0,
            default_appointment_duration: r.default_appointment_duration,
            advance_booking_days: r.advance_booking_days,
            cancellation_hours: r.cancellation_hours,
            accepted_payment_methods: r.accepted_payment_methods.0,
            email_notifications: r.email_notifications,
            sms_notifications: r.sms_notifications,
        }
    }
}

const CLINIC_SETTINGS_COLUMNS: &str = r#"
    clinic_name, address, phone, email, website, business_hours,
    default_appointment_duration, advance_booking_days, cancellation_hours,
    accepted_payment_methods, email_notifications, sms_notifications
"#;

/* -------------------------
   Store
--------------------------*/

#[async_trait]
impl ClinicStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM app_user WHERE email = $1");
        let row: Option<UserRow> = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM app_user WHERE user_id = $1");
        let row: Option<UserRow> = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn insert_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO app_user
                (email, password_hash, first_name, last_name, phone, role, avatar,
                 date_of_birth, gender, address, city, state, zip_code,
                 specialty, license_number, experience, education, certifications, bio,
                 consultation_fee, blood_type, allergies, emergency_contact)
            VALUES
                ($1, $2, $3, $4, $5, $6, $7,
                 $8, $9, $10, $11, $12, $13,
                 $14, $15, $16, $17, $18, $19,
                 $20, $21, $22, $23)
            RETURNING {USER_COLUMNS}
            "#
        );

        let row: UserRow = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(new_user.phone.as_deref())
            .bind(new_user.role.as_str())
            .bind(new_user.avatar.as_deref())
            .bind(new_user.date_of_birth)
            .bind(new_user.gender.as_deref())
            .bind(new_user.address.as_deref())
            .bind(new_user.city.as_deref())
            .bind(new_user.state.as_deref())
            .bind(new_user.zip_code.as_deref())
            .bind(new_user.specialty.as_deref())
            .bind(new_user.license_number.as_deref())
            .bind(new_user.experience)
            .bind(&new_user.education)
            .bind(&new_user.certifications)
            .bind(new_user.bio.as_deref())
            .bind(new_user.consultation_fee)
            .bind(new_user.blood_type.as_deref())
            .bind(&new_user.allergies)
            .bind(new_user.emergency_contact.map(Json))
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_err)?;

        row.try_into()
    }

    async fn list_doctors(&self) -> Result<Vec<DoctorSummary>, StoreError> {
        let rows: Vec<DoctorSummaryRow> = sqlx::query_as::<_, DoctorSummaryRow>(
            r#"
            SELECT user_id, first_name, last_name, specialty, consultation_fee, bio, experience
            FROM app_user
            WHERE role = 'DOCTOR'
            ORDER BY last_name ASC, first_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| DoctorSummary {
                id: r.user_id,
                first_name: r.first_name,
                last_name: r.last_name,
                specialty: r.specialty,
                consultation_fee: r.consultation_fee,
                bio: r.bio,
                experience: r.experience,
            })
            .collect())
    }

    async fn count_users_by_role(&self, role: UserRole) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM app_user WHERE role = $1")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_availability(&self, doctor_id: Uuid) -> Result<Vec<Availability>, StoreError> {
        let rows: Vec<AvailabilityRow> = sqlx::query_as::<_, AvailabilityRow>(
            r#"
            SELECT availability_id, doctor_id, day_of_week, start_time, end_time,
                   break_start_time, break_end_time, is_active
            FROM availability
            WHERE doctor_id = $1
            ORDER BY day_of_week ASC, start_time ASC
            "#,
        )
        .bind(doctor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Availability::from).collect())
    }

    async fn insert_availability(
        &self,
        new_availability: NewAvailability,
    ) -> Result<Availability, StoreError> {
        let row: AvailabilityRow = sqlx::query_as::<_, AvailabilityRow>(
            r#"
            INSERT INTO availability
                (doctor_id, day_of_week, start_time, end_time, break_start_time, break_end_time, is_active)
            VALUES
                ($1, $2, $3, $4, $5, $6, $7)
            RETURNING availability_id, doctor_id, day_of_week, start_time, end_time,
                      break_start_time, break_end_time, is_active
            "#,
        )
        .bind(new_availability.doctor_id)
        .bind(new_availability.day_of_week)
        .bind(&new_availability.start_time)
        .bind(&new_availability.end_time)
        .bind(new_availability.break_start_time.as_deref())
        .bind(new_availability.break_end_time.as_deref())
        .bind(new_availability.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_err)?;

        Ok(row.into())
    }

    async fn insert_appointment(
        &self,
        new_appointment: NewAppointment,
    ) -> Result<Appointment, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO appointment
                (patient_id, doctor_id, appointment_date, appointment_time, appointment_type, status, reason, notes, fee)
            VALUES
                ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        );

        let row: AppointmentRow = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(new_appointment.patient_id)
            .bind(new_appointment.doctor_id)
            .bind(new_appointment.date)
            .bind(&new_appointment.time)
            .bind(new_appointment.appointment_type.as_str())
            .bind(new_appointment.status.as_str())
            .bind(new_appointment.reason.as_deref())
            .bind(new_appointment.notes.as_deref())
            .bind(new_appointment.fee)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_err)?;

        row.try_into()
    }

    async fn find_appointment(&self, id: Uuid) -> Result<Option<AppointmentDetail>, StoreError> {
        let sql = format!("{APPOINTMENT_DETAIL_SELECT} WHERE a.appointment_id = $1");
        let row: Option<AppointmentDetailRow> = sqlx::query_as::<_, AppointmentDetailRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(AppointmentDetail::try_from).transpose()
    }

    async fn slot_taken(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: &str,
    ) -> Result<bool, StoreError> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
              SELECT 1
              FROM appointment
              WHERE doctor_id = $1
                AND appointment_date = $2
                AND appointment_time = $3
                AND status <> 'CANCELLED'
            )
            "#,
        )
        .bind(doctor_id)
        .bind(date)
        .bind(time)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn list_appointments(
        &self,
        filter: AppointmentFilter,
    ) -> Result<Vec<AppointmentDetail>, StoreError> {
        let sql = format!(
            r#"
            {APPOINTMENT_DETAIL_SELECT}
            WHERE ($1::uuid IS NULL OR a.doctor_id = $1)
              AND ($2::uuid IS NULL OR a.patient_id = $2)
              AND ($3::date IS NULL OR a.appointment_date = $3)
            ORDER BY a.appointment_date ASC, a.created_at ASC
            "#
        );

        let rows: Vec<AppointmentDetailRow> = sqlx::query_as::<_, AppointmentDetailRow>(&sql)
            .bind(filter.doctor_id)
            .bind(filter.patient_id)
            .bind(filter.date)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(AppointmentDetail::try_from).collect()
    }

    async fn update_appointment_status(
        &self,
        id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Option<Appointment>, StoreError> {
        let sql = format!(
            r#"
            UPDATE appointment
            SET status = $1,
                updated_at = now()
            WHERE appointment_id = $2
              AND status = $3
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        );

        let row: Option<AppointmentRow> = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(to.as_str())
            .bind(id)
            .bind(from.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_err)?;

        row.map(Appointment::try_from).transpose()
    }

    async fn load_clinic_settings(&self) -> Result<Option<ClinicSettings>, StoreError> {
        let sql = format!(
            "SELECT {CLINIC_SETTINGS_COLUMNS} FROM clinic_settings WHERE singleton_id = TRUE"
        );
        let row: Option<ClinicSettingsRow> = sqlx::query_as::<_, ClinicSettingsRow>(&sql)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ClinicSettings::from))
    }

    async fn save_clinic_settings(
        &self,
        settings: ClinicSettings,
    ) -> Result<ClinicSettings, StoreError> {
        // Upsert singleton row (safe even if missing)
        let sql = format!(
            r#"
            INSERT INTO clinic_settings
                (singleton_id, clinic_name, address, phone, email, website, business_hours,
                 default_appointment_duration, advance_booking_days, cancellation_hours,
                 accepted_payment_methods, email_notifications, sms_notifications)
            VALUES
                (TRUE, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (singleton_id)
            DO UPDATE SET
                clinic_name = EXCLUDED.clinic_name,
                address = EXCLUDED.address,
                phone = EXCLUDED.phone,
                email = EXCLUDED.email,
                website = EXCLUDED.website,
                business_hours = EXCLUDED.business_hours,
                default_appointment_duration = EXCLUDED.default_appointment_duration,
                advance_booking_days = EXCLUDED.advance_booking_days,
                cancellation_hours = EXCLUDED.cancellation_hours,
                accepted_payment_methods = EXCLUDED.accepted_payment_methods,
                email_notifications = EXCLUDED.email_notifications,
                sms_notifications = EXCLUDED.sms_notifications,
                updated_at = now()
            RETURNING {CLINIC_SETTINGS_COLUMNS}
            "#
        );

        let row: ClinicSettingsRow = sqlx::query_as::<_, ClinicSettingsRow>(&sql)
            .bind(&settings.clinic_name)
            .bind(settings.address.as_deref())
            .bind(settings.phone.as_deref())
            .bind(settings.email.as_deref())
            .bind(settings.website.as_deref())
            .bind(Json(&settings.business_hours))
            .bind(settings.default_appointment_duration)
            .bind(settings.advance_booking_days)
            .bind(settings.cancellation_hours)
            .bind(Json(&settings.accepted_payment_methods))
            .bind(settings.email_notifications)
            .bind(settings.sms_notifications)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_err)?;

        Ok(row.into())
    }
}
