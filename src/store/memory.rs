use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ClinicStore, StoreError};
use crate::models::{
    Appointment, AppointmentDetail, AppointmentFilter, AppointmentStatus, Availability,
    ClinicSettings, DoctorBrief, DoctorSummary, NewAppointment, NewAvailability, NewUser,
    PatientBrief, User, UserRole,
};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    availability: Vec<Availability>,
    appointments: Vec<Appointment>,
    settings: Option<ClinicSettings>,
}

/// In-process store with the same uniqueness rules as the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn detail_for(inner: &Inner, appointment: &Appointment) -> Result<AppointmentDetail, StoreError> {
    let patient = inner
        .users
        .iter()
        .find(|u| u.id == appointment.patient_id)
        .ok_or_else(|| StoreError::Decode(format!("missing patient {}", appointment.patient_id)))?;
    let doctor = inner
        .users
        .iter()
        .find(|u| u.id == appointment.doctor_id)
        .ok_or_else(|| StoreError::Decode(format!("missing doctor {}", appointment.doctor_id)))?;

    Ok(AppointmentDetail {
        appointment: appointment.clone(),
        patient: PatientBrief {
            first_name: patient.first_name.clone(),
            last_name: patient.last_name.clone(),
            phone: patient.phone.clone(),
            email: patient.email.clone(),
        },
        doctor: DoctorBrief {
            first_name: doctor.first_name.clone(),
            last_name: doctor.last_name.clone(),
            specialty: doctor.specialty.clone(),
        },
    })
}

fn occupies(a: &Appointment, doctor_id: Uuid, date: NaiveDate, time: &str) -> bool {
    a.doctor_id == doctor_id
        && a.date == date
        && a.time == time
        && a.status != AppointmentStatus::Cancelled
}

#[async_trait]
impl ClinicStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&self) {}

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == new_user.email) {
            return Err(StoreError::Conflict(format!(
                "email already registered: {}",
                new_user.email
            )));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            phone: new_user.phone,
            role: new_user.role,
            avatar: new_user.avatar,
            date_of_birth: new_user.date_of_birth,
            gender: new_user.gender,
            address: new_user.address,
            city: new_user.city,
            state: new_user.state,
            zip_code: new_user.zip_code,
            specialty: new_user.specialty,
            license_number: new_user.license_number,
            experience: new_user.experience,
            education: new_user.education,
            certifications: new_user.certifications,
            bio: new_user.bio,
            consultation_fee: new_user.consultation_fee,
            blood_type: new_user.blood_type,
            allergies: new_user.allergies,
            emergency_contact: new_user.emergency_contact,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn list_doctors(&self) -> Result<Vec<DoctorSummary>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .filter(|u| u.role == UserRole::Doctor)
            .map(DoctorSummary::from)
            .collect())
    }

    async fn count_users_by_role(&self, role: UserRole) -> Result<i64, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().filter(|u| u.role == role).count() as i64)
    }

    async fn list_availability(&self, doctor_id: Uuid) -> Result<Vec<Availability>, StoreError> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Availability> = inner
            .availability
            .iter()
            .filter(|a| a.doctor_id == doctor_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.day_of_week
                .cmp(&b.day_of_week)
                .then_with(|| a.start_time.cmp(&b.start_time))
        });
        Ok(rows)
    }

    async fn insert_availability(
        &self,
        new_availability: NewAvailability,
    ) -> Result<Availability, StoreError> {
        let mut inner = self.inner.write().await;
        let row = Availability {
            id: Uuid::new_v4(),
            doctor_id: new_availability.doctor_id,
            day_of_week: new_availability.day_of_week,
            start_time: new_availability.start_time,
            end_time: new_availability.end_time,
            break_start_time: new_availability.break_start_time,
            break_end_time: new_availability.break_end_time,
            is_active: new_availability.is_active,
        };
        inner.availability.push(row.clone());
        Ok(row)
    }

    async fn insert_appointment(
        &self,
        new_appointment: NewAppointment,
    ) -> Result<Appointment, StoreError> {
        let mut inner = self.inner.write().await;
        if new_appointment.status != AppointmentStatus::Cancelled
            && inner.appointments.iter().any(|a| {
                occupies(
                    a,
                    new_appointment.doctor_id,
                    new_appointment.date,
                    &new_appointment.time,
                )
            })
        {
            return Err(StoreError::Conflict("appointment slot already taken".into()));
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: new_appointment.patient_id,
            doctor_id: new_appointment.doctor_id,
            date: new_appointment.date,
            time: new_appointment.time,
            appointment_type: new_appointment.appointment_type,
            status: new_appointment.status,
            reason: new_appointment.reason,
            notes: new_appointment.notes,
            fee: new_appointment.fee,
            created_at: now,
            updated_at: now,
        };
        inner.appointments.push(appointment.clone());
        Ok(appointment)
    }

    async fn find_appointment(&self, id: Uuid) -> Result<Option<AppointmentDetail>, StoreError> {
        let inner = self.inner.read().await;
        match inner.appointments.iter().find(|a| a.id == id) {
            Some(a) => Ok(Some(detail_for(&inner, a)?)),
            None => Ok(None),
        }
    }

    async fn slot_taken(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: &str,
    ) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .appointments
            .iter()
            .any(|a| occupies(a, doctor_id, date, time)))
    }

    async fn list_appointments(
        &self,
        filter: AppointmentFilter,
    ) -> Result<Vec<AppointmentDetail>, StoreError> {
        let inner = self.inner.read().await;
        let mut matching: Vec<&Appointment> = inner
            .appointments
            .iter()
            .filter(|a| filter.doctor_id.is_none_or(|id| a.doctor_id == id))
            .filter(|a| filter.patient_id.is_none_or(|id| a.patient_id == id))
            .filter(|a| filter.date.is_none_or(|d| a.date == d))
            .collect();
        matching.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.created_at.cmp(&b.created_at)));

        matching.into_iter().map(|a| detail_for(&inner, a)).collect()
    }

    async fn update_appointment_status(
        &self,
        id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Option<Appointment>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(a) = inner
            .appointments
            .iter_mut()
            .find(|a| a.id == id && a.status == from)
        else {
            return Ok(None);
        };
        a.status = to;
        a.updated_at = Utc::now();
        Ok(Some(a.clone()))
    }

    async fn load_clinic_settings(&self) -> Result<Option<ClinicSettings>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.settings.clone())
    }

    async fn save_clinic_settings(
        &self,
        settings: ClinicSettings,
    ) -> Result<ClinicSettings, StoreError> {
        let mut inner = self.inner.write().await;
        inner.settings = Some(settings.clone());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentType;

    fn user(email: &str, role: UserRole) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "x".into(),
            first_name: "Test".into(),
            last_name: "User".into(),
            role,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        store.insert_user(user("a@b.com", UserRole::Patient)).await.unwrap();
        let err = store
            .insert_user(user("a@b.com", UserRole::Doctor))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.count_users_by_role(UserRole::Patient).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn cancelled_appointment_frees_the_slot() {
        let store = MemoryStore::new();
        let p = store.insert_user(user("p@b.com", UserRole::Patient)).await.unwrap();
        let d = store.insert_user(user("d@b.com", UserRole::Doctor)).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let new = NewAppointment {
            patient_id: p.id,
            doctor_id: d.id,
            date,
            time: "9:00 AM".into(),
            appointment_type: AppointmentType::Consultation,
            status: AppointmentStatus::Pending,
            reason: None,
            notes: None,
            fee: 150.0,
        };

        let first = store.insert_appointment(new.clone()).await.unwrap();
        assert!(store.slot_taken(d.id, date, "9:00 AM").await.unwrap());
        assert!(matches!(
            store.insert_appointment(new.clone()).await,
            Err(StoreError::Conflict(_))
        ));

        store
            .update_appointment_status(first.id, AppointmentStatus::Pending, AppointmentStatus::Cancelled)
            .await
            .unwrap();
        assert!(!store.slot_taken(d.id, date, "9:00 AM").await.unwrap());
        store.insert_appointment(new).await.unwrap();
    }

    #[tokio::test]
    async fn status_update_needs_the_expected_current_status() {
        let store = MemoryStore::new();
        let d = store.insert_user(user("d@b.com", UserRole::Doctor)).await.unwrap();
        let p = store.insert_user(user("p@b.com", UserRole::Patient)).await.unwrap();
        let appt = store
            .insert_appointment(NewAppointment {
                patient_id: p.id,
                doctor_id: d.id,
                date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
                time: "9:00 AM".into(),
                appointment_type: AppointmentType::Consultation,
                status: AppointmentStatus::Confirmed,
                reason: None,
                notes: None,
                fee: 150.0,
            })
            .await
            .unwrap();

        let cancelled = store
            .update_appointment_status(appt.id, AppointmentStatus::Confirmed, AppointmentStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.unwrap().status, AppointmentStatus::Cancelled);

        // a second writer that also read CONFIRMED loses
        let stale = store
            .update_appointment_status(appt.id, AppointmentStatus::Confirmed, AppointmentStatus::Completed)
            .await
            .unwrap();
        assert!(stale.is_none());
        let current = store.find_appointment(appt.id).await.unwrap().unwrap();
        assert_eq!(current.appointment.status, AppointmentStatus::Cancelled);
    }
}
