use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    models::{AppointmentDetail, AppointmentStatus, UserRole},
    services::directory_service::{available_slots, clinic_settings, get_appointments},
    store::{ClinicStore, StoreError},
    validation::parse_clock,
};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRow {
    pub id: Uuid,
    pub patient: String,
    pub doctor: String,
    pub date: NaiveDate,
    pub time: String,
    #[serde(rename = "type")]
    pub appointment_type: String,
    pub status: AppointmentStatus,
    pub phone: Option<String>,
}

impl From<&AppointmentDetail> for DashboardRow {
    fn from(d: &AppointmentDetail) -> Self {
        DashboardRow {
            id: d.appointment.id,
            patient: format!("{} {}", d.patient.first_name, d.patient.last_name),
            doctor: format!("Dr. {} {}", d.doctor.first_name, d.doctor.last_name),
            date: d.appointment.date,
            time: d.appointment.time.clone(),
            appointment_type: d.appointment.appointment_type.label().to_string(),
            status: d.appointment.status,
            phone: d.patient.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(AppointmentStatus),
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse::<AppointmentStatus>().map(StatusFilter::Only)
    }
}

/// Case-insensitive search over patient and doctor names combined with an
/// exact status match.
pub fn filter_rows(rows: Vec<DashboardRow>, search: &str, status: StatusFilter) -> Vec<DashboardRow> {
    let needle = search.trim().to_lowercase();
    rows.into_iter()
        .filter(|r| {
            needle.is_empty()
                || r.patient.to_lowercase().contains(&needle)
                || r.doctor.to_lowercase().contains(&needle)
        })
        .filter(|r| match status {
            StatusFilter::All => true,
            StatusFilter::Only(s) => r.status == s,
        })
        .collect()
}

/// Who the dashboard is for. Admins see the whole clinic, doctors their
/// own schedule.
fn scope(viewer_id: Uuid, viewer_role: UserRole) -> Option<(Uuid, UserRole)> {
    match viewer_role {
        UserRole::Admin => None,
        role => Some((viewer_id, role)),
    }
}

pub async fn appointment_rows(
    store: &dyn ClinicStore,
    viewer_id: Uuid,
    viewer_role: UserRole,
    search: &str,
    status: StatusFilter,
) -> Vec<DashboardRow> {
    let rows = get_appointments(store, scope(viewer_id, viewer_role))
        .await
        .iter()
        .map(DashboardRow::from)
        .collect();
    filter_rows(rows, search, status)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingAppointment {
    pub id: Uuid,
    pub patient: String,
    pub time: String,
    #[serde(rename = "type")]
    pub appointment_type: String,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub todays_appointments: usize,
    pub pending_today: usize,
    pub total_patients: i64,
    pub available_slots_today: usize,
    pub revenue_this_month: f64,
    pub upcoming: Vec<UpcomingAppointment>,
}

pub async fn overview(
    store: &dyn ClinicStore,
    viewer_id: Uuid,
    viewer_role: UserRole,
    today: NaiveDate,
) -> Result<DashboardOverview, StoreError> {
    let all = get_appointments(store, scope(viewer_id, viewer_role)).await;

    let mut todays: Vec<&AppointmentDetail> = all
        .iter()
        .filter(|a| a.appointment.date == today)
        .filter(|a| a.appointment.status != AppointmentStatus::Cancelled)
        .collect();
    todays.sort_by_key(|a| parse_clock(&a.appointment.time));

    let pending_today = todays
        .iter()
        .filter(|a| a.appointment.status == AppointmentStatus::Pending)
        .count();

    let revenue_this_month = all
        .iter()
        .filter(|a| a.appointment.date.year() == today.year() && a.appointment.date.month() == today.month())
        .filter(|a| {
            matches!(
                a.appointment.status,
                AppointmentStatus::Confirmed | AppointmentStatus::Completed
            )
        })
        .map(|a| a.appointment.fee)
        .sum();

    let doctor_ids: Vec<Uuid> = match viewer_role {
        UserRole::Doctor => vec![viewer_id],
        _ => store.list_doctors().await?.into_iter().map(|d| d.id).collect(),
    };
    let step = clinic_settings(store).await?.default_appointment_duration.max(1) as u32;
    let mut available_slots_today = 0;
    for doctor_id in doctor_ids {
        available_slots_today += available_slots(store, doctor_id, today, step).await?.len();
    }

    Ok(DashboardOverview {
        todays_appointments: todays.len(),
        pending_today,
        total_patients: store.count_users_by_role(UserRole::Patient).await?,
        available_slots_today,
        revenue_this_month,
        upcoming: todays
            .iter()
            .map(|a| UpcomingAppointment {
                id: a.appointment.id,
                patient: format!("{} {}", a.patient.first_name, a.patient.last_name),
                time: a.appointment.time.clone(),
                appointment_type: a.appointment.appointment_type.label().to_string(),
                status: a.appointment.status,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentType, NewAppointment, NewUser};
    use crate::store::MemoryStore;

    fn row(patient: &str, doctor: &str, status: AppointmentStatus) -> DashboardRow {
        DashboardRow {
            id: Uuid::new_v4(),
            patient: patient.into(),
            doctor: doctor.into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            time: "9:00 AM".into(),
            appointment_type: "Consultation".into(),
            status,
            phone: None,
        }
    }

    fn sample() -> Vec<DashboardRow> {
        vec![
            row("John Smith", "Dr. Sarah Johnson", AppointmentStatus::Confirmed),
            row("Sarah Wilson", "Dr. Michael Chen", AppointmentStatus::Pending),
            row("Mike Johnson", "Dr. Emily Rodriguez", AppointmentStatus::Confirmed),
            row("Emily Davis", "Dr. Sarah Johnson", AppointmentStatus::Cancelled),
        ]
    }

    #[test]
    fn search_matches_patient_or_doctor() {
        let hits = filter_rows(sample(), "johnson", StatusFilter::All);
        let patients: Vec<&str> = hits.iter().map(|r| r.patient.as_str()).collect();
        assert_eq!(patients, ["John Smith", "Mike Johnson", "Emily Davis"]);
    }

    #[test]
    fn status_filter_is_exact() {
        let hits = filter_rows(sample(), "", "confirmed".parse().unwrap());
        assert_eq!(hits.len(), 2);
        let hits = filter_rows(sample(), "SARAH", StatusFilter::Only(AppointmentStatus::Cancelled));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].patient, "Emily Davis");
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert!("archived".parse::<StatusFilter>().is_err());
    }

    #[tokio::test]
    async fn overview_counts_today_and_month() {
        let store = MemoryStore::new();
        let doctor = store
            .insert_user(NewUser {
                email: "d@b.com".into(),
                first_name: "Sarah".into(),
                last_name: "Johnson".into(),
                role: UserRole::Doctor,
                ..Default::default()
            })
            .await
            .unwrap();
        let patient = store
            .insert_user(NewUser {
                email: "p@b.com".into(),
                first_name: "John".into(),
                last_name: "Smith".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let entries = [
            (today, "2:00 PM", AppointmentStatus::Confirmed, 150.0),
            (today, "9:00 AM", AppointmentStatus::Pending, 150.0),
            (today, "10:00 AM", AppointmentStatus::Cancelled, 150.0),
            (NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(), "9:00 AM", AppointmentStatus::Completed, 200.0),
            (NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(), "9:00 AM", AppointmentStatus::Confirmed, 999.0),
        ];
        for (date, time, status, fee) in entries {
            store
                .insert_appointment(NewAppointment {
                    patient_id: patient.id,
                    doctor_id: doctor.id,
                    date,
                    time: time.into(),
                    appointment_type: AppointmentType::Consultation,
                    status,
                    reason: None,
                    notes: None,
                    fee,
                })
                .await
                .unwrap();
        }

        let admin = Uuid::new_v4();
        let o = overview(&store, admin, UserRole::Admin, today).await.unwrap();
        assert_eq!(o.todays_appointments, 2);
        assert_eq!(o.pending_today, 1);
        assert_eq!(o.total_patients, 1);
        assert_eq!(o.revenue_this_month, 350.0);
        assert_eq!(o.upcoming[0].time, "9:00 AM");
        assert_eq!(o.upcoming[1].time, "2:00 PM");
        // no availability rows: the 12 form slots minus 9:00 AM and 2:00 PM
        assert_eq!(o.available_slots_today, 10);

        let rows = appointment_rows(&store, doctor.id, UserRole::Doctor, "", StatusFilter::All).await;
        assert_eq!(rows.len(), 5);
        let rows = appointment_rows(&store, Uuid::new_v4(), UserRole::Doctor, "", StatusFilter::All).await;
        assert!(rows.is_empty());
    }
}
