//! Read-side helpers: doctor directory, appointment listings, clinic
//! settings and bookable slots.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use uuid::Uuid;

use crate::{
    models::{
        AppointmentDetail, AppointmentFilter, AppointmentStatus, Availability, ClinicSettings,
        DoctorSummary, UserRole,
    },
    store::{ClinicStore, StoreError},
    validation::{format_slot, parse_clock},
};

/// Every doctor, reduced to the public directory fields. Store failures
/// are logged and produce an empty list.
pub async fn get_doctors(store: &dyn ClinicStore) -> Vec<DoctorSummary> {
    match store.list_doctors().await {
        Ok(doctors) => doctors,
        Err(e) => {
            tracing::error!(error = %e, "get doctors failed");
            Vec::new()
        }
    }
}

/// Appointments visible to `viewer`, ascending by date. A doctor sees the
/// appointments assigned to them, any other role sees the ones they
/// booked, and `None` lists everything. Fails soft like `get_doctors`.
pub async fn get_appointments(
    store: &dyn ClinicStore,
    viewer: Option<(Uuid, UserRole)>,
) -> Vec<AppointmentDetail> {
    let filter = match viewer {
        Some((id, UserRole::Doctor)) => AppointmentFilter {
            doctor_id: Some(id),
            ..Default::default()
        },
        Some((id, _)) => AppointmentFilter {
            patient_id: Some(id),
            ..Default::default()
        },
        None => AppointmentFilter::default(),
    };

    match store.list_appointments(filter).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "get appointments failed");
            Vec::new()
        }
    }
}

pub async fn clinic_settings(store: &dyn ClinicStore) -> Result<ClinicSettings, StoreError> {
    Ok(store.load_clinic_settings().await?.unwrap_or_default())
}

/* -------------------------
   Slots
--------------------------*/

/// Times offered by the booking form when a doctor has no availability
/// configured.
pub const BOOKING_TIME_SLOTS: [&str; 12] = [
    "9:00 AM", "9:30 AM", "10:00 AM", "10:30 AM", "11:00 AM", "11:30 AM",
    "2:00 PM", "2:30 PM", "3:00 PM", "3:30 PM", "4:00 PM", "4:30 PM",
];

fn minutes_of(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// Slot start times inside one availability window. Slots that overlap
/// the break are dropped, and the last slot must end by the window end.
pub fn window_slots(window: &Availability, step_minutes: u32) -> Vec<NaiveTime> {
    let (Some(start), Some(end)) = (parse_clock(&window.start_time), parse_clock(&window.end_time))
    else {
        return Vec::new();
    };
    if step_minutes == 0 {
        return Vec::new();
    }

    let brk = match (
        window.break_start_time.as_deref().and_then(parse_clock),
        window.break_end_time.as_deref().and_then(parse_clock),
    ) {
        (Some(bs), Some(be)) => Some((minutes_of(bs), minutes_of(be))),
        _ => None,
    };

    let end_m = minutes_of(end);
    let mut slots = Vec::new();
    let mut m = minutes_of(start);
    while m + step_minutes <= end_m {
        let overlaps_break = brk.is_some_and(|(bs, be)| m < be && m + step_minutes > bs);
        if !overlaps_break {
            if let Some(t) = NaiveTime::from_hms_opt(m / 60, m % 60, 0) {
                slots.push(t);
            }
        }
        m += step_minutes;
    }
    slots
}

/// Free slots for a doctor on `date`: the active windows for that weekday
/// minus slots held by non-cancelled appointments. A doctor without any
/// availability rows falls back to the booking form's fixed times.
pub async fn available_slots(
    store: &dyn ClinicStore,
    doctor_id: Uuid,
    date: NaiveDate,
    step_minutes: u32,
) -> Result<Vec<String>, StoreError> {
    let weekday = date.weekday().num_days_from_sunday() as i16;
    let windows = store.list_availability(doctor_id).await?;

    let mut slots: Vec<NaiveTime> = if windows.is_empty() {
        BOOKING_TIME_SLOTS.iter().filter_map(|s| parse_clock(s)).collect()
    } else {
        windows
            .iter()
            .filter(|w| w.is_active && w.day_of_week == weekday)
            .flat_map(|w| window_slots(w, step_minutes))
            .collect()
    };
    slots.sort();
    slots.dedup();

    let booked: Vec<NaiveTime> = store
        .list_appointments(AppointmentFilter {
            doctor_id: Some(doctor_id),
            date: Some(date),
            ..Default::default()
        })
        .await?
        .into_iter()
        .filter(|a| a.appointment.status != AppointmentStatus::Cancelled)
        .filter_map(|a| parse_clock(&a.appointment.time))
        .collect();

    Ok(slots
        .into_iter()
        .filter(|s| !booked.contains(s))
        .map(format_slot)
        .collect())
}
