//! Demo data: an admin, three doctors with weekday availability, two
//! patients, a few appointments and the clinic settings.
//!
//! Users are matched by email, so running the seed twice leaves a single
//! copy of everything. Availability and appointments are only written
//! for doctors created by this run.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, Utc};

use crate::{
    auth::hash_password,
    models::{
        AppointmentStatus, AppointmentType, BusinessHours, ClinicSettings, EmergencyContact,
        NewAppointment, NewAvailability, NewUser, PaymentMethod, User, UserRole,
    },
    store::{ClinicStore, StoreError},
};

pub const ADMIN_EMAIL: &str = "admin@medicare.com";

const WEEKDAYS: [i16; 5] = [1, 2, 3, 4, 5];

struct DoctorSeed {
    email: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    phone: &'static str,
    specialty: &'static str,
    license_number: &'static str,
    experience: i32,
    education: [&'static str; 2],
    certifications: [&'static str; 2],
    bio: &'static str,
    fee: f64,
}

const DOCTORS: [DoctorSeed; 3] = [
    DoctorSeed {
        email: "sarah.johnson@medicare.com",
        first_name: "Sarah",
        last_name: "Johnson",
        phone: "(555) 123-4567",
        specialty: "Family Medicine",
        license_number: "MD123456",
        experience: 15,
        education: ["Harvard Medical School", "Johns Hopkins Residency"],
        certifications: ["Board Certified Family Medicine", "Advanced Cardiac Life Support"],
        bio: "Board-certified family medicine physician caring for patients of all ages.",
        fee: 150.0,
    },
    DoctorSeed {
        email: "michael.chen@medicare.com",
        first_name: "Michael",
        last_name: "Chen",
        phone: "(555) 234-5678",
        specialty: "Cardiology",
        license_number: "MD234567",
        experience: 12,
        education: ["Stanford Medical School", "Mayo Clinic Fellowship"],
        certifications: ["Board Certified Cardiology", "Interventional Cardiology"],
        bio: "Cardiologist focused on preventive care and interventional procedures.",
        fee: 200.0,
    },
    DoctorSeed {
        email: "emily.rodriguez@medicare.com",
        first_name: "Emily",
        last_name: "Rodriguez",
        phone: "(555) 345-6789",
        specialty: "Pediatrics",
        license_number: "MD345678",
        experience: 10,
        education: ["UCLA Medical School", "Children's Hospital Los Angeles Residency"],
        certifications: ["Board Certified Pediatrics", "Pediatric Advanced Life Support"],
        bio: "Pediatrician caring for children from infancy through adolescence.",
        fee: 175.0,
    },
];

/// Returns the user and whether this call created it.
async fn ensure_user(store: &dyn ClinicStore, new_user: NewUser) -> anyhow::Result<(User, bool)> {
    if let Some(existing) = store.find_user_by_email(&new_user.email).await? {
        return Ok((existing, false));
    }
    let email = new_user.email.clone();
    match store.insert_user(new_user).await {
        Ok(user) => Ok((user, true)),
        Err(StoreError::Conflict(_)) => {
            let user = store
                .find_user_by_email(&email)
                .await?
                .ok_or_else(|| anyhow::anyhow!("user {email} missing after conflict"))?;
            Ok((user, false))
        }
        Err(e) => Err(e.into()),
    }
}

fn patient(
    email: &str,
    first_name: &str,
    last_name: &str,
    phone: &str,
    password_hash: &str,
) -> NewUser {
    NewUser {
        email: email.into(),
        password_hash: password_hash.into(),
        first_name: first_name.into(),
        last_name: last_name.into(),
        phone: Some(phone.into()),
        role: UserRole::Patient,
        city: Some("Healthcare City".into()),
        state: Some("HC".into()),
        zip_code: Some("12345".into()),
        ..Default::default()
    }
}

fn clinic_settings() -> ClinicSettings {
    let mut business_hours = BTreeMap::new();
    for day in ["monday", "tuesday", "wednesday", "thursday", "friday"] {
        business_hours.insert(day.to_string(), BusinessHours::open("09:00", "17:00"));
    }
    business_hours.insert("saturday".to_string(), BusinessHours::open("09:00", "14:00"));
    business_hours.insert("sunday".to_string(), BusinessHours::closed());

    ClinicSettings {
        clinic_name: "MediCare Clinic".into(),
        address: Some("123 Medical Center Drive, Healthcare City, HC 12345".into()),
        phone: Some("(555) 123-4567".into()),
        email: Some("info@medicare.com".into()),
        website: Some("https://medicare.com".into()),
        business_hours,
        accepted_payment_methods: vec![
            PaymentMethod::CreditCard,
            PaymentMethod::DebitCard,
            PaymentMethod::Insurance,
        ],
        ..ClinicSettings::default()
    }
}

pub async fn seed_demo_data(store: &dyn ClinicStore) -> anyhow::Result<()> {
    seed_demo_data_at(store, Utc::now().date_naive()).await
}

/// Seeds relative to `today` (appointments land tomorrow and next week).
pub async fn seed_demo_data_at(store: &dyn ClinicStore, today: NaiveDate) -> anyhow::Result<()> {
    tracing::info!("seeding demo data");

    ensure_user(
        store,
        NewUser {
            email: ADMIN_EMAIL.into(),
            password_hash: hash_password("admin123")?,
            first_name: "Admin".into(),
            last_name: "User".into(),
            phone: Some("(555) 000-0000".into()),
            role: UserRole::Admin,
            ..Default::default()
        },
    )
    .await?;

    let doctor_hash = hash_password("doctor123")?;
    let mut doctors = Vec::with_capacity(DOCTORS.len());
    for d in &DOCTORS {
        let (user, created) = ensure_user(
            store,
            NewUser {
                email: d.email.into(),
                password_hash: doctor_hash.clone(),
                first_name: d.first_name.into(),
                last_name: d.last_name.into(),
                phone: Some(d.phone.into()),
                role: UserRole::Doctor,
                specialty: Some(d.specialty.into()),
                license_number: Some(d.license_number.into()),
                experience: Some(d.experience),
                education: d.education.iter().map(|s| s.to_string()).collect(),
                certifications: d.certifications.iter().map(|s| s.to_string()).collect(),
                bio: Some(d.bio.into()),
                consultation_fee: Some(d.fee),
                ..Default::default()
            },
        )
        .await?;

        if created {
            for day in WEEKDAYS {
                store
                    .insert_availability(NewAvailability {
                        doctor_id: user.id,
                        day_of_week: day,
                        start_time: "09:00".into(),
                        end_time: "17:00".into(),
                        break_start_time: Some("12:00".into()),
                        break_end_time: Some("13:00".into()),
                        is_active: true,
                    })
                    .await?;
            }
        }
        doctors.push((user, created));
    }

    let patient_hash = hash_password("patient123")?;
    let mut john = patient("john.smith@email.com", "John", "Smith", "(555) 111-1111", &patient_hash);
    john.date_of_birth = NaiveDate::from_ymd_opt(1985, 6, 15);
    john.gender = Some("MALE".into());
    john.address = Some("123 Main Street".into());
    john.blood_type = Some("O+".into());
    john.allergies = vec!["Penicillin".into()];
    john.emergency_contact = Some(EmergencyContact {
        name: "Jane Smith".into(),
        relationship: "Spouse".into(),
        phone: "(555) 111-2222".into(),
        email: Some("jane.smith@email.com".into()),
    });
    let (john, _) = ensure_user(store, john).await?;

    let mut sarah = patient("sarah.wilson@email.com", "Sarah", "Wilson", "(555) 222-2222", &patient_hash);
    sarah.date_of_birth = NaiveDate::from_ymd_opt(1990, 3, 22);
    sarah.gender = Some("FEMALE".into());
    sarah.address = Some("456 Oak Avenue".into());
    sarah.blood_type = Some("A+".into());
    sarah.emergency_contact = Some(EmergencyContact {
        name: "Mike Wilson".into(),
        relationship: "Spouse".into(),
        phone: "(555) 222-3333".into(),
        email: Some("mike.wilson@email.com".into()),
    });
    let (sarah, _) = ensure_user(store, sarah).await?;

    let tomorrow = today + Duration::days(1);
    let next_week = today + Duration::days(7);
    let samples = [
        (&john, 0, tomorrow, "9:00 AM", AppointmentType::Consultation, AppointmentStatus::Confirmed, "Annual physical examination"),
        (&sarah, 1, tomorrow, "10:30 AM", AppointmentType::FollowUp, AppointmentStatus::Pending, "Follow-up for blood pressure monitoring"),
        (&john, 2, next_week, "2:00 PM", AppointmentType::CheckUp, AppointmentStatus::Confirmed, "Child wellness visit"),
    ];
    for (patient, doctor_idx, date, time, appointment_type, status, reason) in samples {
        let (doctor, created) = &doctors[doctor_idx];
        if !created {
            continue;
        }
        store
            .insert_appointment(NewAppointment {
                patient_id: patient.id,
                doctor_id: doctor.id,
                date,
                time: time.into(),
                appointment_type,
                status,
                reason: Some(reason.into()),
                notes: None,
                fee: doctor.consultation_fee.unwrap_or(150.0),
            })
            .await?;
    }

    if store.load_clinic_settings().await?.is_none() {
        store.save_clinic_settings(clinic_settings()).await?;
    }

    tracing::info!(
        admin = ADMIN_EMAIL,
        "demo data ready (passwords: admin123, doctor123, patient123)"
    );
    Ok(())
}
