//! Explicit validation for each form shape.
//!
//! Every validator walks the fields in form order and collects one
//! `FieldError` per failing field. Callers surface the first message.
//! Cross-field rules (password confirmation) only run once every field
//! passed on its own.

use chrono::{DateTime, NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{BookingForm, SignInForm, SignUpForm, UserRole};

lazy_static! {
    /// local@domain.tld, no whitespace
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_PHONE_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn first_message(&self) -> &str {
        self.0
            .first()
            .map(|e| e.message.as_str())
            .unwrap_or("Invalid input")
    }

    fn into_result<T>(self, ok: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.0.is_empty() { Ok(ok()) } else { Err(self) }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

fn require(errors: &mut FieldErrors, field: &'static str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.push(field, message);
    }
}

/// Booking dates arrive either as `YYYY-MM-DD` or as an RFC 3339
/// timestamp. A timestamp contributes its calendar day in its own offset,
/// so `2024-03-15T00:00:00+02:00` is the 15th. A `Z` timestamp is read as
/// a UTC day; clients east of UTC should send the plain date or their
/// offset, since `toISOString()` of local midnight lands on the previous
/// UTC day.
pub fn parse_booking_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Parses `HH:MM` (24h) and `H:MM AM` (12h) clock strings.
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&raw.to_ascii_uppercase(), "%I:%M %p"))
        .ok()
}

/// Formats a slot the way the booking form lists it, e.g. `9:00 AM`.
/// Booked times are stored in this form.
pub fn format_slot(t: NaiveTime) -> String {
    t.format("%-I:%M %p").to_string()
}

#[derive(Debug, Clone)]
pub struct ValidSignUp {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: UserRole,
    pub password: String,
}

pub fn validate_sign_up(form: &SignUpForm) -> Result<ValidSignUp, FieldErrors> {
    let mut errors = FieldErrors::default();
    let email = form.email.trim();

    require(&mut errors, "firstName", &form.first_name, "First name is required");
    require(&mut errors, "lastName", &form.last_name, "Last name is required");
    if !is_valid_email(email) {
        errors.push("email", "Invalid email address");
    }
    if form.phone.trim().len() < MIN_PHONE_LEN {
        errors.push("phone", "Phone number must be at least 10 digits");
    }
    let role = form.role.parse::<UserRole>().ok();
    if role.is_none() {
        errors.push("role", "Please select a valid account type");
    }
    if form.password.len() < MIN_PASSWORD_LEN {
        errors.push("password", "Password must be at least 8 characters");
    }

    if errors.is_empty() && form.password != form.confirm_password {
        errors.push("confirmPassword", "Passwords don't match");
    }

    errors.into_result(|| ValidSignUp {
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        email: email.to_string(),
        phone: form.phone.trim().to_string(),
        role: role.unwrap_or_default(),
        password: form.password.clone(),
    })
}

#[derive(Debug, Clone)]
pub struct ValidSignIn {
    pub email: String,
    pub password: String,
}

pub fn validate_sign_in(form: &SignInForm) -> Result<ValidSignIn, FieldErrors> {
    let mut errors = FieldErrors::default();
    let email = form.email.trim();

    if !is_valid_email(email) {
        errors.push("email", "Invalid email address");
    }
    if form.password.is_empty() {
        errors.push("password", "Password is required");
    }

    errors.into_result(|| ValidSignIn {
        email: email.to_string(),
        password: form.password.clone(),
    })
}

#[derive(Debug, Clone)]
pub struct ValidBooking {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    pub time: String,
    pub reason: String,
    pub notes: Option<String>,
}

pub fn validate_booking(form: &BookingForm) -> Result<ValidBooking, FieldErrors> {
    let mut errors = FieldErrors::default();
    let email = form.email.trim();

    require(&mut errors, "firstName", &form.first_name, "First name is required");
    require(&mut errors, "lastName", &form.last_name, "Last name is required");
    if !is_valid_email(email) {
        errors.push("email", "Invalid email address");
    }
    if form.phone.trim().len() < MIN_PHONE_LEN {
        errors.push("phone", "Phone number is required");
    }
    require(&mut errors, "doctorId", &form.doctor_id, "Doctor selection is required");

    let date = if form.date.trim().is_empty() {
        errors.push("date", "Date is required");
        None
    } else {
        let parsed = parse_booking_date(&form.date);
        if parsed.is_none() {
            errors.push("date", "Invalid date");
        }
        parsed
    };

    // canonical `9:00 AM` form, so one slot has one spelling in storage
    let time = if form.time.trim().is_empty() {
        errors.push("time", "Time is required");
        None
    } else {
        let parsed = parse_clock(&form.time).map(format_slot);
        if parsed.is_none() {
            errors.push("time", "Invalid time");
        }
        parsed
    };

    require(&mut errors, "reason", &form.reason, "Reason for visit is required");

    let (Some(date), Some(time)) = (date, time) else {
        return Err(errors);
    };

    errors.into_result(|| ValidBooking {
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        email: email.to_string(),
        phone: form.phone.trim().to_string(),
        doctor_id: form.doctor_id.trim().to_string(),
        date,
        time,
        reason: form.reason.trim().to_string(),
        notes: form
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_up() -> SignUpForm {
        SignUpForm {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "a@b.com".into(),
            phone: "5551234567".into(),
            role: "patient".into(),
            password: "password1".into(),
            confirm_password: "password1".into(),
        }
    }

    fn booking() -> BookingForm {
        BookingForm {
            first_name: "John".into(),
            last_name: "Smith".into(),
            email: "john@example.com".into(),
            phone: "(555) 111-1111".into(),
            doctor_id: "d1".into(),
            date: "2024-03-15".into(),
            time: "9:00 AM".into(),
            reason: "consultation".into(),
            notes: None,
        }
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn valid_sign_up_passes() {
        let v = validate_sign_up(&sign_up()).unwrap();
        assert_eq!(v.role, UserRole::Patient);
    }

    #[test]
    fn mismatched_confirmation() {
        let mut form = sign_up();
        form.confirm_password = "password2".into();
        let errs = validate_sign_up(&form).unwrap_err();
        assert_eq!(errs.first_message(), "Passwords don't match");
        assert_eq!(errs.errors()[0].field, "confirmPassword");
    }

    #[test]
    fn first_failing_field_wins() {
        let mut form = sign_up();
        form.email = "nope".into();
        form.password = "short".into();
        let errs = validate_sign_up(&form).unwrap_err();
        assert_eq!(errs.errors().len(), 2);
        assert_eq!(errs.first_message(), "Invalid email address");
    }

    #[test]
    fn short_password_and_phone() {
        let mut form = sign_up();
        form.phone = "12345".into();
        assert_eq!(
            validate_sign_up(&form).unwrap_err().first_message(),
            "Phone number must be at least 10 digits"
        );

        let mut form = sign_up();
        form.password = "1234567".into();
        form.confirm_password = "1234567".into();
        assert_eq!(
            validate_sign_up(&form).unwrap_err().first_message(),
            "Password must be at least 8 characters"
        );
    }

    #[test]
    fn unknown_role_rejected() {
        let mut form = sign_up();
        form.role = "nurse".into();
        assert_eq!(
            validate_sign_up(&form).unwrap_err().first_message(),
            "Please select a valid account type"
        );
    }

    #[test]
    fn sign_in_requires_password() {
        let form = SignInForm {
            email: "a@b.com".into(),
            password: String::new(),
        };
        assert_eq!(
            validate_sign_in(&form).unwrap_err().first_message(),
            "Password is required"
        );
    }

    #[test]
    fn booking_missing_fields_cite_the_field() {
        let cases: [(fn(&mut BookingForm), &str, &str); 4] = [
            (|f| f.doctor_id.clear(), "doctorId", "Doctor selection is required"),
            (|f| f.date.clear(), "date", "Date is required"),
            (|f| f.time.clear(), "time", "Time is required"),
            (|f| f.reason.clear(), "reason", "Reason for visit is required"),
        ];

        for (clear, field, message) in cases {
            let mut form = booking();
            clear(&mut form);
            let errs = validate_booking(&form).unwrap_err();
            assert_eq!(errs.errors()[0].field, field);
            assert_eq!(errs.first_message(), message);
        }
    }

    #[test]
    fn booking_accepts_iso_timestamps() {
        let mut form = booking();
        form.date = "2024-03-15T00:00:00.000Z".into();
        form.notes = Some("   ".into());
        let v = validate_booking(&form).unwrap();
        assert_eq!(v.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(v.notes, None);

        form.date = "next tuesday".into();
        assert_eq!(validate_booking(&form).unwrap_err().first_message(), "Invalid date");
    }

    #[test]
    fn offset_timestamps_keep_their_own_day() {
        let fifteenth = NaiveDate::from_ymd_opt(2024, 3, 15);
        assert_eq!(parse_booking_date("2024-03-15T00:00:00+02:00"), fifteenth);
        assert_eq!(parse_booking_date("2024-03-15T23:30:00-05:00"), fifteenth);
        assert_eq!(parse_booking_date(" 2024-03-15 "), fifteenth);
    }

    #[test]
    fn clock_formats() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(parse_clock("09:00"), Some(nine));
        assert_eq!(parse_clock("9:00 AM"), Some(nine));
        assert_eq!(parse_clock("2:30 pm"), NaiveTime::from_hms_opt(14, 30, 0));
        assert_eq!(parse_clock("noon"), None);
        assert_eq!(format_slot(nine), "9:00 AM");
        assert_eq!(format_slot(NaiveTime::from_hms_opt(16, 30, 0).unwrap()), "4:30 PM");
    }

    #[test]
    fn booking_time_is_canonical() {
        for spelling in ["9:00 AM", "9:00 am", "09:00", " 9:00  AM"] {
            let mut form = booking();
            form.time = spelling.into();
            assert_eq!(validate_booking(&form).unwrap().time, "9:00 AM", "{spelling:?}");
        }

        let mut form = booking();
        form.time = "14:30".into();
        assert_eq!(validate_booking(&form).unwrap().time, "2:30 PM");

        form.time = "half past nine".into();
        let errs = validate_booking(&form).unwrap_err();
        assert_eq!(errs.errors()[0].field, "time");
        assert_eq!(errs.first_message(), "Invalid time");
    }
}
