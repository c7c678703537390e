//! Field rules shared across routes.

use chrono::NaiveDate;
use uuid::Uuid;

use super::schema::Field;

/// Accepted phone formats, as shown to users.
pub const PHONE_FORMATS: &str = "07XXXXXXXX, +947XXXXXXXX or 947XXXXXXXX";

pub fn phone_required_message() -> String {
    format!("Phone number is required. Accepted formats: {PHONE_FORMATS}")
}

pub fn phone_invalid_message() -> String {
    format!("Invalid phone number. Accepted formats: {PHONE_FORMATS}")
}

/// Remove every whitespace character.
pub fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

pub fn trim(s: &str) -> String {
    s.trim().to_string()
}

fn digits(s: &str, n: usize) -> bool {
    s.len() == n && s.bytes().all(|b| b.is_ascii_digit())
}

/// `07` + 8 digits, `+947` + 8 digits or `947` + 8 digits.
pub fn is_phone(s: &str) -> bool {
    ["07", "+947", "947"]
        .iter()
        .any(|prefix| s.strip_prefix(*prefix).is_some_and(|rest| digits(rest, 8)))
}

pub fn is_uuid(s: &str) -> bool {
    Uuid::parse_str(s).is_ok()
}

/// Calendar date in `YYYY-MM-DD` form.
pub fn is_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Loose shape check; the mail provider is the real authority.
pub fn is_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !s.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

pub fn max_len(n: usize) -> impl Fn(&str) -> bool + Send + Sync + 'static {
    move |s: &str| s.chars().count() <= n
}

/// Required phone field: non-empty, whitespace stripped, one of three formats.
pub fn phone(name: &str) -> Field {
    Field::required(name, phone_required_message())
        .transform(strip_whitespace)
        .check(is_phone, phone_invalid_message())
}

/// Required UUID field.
pub fn uuid(name: &str, label: &str) -> Field {
    Field::required(name, format!("{label} is required"))
        .transform(trim)
        .check(is_uuid, format!("{label} must be a valid id"))
}
