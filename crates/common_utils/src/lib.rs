#![warn(missing_docs)]

//! Utilities shared across the banking integration workspace.

pub mod consts;
pub mod crypto;
pub mod errors;
pub mod ext_traits;
pub mod pii;
pub mod request;

/// Date-time utilities built over [`time`].
pub mod date_time {
    use time::{format_description::well_known::Iso8601, OffsetDateTime, PrimitiveDateTime};

    /// Current date and time in UTC.
    pub fn now() -> PrimitiveDateTime {
        let utc_date_time = OffsetDateTime::now_utc();
        PrimitiveDateTime::new(utc_date_time.date(), utc_date_time.time())
    }

    /// Current calendar date in UTC, rendered as `YYYY-MM-DD`.
    ///
    /// Used for do-once-per-day gates persisted in durable storage.
    pub fn today_as_string() -> String {
        OffsetDateTime::now_utc().date().to_string()
    }

    /// ISO 8601 rendering of a date-time, for wire payloads and audit rows.
    pub fn as_iso8601(date_time: PrimitiveDateTime) -> String {
        date_time
            .assume_utc()
            .format(&Iso8601::DEFAULT)
            .unwrap_or_else(|_| date_time.to_string())
    }
}

/// Generate a nanoid with the given prefix and length
#[inline]
pub fn generate_id(length: usize, prefix: &str) -> String {
    format!("{}_{}", prefix, nanoid::nanoid!(length, &consts::ALPHABETS))
}

/// Generate a nanoid with the given prefix and a default length
#[inline]
pub fn generate_id_with_default_len(prefix: &str) -> String {
    generate_id(consts::ID_LENGTH, prefix)
}

/// Generate a purely numeric id of the given length.
///
/// The partner's Android client-session protocol requires 16-digit numeric
/// client ids; transaction reference numbers share the format.
#[inline]
pub fn generate_digits(length: usize) -> String {
    nanoid::nanoid!(length, &consts::DIGITS)
}

/// Generate a lowercase hexadecimal id of the given length.
///
/// The partner's iOS client-session protocol requires 16-char hex client ids.
#[inline]
pub fn generate_hex(length: usize) -> String {
    nanoid::nanoid!(length, &consts::HEX_DIGITS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_digits_are_numeric_and_sized() {
        let id = generate_digits(16);
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn generated_hex_is_lowercase_hex() {
        let id = generate_hex(16);
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn generated_id_carries_prefix() {
        let id = generate_id_with_default_len("txn");
        assert!(id.starts_with("txn_"));
    }
}
