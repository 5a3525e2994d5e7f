//! Personal Identifiable Information specific masking strategies.

use std::fmt;

use masking::Strategy;

/// Strategy for encrypted blobs: renders length only, never content.
#[derive(Debug)]
pub enum EncryptionStrategy {}

impl<T> Strategy<T> for EncryptionStrategy
where
    T: AsRef<[u8]>,
{
    fn fmt(value: &T, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "*** Encrypted data of length {} ***", value.as_ref().len())
    }
}

/// Strategy for phone numbers: last two digits stay visible.
#[derive(Debug)]
pub enum PhoneNumberStrategy {}

impl<T> Strategy<T> for PhoneNumberStrategy
where
    T: AsRef<str>,
{
    fn fmt(value: &T, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = value.as_ref();
        if value.len() > 2 {
            write!(
                fmt,
                "{}{}",
                "*".repeat(value.len() - 2),
                value.get(value.len() - 2..).unwrap_or_default()
            )
        } else {
            fmt.write_str("**")
        }
    }
}

#[cfg(test)]
mod tests {
    use masking::Secret;

    use super::*;

    #[test]
    fn phone_number_masks_all_but_last_two() {
        let number: Secret<String, PhoneNumberStrategy> = Secret::new("9876543210".to_string());
        assert_eq!(format!("{number:?}"), "********10");
    }

    #[test]
    fn encrypted_blob_reports_length_only() {
        let blob: Secret<Vec<u8>, EncryptionStrategy> = Secret::new(vec![1, 2, 3]);
        assert_eq!(format!("{blob:?}"), "*** Encrypted data of length 3 ***");
    }
}
