use core::fmt;

/// Debugging trait which is specialized for handling secret values
pub trait Strategy<T> {
    /// Format information about the secret's type.
    fn fmt(value: &T, fmt: &mut fmt::Formatter<'_>) -> fmt::Result;
}

/// Debug with type
pub struct WithType;

impl<T> Strategy<T> for WithType {
    fn fmt(_: &T, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str("*** ")?;
        fmt.write_str(std::any::type_name::<T>())?;
        fmt.write_str(" ***")
    }
}

/// Debug without type
pub struct WithoutType;

impl<T> Strategy<T> for WithoutType {
    fn fmt(_: &T, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str("*** ***")
    }
}

/// Masks a virtual payment address, keeping the handle visible.
///
/// `someone@bank` is rendered as `so*****@bank`, enough for support logs to
/// correlate a complaint without exposing the address itself.
#[derive(Debug)]
pub struct VpaMask;

impl<T> Strategy<T> for VpaMask
where
    T: AsRef<str>,
{
    fn fmt(value: &T, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = value.as_ref();
        match value.split_once('@') {
            Some((user, handle)) if user.len() > 2 => write!(
                fmt,
                "{}*****@{handle}",
                user.get(..2).unwrap_or_default()
            ),
            _ => fmt.write_str("*****"),
        }
    }
}

/// Masks a card number down to the last four digits.
#[derive(Debug)]
pub struct CardNumberMask;

impl<T> Strategy<T> for CardNumberMask
where
    T: AsRef<str>,
{
    fn fmt(value: &T, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = value.as_ref();
        if value.len() > 4 {
            write!(
                fmt,
                "**** {}",
                value.get(value.len() - 4..).unwrap_or_default()
            )
        } else {
            fmt.write_str("****")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Secret;

    #[test]
    fn vpa_mask_keeps_handle() {
        let vpa: Secret<String, VpaMask> = Secret::new("ramesh@kvb".to_string());
        assert_eq!(format!("{vpa:?}"), "ra*****@kvb");
    }

    #[test]
    fn short_vpa_is_fully_masked() {
        let vpa: Secret<String, VpaMask> = Secret::new("r@kvb".to_string());
        assert_eq!(format!("{vpa:?}"), "*****");
    }

    #[test]
    fn card_number_keeps_last_four() {
        let card: Secret<String, CardNumberMask> =
            Secret::new("4111111111111111".to_string());
        assert_eq!(format!("{card:?}"), "**** 1111");
    }
}
