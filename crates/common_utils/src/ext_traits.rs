//! Extension traits for foreign types.

use error_stack::{IntoReport, ResultExt};
use serde::de::DeserializeOwned;

use crate::errors::{CustomResult, ParsingError, ValidationError};

/// Extension trait for parsing structs out of response bytes
pub trait BytesExt {
    /// Deserialize the bytes into the given type, naming the type in the
    /// error for diagnosability
    fn parse_struct<'de, T>(&'de self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: serde::Deserialize<'de>;
}

impl BytesExt for bytes::Bytes {
    fn parse_struct<'de, T>(&'de self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: serde::Deserialize<'de>,
    {
        serde_json::from_slice::<T>(self)
            .into_report()
            .change_context(ParsingError::StructParseFailure(type_name))
            .attach_printable_lazy(|| {
                format!("Unable to parse {type_name} from the bank response")
            })
    }
}

/// Extension trait for interpreting `serde_json::Value`s
pub trait ValueExt {
    /// Parse the value into the given type
    fn parse_value<T>(self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: DeserializeOwned;
}

impl ValueExt for serde_json::Value {
    fn parse_value<T>(self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_value(self)
            .into_report()
            .change_context(ParsingError::ValueParseFailure(type_name))
    }
}

/// Extension trait for required optional values
pub trait OptionExt<T> {
    /// Unwrap the option, reporting the named field as missing otherwise
    fn get_required_value(self, field_name: &'static str) -> CustomResult<T, ValidationError>;
}

impl<T> OptionExt<T> for Option<T> {
    fn get_required_value(self, field_name: &'static str) -> CustomResult<T, ValidationError> {
        self.ok_or(ValidationError::MissingRequiredField {
            field_name: field_name.to_string(),
        })
        .into_report()
    }
}

/// Extension trait for parsing owned strings into enums
pub trait StringExt {
    /// Parse the string into the given enum via `FromStr`
    fn parse_enum<T>(self, enum_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: std::str::FromStr;
}

impl StringExt for String {
    fn parse_enum<T>(self, enum_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: std::str::FromStr,
    {
        T::from_str(self.trim())
            .map_err(|_| ParsingError::ValueParseFailure(enum_name))
            .into_report()
    }
}
