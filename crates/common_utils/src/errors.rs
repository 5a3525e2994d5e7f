//! Errors and error specific types for universal use

/// Custom Result
/// A custom datatype that wraps the error variant <E> into a report, allowing
/// error_stack::Report<E> specific extendability
///
/// Effectively, equivalent to `Result<T, error_stack::Report<E>>`
pub type CustomResult<T, E> = error_stack::Result<T, E>;

/// Parsing errors, thrown when a value could not be deserialized into the
/// expected shape
#[derive(Debug, thiserror::Error)]
pub enum ParsingError {
    /// Failed to parse a struct from raw bytes
    #[error("Failed to parse {0} from bytes")]
    StructParseFailure(&'static str),
    /// Failed to serialize a value for the wire
    #[error("Failed to serialize to {0} format")]
    EncodeError(&'static str),
    /// Failed to interpret a `serde_json::Value` as the target type
    #[error("Unable to parse {0} from a json value")]
    ValueParseFailure(&'static str),
}

/// Validation errors, raised before any external call is attempted
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The provided input is missing a required field.
    #[error("Missing required field: {field_name}")]
    MissingRequiredField { field_name: String },

    /// An incorrect value was provided for the field specified by `field_name`.
    #[error("Incorrect value provided for field: {field_name}")]
    IncorrectValueProvided { field_name: &'static str },

    /// An invalid input was provided.
    #[error("{message}")]
    InvalidValue { message: String },
}

/// Cryptographic algorithm errors
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The cryptographic algorithm was unable to encode the message
    #[error("Failed to encode given message")]
    EncodingFailed,
    /// The cryptographic algorithm was unable to decode the message
    #[error("Failed to decode given message")]
    DecodingFailed,
    /// The provided key was not usable for the algorithm
    #[error("Invalid key provided for the algorithm")]
    InvalidKey,
}
