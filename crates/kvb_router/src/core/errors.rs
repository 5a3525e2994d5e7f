//! Error types of the router core.

use common_utils::errors::CustomResult;

use crate::services::ApplicationResponse;

/// Result of a core flow, before the response envelope is attached.
pub type RouterResult<T> = CustomResult<T, ApiErrorResponse>;

/// Result of a core flow, carrying the response the handler layer renders.
pub type RouterResponse<T> = CustomResult<ApplicationResponse<T>, ApiErrorResponse>;

/// Service-level errors. The `Display` strings are the user-facing messages;
/// upstream codes are logged, never exposed through these.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ApiErrorResponse {
    #[error("Something went wrong, please try again later")]
    InternalServerError,
    #[error("{message}")]
    InvalidRequestData { message: String },
    #[error("Missing required field: {field_name}")]
    MissingRequiredField { field_name: &'static str },
    #[error("Device binding not found for this user")]
    DeviceNotFound,
    #[error("Account not found for this user")]
    AccountNotFound,
    #[error("Transaction not found")]
    TransactionNotFound,
    #[error("Beneficiary not found")]
    BeneficiaryNotFound,
    #[error("User not found")]
    UserNotFound,
    #[error("UPI ID already exists")]
    UpiIdAlreadyExists,
    #[error("sms not received")]
    SmsNotReceived,
    #[error("self transfer not allowed")]
    SelfTransferNotAllowed,
    #[error("beneficiary already added with the same details")]
    DuplicateBeneficiary,
    #[error("callback already processed for this entity")]
    DuplicateCallback,
    #[error("another operation is already in progress for this user")]
    OperationInProgress,
    /// A classified or raw upstream message surfaced to the caller.
    #[error("{message}")]
    BankErrorMessage { message: String },
    #[error("could not reach the bank, please try again later")]
    BankUnreachable,
}

/// Storage layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Value not found in storage: {0}")]
    ValueNotFound(String),
    #[error("Duplicate value in storage: {entity}")]
    DuplicateValue { entity: &'static str },
    #[error("Error while interacting with storage")]
    DatabaseError,
}

impl StorageError {
    /// Whether this error is the not-found case.
    pub fn is_db_not_found(&self) -> bool {
        matches!(self, Self::ValueNotFound(_))
    }
}

/// Session cache errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Error while connecting to the session cache")]
    ConnectionFailure,
    #[error("Session cache operation failed")]
    OperationFailed,
}

/// Errors while talking to the partner bank.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("Failed to encode the outgoing bank request")]
    RequestEncodingFailed,
    #[error("Failed to deserialize the bank response")]
    ResponseDeserializationFailed,
    #[error("Failed to reach the bank endpoint")]
    TransportFailure,
    #[error("Bank returned an unexpected HTTP status: {status_code}")]
    UnexpectedResponseStatus { status_code: u16 },
    #[error("Bank rejected the request: code {code}")]
    BankErrorResponse { code: String, message: String },
    #[error("Missing required field in bank response: {field_name}")]
    MissingResponseField { field_name: &'static str },
}

impl ConnectorError {
    /// The embedded bank business error, when this is one.
    pub fn bank_error(&self) -> Option<(&str, &str)> {
        match self {
            Self::BankErrorResponse { code, message } => Some((code, message)),
            _ => None,
        }
    }
}

/// Conversions from storage errors into user-facing responses.
pub trait StorageErrorExt<T, E> {
    /// Map the not-found storage error to the given response, everything
    /// else to an internal server error.
    fn to_not_found_response(self, not_found_response: ApiErrorResponse) -> RouterResult<T>;

    /// Map the duplicate storage error to the given response, everything
    /// else to an internal server error.
    fn to_duplicate_response(self, duplicate_response: ApiErrorResponse) -> RouterResult<T>;
}

impl<T> StorageErrorExt<T, StorageError> for CustomResult<T, StorageError> {
    fn to_not_found_response(self, not_found_response: ApiErrorResponse) -> RouterResult<T> {
        self.map_err(|err| {
            if err.current_context().is_db_not_found() {
                err.change_context(not_found_response)
            } else {
                err.change_context(ApiErrorResponse::InternalServerError)
            }
        })
    }

    fn to_duplicate_response(self, duplicate_response: ApiErrorResponse) -> RouterResult<T> {
        self.map_err(|err| {
            if matches!(err.current_context(), StorageError::DuplicateValue { .. }) {
                err.change_context(duplicate_response)
            } else {
                err.change_context(ApiErrorResponse::InternalServerError)
            }
        })
    }
}
