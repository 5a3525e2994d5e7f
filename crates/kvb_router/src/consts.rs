//! Constants shared across the router.

/// Response code the partner uses for success on every endpoint.
pub const BANK_SUCCESS_CODE: &str = "0";

/// Mobile-mapping type-1 code meaning the binding SMS never reached the bank.
pub const MOBILE_MAPPING_SMS_NOT_RECEIVED_CODE: &str = "1";

/// Mobile-mapping type-1 codes that route the session through remapping.
pub const MOBILE_MAPPING_REMAP_CODES: [&str; 2] = ["4", "5"];

/// The one payment-family code that re-issues the transaction id between
/// retries. Every other retryable code reuses the already-issued id.
pub const TECHNICAL_ERROR_RESEND_CODE: &str = "TE1";

/// Retries after the initial attempt toward the bank.
pub const MAX_BANK_RETRY_ATTEMPTS: u8 = 2;

/// Length of partner client ids, both numeric (Android) and hex (iOS).
pub const CLIENT_ID_LENGTH: usize = 16;

/// Length of numeric transaction reference numbers issued toward the bank.
pub const TRANSACTION_ID_LENGTH: usize = 12;

/// Prefix for beneficiary identifiers.
pub const BENEFICIARY_ID_PREFIX: &str = "ben";

/// Redis hash key prefix for per-user provisioning session state.
pub const SESSION_KEY_PREFIX: &str = "upi_session_";

/// Redis key prefix for per-user advisory locks.
pub const USER_LOCK_KEY_PREFIX: &str = "api_lock_";

/// Config row holding the date the IFSC dataset was last mirrored.
pub const IFSC_LAST_SYNCED_KEY: &str = "ifsc_last_synced_on";

/// `binding_type` value that keeps the minted client id in cache only.
pub const CACHE_ONLY_BINDING_TYPE: &str = "y";

/// Mobile-mapping request types.
pub const MOBILE_MAPPING_TYPE_REGISTER: u8 = 0;
/// Mobile-mapping request type for login of an already bound device.
pub const MOBILE_MAPPING_TYPE_LOGIN: u8 = 1;
