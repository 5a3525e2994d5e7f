//! Errors specific to this custom redis interface

#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum RedisError {
    #[error("Failed to establish Redis connection")]
    RedisConnectionError,
    #[error("Failed to set key value in Redis")]
    SetFailed,
    #[error("Failed to set key value with expiry in Redis")]
    SetExpiryFailed,
    #[error("Failed to get key value in Redis")]
    GetFailed,
    #[error("Failed to set hash in Redis")]
    SetHashFailed,
    #[error("Failed to set hash field in Redis")]
    SetHashFieldFailed,
    #[error("Failed to get hash field in Redis")]
    GetHashFieldFailed,
    #[error("Failed to get hash in Redis")]
    GetHashFailed,
    #[error("Failed to delete key in Redis")]
    DeleteFailed,
    #[error("The requested value was not found in Redis")]
    NotFound,
    #[error("Unexpected reply received from Redis")]
    UnknownResult,
}
