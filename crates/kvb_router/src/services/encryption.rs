//! Response envelope encryption.
//!
//! Every post-binding operation returns its payload encrypted under the
//! caller's session key; inbound device ids arrive encrypted the same way.

use api_models::upi::EncryptedPayloadResponse;
use base64::Engine;
use common_utils::{
    consts::BASE64_ENGINE,
    crypto::{DecodeMessage, EncodeMessage, GcmAes256},
};
use error_stack::{IntoReport, ResultExt};
use masking::{ExposeInterface, PeekInterface, Secret, StrongSecret};
use serde::Serialize;

use crate::core::errors::{ApiErrorResponse, RouterResult};

/// Serialize and encrypt a response payload under the session key.
pub fn encrypt_response<T: Serialize>(
    payload: &T,
    session_key: &StrongSecret<Vec<u8>>,
) -> RouterResult<EncryptedPayloadResponse> {
    let plaintext = serde_json::to_vec(payload)
        .into_report()
        .change_context(ApiErrorResponse::InternalServerError)?;

    let ciphertext = GcmAes256
        .encode_message(session_key.peek(), &plaintext)
        .change_context(ApiErrorResponse::InternalServerError)?;

    Ok(EncryptedPayloadResponse {
        payload: BASE64_ENGINE.encode(ciphertext),
    })
}

/// Decrypt a base64 ciphertext field sent by the app (device ids, credential
/// blocks) into its UTF-8 plaintext.
pub fn decrypt_field(
    encrypted: Secret<String>,
    session_key: &StrongSecret<Vec<u8>>,
) -> RouterResult<String> {
    let ciphertext = BASE64_ENGINE
        .decode(encrypted.expose())
        .into_report()
        .change_context(ApiErrorResponse::InvalidRequestData {
            message: "encrypted field is not valid base64".to_string(),
        })?;

    let plaintext = GcmAes256
        .decode_message(session_key.peek(), ciphertext.into())
        .change_context(ApiErrorResponse::InvalidRequestData {
            message: "encrypted field could not be decrypted".to_string(),
        })?;

    String::from_utf8(plaintext)
        .into_report()
        .change_context(ApiErrorResponse::InvalidRequestData {
            message: "decrypted field is not valid utf-8".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_key() -> StrongSecret<Vec<u8>> {
        StrongSecret::new(vec![7_u8; 32])
    }

    #[test]
    fn round_trip_through_the_envelope() {
        let key = session_key();
        let plaintext = "356938035643809";
        let ciphertext = GcmAes256
            .encode_message(key.peek(), plaintext.as_bytes())
            .expect("encrypt");
        let encrypted = Secret::new(BASE64_ENGINE.encode(ciphertext));

        assert_eq!(decrypt_field(encrypted, &key).expect("decrypt"), plaintext);
    }

    #[test]
    fn garbage_ciphertext_is_an_invalid_request() {
        let result = decrypt_field(Secret::new("not base64!!".to_string()), &session_key());
        assert!(result.is_err());
    }
}
