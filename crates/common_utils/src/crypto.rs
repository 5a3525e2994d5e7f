//! Utilities for cryptographic algorithms

use error_stack::{IntoReport, ResultExt};
use masking::{ExposeInterface, Secret};
use ring::aead::{self, BoundKey, OpeningKey, SealingKey, UnboundKey};

use crate::{
    errors::{self, CustomResult},
    pii::EncryptionStrategy,
};

#[derive(Clone, Debug)]
struct NonceSequence(u128);

impl NonceSequence {
    /// Byte index at which the 96-bit sequence number starts within the
    /// big-endian 128-bit integer used to encode and decode the nonce.
    const SEQUENCE_NUMBER_START_INDEX: usize = 4;

    /// Generate a random nonce sequence.
    fn new() -> Result<Self, ring::error::Unspecified> {
        use ring::rand::{SecureRandom, SystemRandom};

        let rng = SystemRandom::new();
        let mut sequence_number = [0_u8; 128 / 8];
        rng.fill(&mut sequence_number[Self::SEQUENCE_NUMBER_START_INDEX..])?;
        let sequence_number = u128::from_be_bytes(sequence_number);

        Ok(Self(sequence_number))
    }

    /// Returns the current nonce value as bytes.
    fn current(&self) -> [u8; aead::NONCE_LEN] {
        let mut nonce = [0_u8; aead::NONCE_LEN];
        nonce.copy_from_slice(&self.0.to_be_bytes()[Self::SEQUENCE_NUMBER_START_INDEX..]);
        nonce
    }

    /// Constructs a nonce sequence from bytes
    fn from_bytes(bytes: [u8; aead::NONCE_LEN]) -> Self {
        let mut sequence_number = [0_u8; 128 / 8];
        sequence_number[Self::SEQUENCE_NUMBER_START_INDEX..].copy_from_slice(&bytes);
        let sequence_number = u128::from_be_bytes(sequence_number);
        Self(sequence_number)
    }
}

impl aead::NonceSequence for NonceSequence {
    fn advance(&mut self) -> Result<aead::Nonce, ring::error::Unspecified> {
        let mut nonce = [0_u8; aead::NONCE_LEN];
        nonce.copy_from_slice(&self.0.to_be_bytes()[Self::SEQUENCE_NUMBER_START_INDEX..]);

        // Increment the nonce for the next encryption operation
        self.0 = self.0.wrapping_add(1);

        aead::Nonce::try_assume_unique_for_key(&nonce)
    }
}

/// Trait for encrypting a message with a symmetric key
pub trait EncodeMessage {
    /// Encrypt the message, returning nonce-prefixed ciphertext
    fn encode_message(
        &self,
        secret: &[u8],
        msg: &[u8],
    ) -> CustomResult<Vec<u8>, errors::CryptoError>;
}

/// Trait for decrypting a message with a symmetric key
pub trait DecodeMessage {
    /// Decrypt nonce-prefixed ciphertext
    fn decode_message(
        &self,
        secret: &[u8],
        msg: Secret<Vec<u8>, EncryptionStrategy>,
    ) -> CustomResult<Vec<u8>, errors::CryptoError>;
}

/// Represents no cryptographic algorithm.
/// Implements the crypto traits and acts like a no-op.
#[derive(Debug)]
pub struct NoAlgorithm;

impl EncodeMessage for NoAlgorithm {
    fn encode_message(
        &self,
        _secret: &[u8],
        msg: &[u8],
    ) -> CustomResult<Vec<u8>, errors::CryptoError> {
        Ok(msg.to_vec())
    }
}

impl DecodeMessage for NoAlgorithm {
    fn decode_message(
        &self,
        _secret: &[u8],
        msg: Secret<Vec<u8>, EncryptionStrategy>,
    ) -> CustomResult<Vec<u8>, errors::CryptoError> {
        Ok(msg.expose())
    }
}

/// Represents the GCM-AES-256 algorithm
#[derive(Debug)]
pub struct GcmAes256;

impl EncodeMessage for GcmAes256 {
    fn encode_message(
        &self,
        secret: &[u8],
        msg: &[u8],
    ) -> CustomResult<Vec<u8>, errors::CryptoError> {
        let nonce_sequence = NonceSequence::new()
            .into_report()
            .change_context(errors::CryptoError::EncodingFailed)?;
        let current_nonce = nonce_sequence.current();
        let key = UnboundKey::new(&aead::AES_256_GCM, secret)
            .into_report()
            .change_context(errors::CryptoError::InvalidKey)?;
        let mut key = SealingKey::new(key, nonce_sequence);
        let mut in_out = msg.to_vec();

        key.seal_in_place_append_tag(aead::Aad::empty(), &mut in_out)
            .into_report()
            .change_context(errors::CryptoError::EncodingFailed)?;
        in_out.splice(0..0, current_nonce);

        Ok(in_out)
    }
}

impl DecodeMessage for GcmAes256 {
    fn decode_message(
        &self,
        secret: &[u8],
        msg: Secret<Vec<u8>, EncryptionStrategy>,
    ) -> CustomResult<Vec<u8>, errors::CryptoError> {
        let msg = msg.expose();
        let key = UnboundKey::new(&aead::AES_256_GCM, secret)
            .into_report()
            .change_context(errors::CryptoError::InvalidKey)?;

        let nonce_sequence = NonceSequence::from_bytes(
            <[u8; aead::NONCE_LEN]>::try_from(
                msg.get(..aead::NONCE_LEN)
                    .ok_or(errors::CryptoError::DecodingFailed)
                    .into_report()
                    .attach_printable("Failed to read the nonce from the encrypted ciphertext")?,
            )
            .into_report()
            .change_context(errors::CryptoError::DecodingFailed)?,
        );

        let mut key = OpeningKey::new(key, nonce_sequence);
        let mut binding = msg;
        let output = binding.as_mut_slice();

        let result = key
            .open_within(aead::Aad::empty(), output, aead::NONCE_LEN..)
            .into_report()
            .change_context(errors::CryptoError::DecodingFailed)?;

        Ok(result.to_vec())
    }
}

#[cfg(test)]
mod crypto_tests {
    use super::{DecodeMessage, EncodeMessage};

    #[test]
    fn test_gcm_aes_256_encode_decode() {
        let message = br#"{"account_number":"1234567890","upi_id":"someone@kvb"}"#;
        let secret = [3_u8; 32];

        let algorithm = super::GcmAes256;
        let encrypted = algorithm
            .encode_message(&secret, message)
            .expect("encryption failed");
        let decrypted = algorithm
            .decode_message(&secret, encrypted.into())
            .expect("decryption failed");

        assert_eq!(decrypted, message);
    }

    #[test]
    fn test_gcm_aes_256_fails_with_wrong_key() {
        let message = b"session payload";
        let secret = [3_u8; 32];
        let wrong_secret = [4_u8; 32];

        let algorithm = super::GcmAes256;
        let encrypted = algorithm
            .encode_message(&secret, message)
            .expect("encryption failed");

        assert!(algorithm.decode_message(&wrong_secret, encrypted.into()).is_err());
    }
}
