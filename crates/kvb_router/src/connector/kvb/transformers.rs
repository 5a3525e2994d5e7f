//! Wire types of the KVB partner protocol.
//!
//! Every response carries `respCode`/`respMessage`; code `"0"` is success on
//! all endpoints. Field layouts beyond what this service reads are partner
//! internals and not modeled.

use api_models::enums::TransferType;
use common_utils::pii::PhoneNumberStrategy;
use masking::{Secret, VpaMask};
use serde::{Deserialize, Serialize};

/// Access to the response envelope shared by every KVB endpoint.
pub trait KvbResponse {
    /// Embedded response code; `"0"` means success.
    fn response_code(&self) -> &str;
    /// Human-readable message accompanying the code.
    fn response_message(&self) -> &str;
}

macro_rules! impl_kvb_response {
    ($($ty:ty),+ $(,)?) => {
        $(impl KvbResponse for $ty {
            fn response_code(&self) -> &str {
                &self.resp_code
            }
            fn response_message(&self) -> &str {
                &self.resp_message
            }
        })+
    };
}

/// The composite session credential threaded through every post-binding
/// call. Rebuilt fresh per call because its components rotate independently
/// (remapping rotates `server_id` and `login_ref_id`).
#[derive(Clone, Debug)]
pub struct CryptoInfo {
    pub device_id: String,
    pub client_id: String,
    pub server_id: String,
    pub os_version: String,
    pub os: String,
    pub login_ref_id: String,
}

impl CryptoInfo {
    /// Tilde-joined credential string, byte-identical for identical inputs.
    pub fn build(&self) -> String {
        format!(
            "{}~{}~{}~{}~{}~{}",
            self.device_id,
            self.client_id,
            self.server_id,
            self.os_version.to_uppercase(),
            self.os.to_uppercase(),
            self.login_ref_id,
        )
    }
}

// --- mobile mapping ---------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileMappingRequest {
    /// 0 registers a fresh binding, 1 logs an already bound device in
    pub mapping_type: u8,
    pub mobile_number: Secret<String, PhoneNumberStrategy>,
    pub device_id: String,
    pub device_ip: String,
    pub os: String,
    pub os_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileMappingResponse {
    pub resp_code: String,
    #[serde(default)]
    pub resp_message: String,
    /// Present on type-0 success
    #[serde(default)]
    pub trans_id: Option<String>,
    /// Present on type-1 code `"0"`
    #[serde(default)]
    pub server_id: Option<String>,
}

// --- verify user ------------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyUserRequest {
    pub mobile_number: Secret<String, PhoneNumberStrategy>,
    pub transaction_id: String,
    pub client_id: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyUserResponse {
    pub resp_code: String,
    #[serde(default)]
    pub resp_message: String,
}

// --- remapping --------------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReMappingRequest {
    pub mobile_number: Secret<String, PhoneNumberStrategy>,
    pub client_id: String,
    pub device_id: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReMappingResponse {
    pub resp_code: String,
    #[serde(default)]
    pub resp_message: String,
    #[serde(default)]
    pub server_id: Option<String>,
    #[serde(default)]
    pub login_ref_id: Option<String>,
}

// --- login-challenge validation ---------------------------------------------

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LcValidatorRequest {
    pub mobile_number: Secret<String, PhoneNumberStrategy>,
    pub client_id: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LcValidatorResponse {
    pub resp_code: String,
    #[serde(default)]
    pub resp_message: String,
    #[serde(default)]
    pub login_ref_id: Option<String>,
}

// --- demographics -----------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicsRequest {
    pub customer_id: String,
    pub mobile_number: Secret<String, PhoneNumberStrategy>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicsResponse {
    pub resp_code: String,
    #[serde(default)]
    pub resp_message: String,
    #[serde(default)]
    pub customer_name: Option<String>,
}

// --- profile creation -------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCreationRequest {
    pub crypto_info: String,
    pub mobile_number: Secret<String, PhoneNumberStrategy>,
    pub customer_name: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCreationResponse {
    pub resp_code: String,
    #[serde(default)]
    pub resp_message: String,
}

// --- key listing ------------------------------------------------------------

/// Which branch of the binding flow is fetching token keys.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKeysMode {
    /// A remapped, previously known device
    Existing,
    /// A freshly registered profile
    Registered,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListKeysRequest {
    pub crypto_info: String,
    pub mobile_number: Secret<String, PhoneNumberStrategy>,
    pub mode: ListKeysMode,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListKeysResponse {
    pub resp_code: String,
    #[serde(default)]
    pub resp_message: String,
    /// Opaque token key material consumed by the mobile SDK
    #[serde(default)]
    pub keys: Option<serde_json::Value>,
}

// --- account listing --------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAccountsRequest {
    pub crypto_info: String,
    pub mobile_number: Secret<String, PhoneNumberStrategy>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetail {
    pub account_number: String,
    pub ifsc: String,
    #[serde(default)]
    pub account_type: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAccountsResponse {
    pub resp_code: String,
    #[serde(default)]
    pub resp_message: String,
    #[serde(default)]
    pub accounts: Vec<AccountDetail>,
}

// --- PSP availability -------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PspAvailabilityRequest {
    pub crypto_info: String,
    pub psp_handle: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PspAvailabilityResponse {
    pub resp_code: String,
    #[serde(default)]
    pub resp_message: String,
}

// --- add bank account -------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBankAccountRequest {
    pub crypto_info: String,
    pub mobile_number: Secret<String, PhoneNumberStrategy>,
    pub account_number: String,
    pub ifsc: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBankAccountResponse {
    pub resp_code: String,
    #[serde(default)]
    pub resp_message: String,
    /// The provisioned virtual payment address
    #[serde(rename = "Payeraddr", default)]
    pub payer_addr: Option<String>,
}

// --- UPI PIN ----------------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUpiPinRequest {
    pub crypto_info: String,
    pub card_digits: Secret<String, masking::CardNumberMask>,
    pub expiry: Secret<String>,
    pub otp: Secret<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUpiPinResponse {
    pub resp_code: String,
    #[serde(default)]
    pub resp_message: String,
}

// --- balance ----------------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEnquiryRequest {
    pub crypto_info: String,
    pub credential_block: Secret<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEnquiryResponse {
    pub resp_code: String,
    #[serde(default)]
    pub resp_message: String,
    #[serde(default)]
    pub balance: Option<String>,
}

// --- VPA validate / pay -----------------------------------------------------

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VpaValidationRequest {
    pub crypto_info: String,
    pub payee_vpa: Secret<String, VpaMask>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VpaValidationResponse {
    pub resp_code: String,
    #[serde(default)]
    pub resp_message: String,
    #[serde(default)]
    pub payee_name: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VpaPaymentRequest {
    pub crypto_info: String,
    pub payee_vpa: Secret<String, VpaMask>,
    /// Amount in minor units
    pub amount: i64,
    pub remarks: String,
    pub credential_block: Secret<String>,
    pub transaction_id: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VpaPaymentResponse {
    pub resp_code: String,
    #[serde(default)]
    pub resp_message: String,
    /// Echo of the submitted transaction id
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub utr_ref_number: Option<String>,
}

// --- beneficiary family -----------------------------------------------------

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryAddRequest {
    pub customer_id: String,
    pub name: String,
    pub account_number: Secret<String, masking::CardNumberMask>,
    pub ifsc: String,
    pub transfer_type: TransferType,
    pub transaction_id: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryAddResponse {
    pub resp_code: String,
    #[serde(default)]
    pub resp_message: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryOtpRequest {
    pub transaction_id: String,
    pub otp: Secret<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryOtpResponse {
    pub resp_code: String,
    #[serde(default)]
    pub resp_message: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryPaymentRequest {
    pub customer_id: String,
    pub account_number: Secret<String, masking::CardNumberMask>,
    pub ifsc: String,
    /// Amount in minor units
    pub amount: i64,
    pub remarks: String,
    pub transaction_id: String,
    /// Set on retries so the bank treats the submission as a resend rather
    /// than a new transfer
    pub resend: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryPaymentResponse {
    pub resp_code: String,
    #[serde(default)]
    pub resp_message: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub utr_ref_number: Option<String>,
}

impl_kvb_response!(
    MobileMappingResponse,
    VerifyUserResponse,
    ReMappingResponse,
    LcValidatorResponse,
    DemographicsResponse,
    ProfileCreationResponse,
    ListKeysResponse,
    ListAccountsResponse,
    PspAvailabilityResponse,
    AddBankAccountResponse,
    SetUpiPinResponse,
    BalanceEnquiryResponse,
    VpaValidationResponse,
    VpaPaymentResponse,
    BeneficiaryAddResponse,
    BeneficiaryOtpResponse,
    BeneficiaryPaymentResponse,
);

impl std::fmt::Display for ListKeysMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Existing => "existing",
            Self::Registered => "registered",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crypto_info_is_pure_and_uppercases_os_fields() {
        let info = CryptoInfo {
            device_id: "dev-123".to_string(),
            client_id: "1111222233334444".to_string(),
            server_id: "srv-9".to_string(),
            os_version: "14.2".to_string(),
            os: "android".to_string(),
            login_ref_id: "lrf-7".to_string(),
        };

        let first = info.build();
        let second = info.build();

        assert_eq!(first, "dev-123~1111222233334444~srv-9~14.2~ANDROID~lrf-7");
        assert_eq!(first, second);
    }

    #[test]
    fn add_bank_account_response_reads_payeraddr() {
        let body = r#"{"respCode":"0","respMessage":"ok","Payeraddr":"9876543210@kvb"}"#;
        let parsed: AddBankAccountResponse = serde_json::from_str(body).expect("parse");

        assert_eq!(parsed.resp_code, "0");
        assert_eq!(parsed.payer_addr.as_deref(), Some("9876543210@kvb"));
    }

    #[test]
    fn responses_tolerate_missing_message() {
        let body = r#"{"respCode":"4"}"#;
        let parsed: MobileMappingResponse = serde_json::from_str(body).expect("parse");

        assert_eq!(parsed.resp_code, "4");
        assert!(parsed.resp_message.is_empty());
    }
}
