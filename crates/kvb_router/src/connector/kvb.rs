//! KVB partner protocol client.
//!
//! One method per partner operation. Every method builds the outgoing
//! request from local state, executes it over the injected transport,
//! and checks the embedded response code: `"0"` is success, anything else
//! becomes a [`ConnectorError::BankErrorResponse`] for the caller to
//! classify. Mobile-mapping type 1 is the exception; its non-zero codes
//! steer the binding flow, so the parsed response is returned as-is.

pub mod transformers;

use common_utils::{
    errors::CustomResult,
    request::{Method, RequestBuilder, RequestContent},
};
use error_stack::{IntoReport, ResultExt};
use masking::{Mask, PeekInterface};
use router_env::{instrument, logger, tracing};
use serde::{de::DeserializeOwned, Serialize};

use self::transformers as kvb;
use crate::{
    configs::settings::BankConfig,
    core::errors::ConnectorError,
    services::{self, BankTransport},
};

/// The KVB connector.
#[derive(Clone, Debug)]
pub struct Kvb;

impl Kvb {
    fn endpoint(config: &BankConfig, path: &str) -> String {
        format!("{}{path}", config.base_url.trim_end_matches('/'))
    }

    async fn call<Req: Serialize, Res: DeserializeOwned>(
        transport: &dyn BankTransport,
        config: &BankConfig,
        path: &str,
        body: &Req,
        type_name: &'static str,
    ) -> CustomResult<Res, ConnectorError> {
        let request = RequestBuilder::new()
            .method(Method::Post)
            .url(&Self::endpoint(config, path))
            .header("apiKey", config.api_key.peek().clone().into_masked())
            .set_body(
                RequestContent::json(body).change_context(ConnectorError::RequestEncodingFailed)?,
            )
            .build();

        services::execute_bank_request(transport, request, type_name).await
    }

    fn ensure_success<T: kvb::KvbResponse>(response: T) -> CustomResult<T, ConnectorError> {
        let code = response.response_code();
        if code == crate::consts::BANK_SUCCESS_CODE {
            Ok(response)
        } else {
            let error = ConnectorError::BankErrorResponse {
                code: code.to_string(),
                message: response.response_message().to_string(),
            };
            logger::info!(bank_code = code, "bank returned business failure");
            Err(error).into_report()
        }
    }

    /// Mobile mapping, both type 0 (register) and type 1 (login). The
    /// response is returned unchecked: type-1 codes `"1"`, `"4"` and `"5"`
    /// are flow decisions, not plain failures.
    #[instrument(skip_all)]
    pub async fn mobile_mapping(
        transport: &dyn BankTransport,
        config: &BankConfig,
        request: kvb::MobileMappingRequest,
    ) -> CustomResult<kvb::MobileMappingResponse, ConnectorError> {
        Self::call(
            transport,
            config,
            "/mobile/mapping",
            &request,
            "MobileMappingResponse",
        )
        .await
    }

    /// Verify the bound user after mobile mapping type 0.
    #[instrument(skip_all)]
    pub async fn verify_user(
        transport: &dyn BankTransport,
        config: &BankConfig,
        request: kvb::VerifyUserRequest,
    ) -> CustomResult<kvb::VerifyUserResponse, ConnectorError> {
        Self::call(
            transport,
            config,
            "/mobile/verify",
            &request,
            "VerifyUserResponse",
        )
        .await
        .and_then(Self::ensure_success)
    }

    /// Remap an already known device, rotating server-side session ids.
    #[instrument(skip_all)]
    pub async fn re_mapping(
        transport: &dyn BankTransport,
        config: &BankConfig,
        request: kvb::ReMappingRequest,
    ) -> CustomResult<kvb::ReMappingResponse, ConnectorError> {
        Self::call(
            transport,
            config,
            "/mobile/remap",
            &request,
            "ReMappingResponse",
        )
        .await
        .and_then(Self::ensure_success)
    }

    /// Login-challenge validation; issues the login-ref id.
    #[instrument(skip_all)]
    pub async fn lc_validator(
        transport: &dyn BankTransport,
        config: &BankConfig,
        request: kvb::LcValidatorRequest,
    ) -> CustomResult<kvb::LcValidatorResponse, ConnectorError> {
        Self::call(
            transport,
            config,
            "/upi/lcvalidator",
            &request,
            "LcValidatorResponse",
        )
        .await
        .and_then(Self::ensure_success)
    }

    /// Demographic data for profile creation.
    #[instrument(skip_all)]
    pub async fn demographics(
        transport: &dyn BankTransport,
        config: &BankConfig,
        request: kvb::DemographicsRequest,
    ) -> CustomResult<kvb::DemographicsResponse, ConnectorError> {
        Self::call(
            transport,
            config,
            "/customer/demographics",
            &request,
            "DemographicsResponse",
        )
        .await
        .and_then(Self::ensure_success)
    }

    /// Create the PSP profile for a freshly registered binding.
    #[instrument(skip_all)]
    pub async fn profile_creation(
        transport: &dyn BankTransport,
        config: &BankConfig,
        request: kvb::ProfileCreationRequest,
    ) -> CustomResult<kvb::ProfileCreationResponse, ConnectorError> {
        Self::call(
            transport,
            config,
            "/upi/profile",
            &request,
            "ProfileCreationResponse",
        )
        .await
        .and_then(Self::ensure_success)
    }

    /// Fetch token keys for the mobile SDK.
    #[instrument(skip_all)]
    pub async fn list_keys(
        transport: &dyn BankTransport,
        config: &BankConfig,
        request: kvb::ListKeysRequest,
    ) -> CustomResult<kvb::ListKeysResponse, ConnectorError> {
        Self::call(
            transport,
            config,
            "/upi/listkeys",
            &request,
            "ListKeysResponse",
        )
        .await
        .and_then(Self::ensure_success)
    }

    /// Accounts reachable for the bound mobile number.
    #[instrument(skip_all)]
    pub async fn list_accounts(
        transport: &dyn BankTransport,
        config: &BankConfig,
        request: kvb::ListAccountsRequest,
    ) -> CustomResult<kvb::ListAccountsResponse, ConnectorError> {
        Self::call(
            transport,
            config,
            "/upi/accounts/list",
            &request,
            "ListAccountsResponse",
        )
        .await
        .and_then(Self::ensure_success)
    }

    /// Check that the PSP handle is live before adding the account.
    #[instrument(skip_all)]
    pub async fn psp_availability(
        transport: &dyn BankTransport,
        config: &BankConfig,
        request: kvb::PspAvailabilityRequest,
    ) -> CustomResult<kvb::PspAvailabilityResponse, ConnectorError> {
        Self::call(
            transport,
            config,
            "/upi/psp/availability",
            &request,
            "PspAvailabilityResponse",
        )
        .await
        .and_then(Self::ensure_success)
    }

    /// Attach the bank account to the PSP profile; the response carries the
    /// provisioned address.
    #[instrument(skip_all)]
    pub async fn add_bank_account(
        transport: &dyn BankTransport,
        config: &BankConfig,
        request: kvb::AddBankAccountRequest,
    ) -> CustomResult<kvb::AddBankAccountResponse, ConnectorError> {
        Self::call(
            transport,
            config,
            "/upi/accounts/add",
            &request,
            "AddBankAccountResponse",
        )
        .await
        .and_then(Self::ensure_success)
    }

    /// Set the UPI PIN against the registered mobile.
    #[instrument(skip_all)]
    pub async fn set_upi_pin(
        transport: &dyn BankTransport,
        config: &BankConfig,
        request: kvb::SetUpiPinRequest,
    ) -> CustomResult<kvb::SetUpiPinResponse, ConnectorError> {
        Self::call(
            transport,
            config,
            "/upi/pin/set",
            &request,
            "SetUpiPinResponse",
        )
        .await
        .and_then(Self::ensure_success)
    }

    /// Balance enquiry.
    #[instrument(skip_all)]
    pub async fn balance_enquiry(
        transport: &dyn BankTransport,
        config: &BankConfig,
        request: kvb::BalanceEnquiryRequest,
    ) -> CustomResult<kvb::BalanceEnquiryResponse, ConnectorError> {
        Self::call(
            transport,
            config,
            "/upi/balance",
            &request,
            "BalanceEnquiryResponse",
        )
        .await
        .and_then(Self::ensure_success)
    }

    /// Validate a payee address.
    #[instrument(skip_all)]
    pub async fn validate_vpa(
        transport: &dyn BankTransport,
        config: &BankConfig,
        request: kvb::VpaValidationRequest,
    ) -> CustomResult<kvb::VpaValidationResponse, ConnectorError> {
        Self::call(
            transport,
            config,
            "/upi/vpa/validate",
            &request,
            "VpaValidationResponse",
        )
        .await
        .and_then(Self::ensure_success)
    }

    /// Pay a validated address.
    #[instrument(skip_all)]
    pub async fn pay_vpa(
        transport: &dyn BankTransport,
        config: &BankConfig,
        request: kvb::VpaPaymentRequest,
    ) -> CustomResult<kvb::VpaPaymentResponse, ConnectorError> {
        Self::call(transport, config, "/upi/pay", &request, "VpaPaymentResponse")
            .await
            .and_then(Self::ensure_success)
    }

    /// Register a beneficiary.
    #[instrument(skip_all)]
    pub async fn add_beneficiary(
        transport: &dyn BankTransport,
        config: &BankConfig,
        request: kvb::BeneficiaryAddRequest,
    ) -> CustomResult<kvb::BeneficiaryAddResponse, ConnectorError> {
        Self::call(
            transport,
            config,
            "/beneficiary/add",
            &request,
            "BeneficiaryAddResponse",
        )
        .await
        .and_then(Self::ensure_success)
    }

    /// Validate the beneficiary OTP.
    #[instrument(skip_all)]
    pub async fn validate_beneficiary_otp(
        transport: &dyn BankTransport,
        config: &BankConfig,
        request: kvb::BeneficiaryOtpRequest,
    ) -> CustomResult<kvb::BeneficiaryOtpResponse, ConnectorError> {
        Self::call(
            transport,
            config,
            "/beneficiary/otp/validate",
            &request,
            "BeneficiaryOtpResponse",
        )
        .await
        .and_then(Self::ensure_success)
    }

    /// Pay a registered beneficiary.
    #[instrument(skip_all)]
    pub async fn beneficiary_payment(
        transport: &dyn BankTransport,
        config: &BankConfig,
        request: kvb::BeneficiaryPaymentRequest,
    ) -> CustomResult<kvb::BeneficiaryPaymentResponse, ConnectorError> {
        Self::call(
            transport,
            config,
            "/beneficiary/payment",
            &request,
            "BeneficiaryPaymentResponse",
        )
        .await
        .and_then(Self::ensure_success)
    }
}
