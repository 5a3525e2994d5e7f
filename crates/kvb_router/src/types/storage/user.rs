//! User rows, carrying the onboarding checklist marker.

use api_models::enums::{KycStatus, OnboardingStage};
use common_utils::pii::PhoneNumberStrategy;
use masking::Secret;
use time::PrimitiveDateTime;

/// A registered app user.
#[derive(Clone, Debug)]
pub struct User {
    pub user_id: String,
    /// CBS customer id, present once account opening has started
    pub customer_id: Option<String>,
    pub mobile_number: Secret<String, PhoneNumberStrategy>,
    pub onboarding_stage: OnboardingStage,
    pub kyc_status: Option<KycStatus>,
    pub created_at: PrimitiveDateTime,
    pub modified_at: PrimitiveDateTime,
}

/// Insertable user row.
#[derive(Clone, Debug)]
pub struct UserNew {
    pub user_id: String,
    pub customer_id: Option<String>,
    pub mobile_number: Secret<String, PhoneNumberStrategy>,
}

impl UserNew {
    pub(crate) fn into_user(self) -> User {
        let now = common_utils::date_time::now();
        User {
            user_id: self.user_id,
            customer_id: self.customer_id,
            mobile_number: self.mobile_number,
            onboarding_stage: OnboardingStage::MobileVerification,
            kyc_status: None,
            created_at: now,
            modified_at: now,
        }
    }
}

/// Partial updates applied to a user row.
#[derive(Clone, Debug)]
pub enum UserUpdate {
    /// Advance the onboarding checklist.
    OnboardingStage { stage: OnboardingStage },
    /// KYC status change delivered by callback.
    KycStatus { status: KycStatus },
    /// CBS assigned a customer id.
    CustomerId { customer_id: String },
}

impl User {
    /// Apply a partial update, refreshing `modified_at`.
    pub fn apply(mut self, update: UserUpdate) -> Self {
        match update {
            UserUpdate::OnboardingStage { stage } => {
                self.onboarding_stage = stage;
            }
            UserUpdate::KycStatus { status } => {
                self.kyc_status = Some(status);
            }
            UserUpdate::CustomerId { customer_id } => {
                self.customer_id = Some(customer_id);
            }
        }
        self.modified_at = common_utils::date_time::now();
        self
    }
}
