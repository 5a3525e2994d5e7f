//! Account rows.

use masking::Secret;
use time::PrimitiveDateTime;

/// One account per user. `upi_id` is set exactly once, at the final
/// successful step of provisioning; its presence means "do not
/// re-provision".
#[derive(Clone, Debug)]
pub struct Account {
    pub user_id: String,
    pub customer_id: String,
    pub account_number: Secret<String, masking::CardNumberMask>,
    pub ifsc_code: Option<String>,
    pub upi_id: Option<String>,
    pub created_at: PrimitiveDateTime,
    pub modified_at: PrimitiveDateTime,
}

/// Insertable account row.
#[derive(Clone, Debug)]
pub struct AccountNew {
    pub user_id: String,
    pub customer_id: String,
    pub account_number: Secret<String, masking::CardNumberMask>,
    pub ifsc_code: Option<String>,
}

impl AccountNew {
    pub(crate) fn into_account(self) -> Account {
        let now = common_utils::date_time::now();
        Account {
            user_id: self.user_id,
            customer_id: self.customer_id,
            account_number: self.account_number,
            ifsc_code: self.ifsc_code,
            upi_id: None,
            created_at: now,
            modified_at: now,
        }
    }
}

/// Partial updates applied to an account row.
#[derive(Clone, Debug)]
pub enum AccountUpdate {
    /// Provisioning completed; the address the bank echoed back.
    UpiId { upi_id: String },
    /// Fields delivered by the account-creation callback; only present
    /// values are written.
    CallbackUpdate {
        account_number: Option<Secret<String, masking::CardNumberMask>>,
        ifsc_code: Option<String>,
    },
}

impl Account {
    /// Apply a partial update, refreshing `modified_at`.
    pub fn apply(mut self, update: AccountUpdate) -> Self {
        match update {
            AccountUpdate::UpiId { upi_id } => {
                self.upi_id = Some(upi_id);
            }
            AccountUpdate::CallbackUpdate {
                account_number,
                ifsc_code,
            } => {
                if let Some(account_number) = account_number {
                    self.account_number = account_number;
                }
                if ifsc_code.is_some() {
                    self.ifsc_code = ifsc_code;
                }
            }
        }
        self.modified_at = common_utils::date_time::now();
        self
    }
}
