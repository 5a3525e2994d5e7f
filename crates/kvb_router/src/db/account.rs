//! Database interface for accounts.

use common_utils::errors::CustomResult;
use error_stack::IntoReport;

use super::MockDb;
use crate::{
    core::errors,
    types::storage::{Account, AccountNew, AccountUpdate},
};

/// Account row access.
#[async_trait::async_trait]
pub trait AccountInterface {
    /// Find the account held by a user.
    async fn find_account_by_user_id(
        &self,
        user_id: &str,
    ) -> CustomResult<Account, errors::StorageError>;

    /// Find an account by the CBS customer id.
    async fn find_account_by_customer_id(
        &self,
        customer_id: &str,
    ) -> CustomResult<Account, errors::StorageError>;

    /// Insert an account row; errors on a duplicate user.
    async fn insert_account(
        &self,
        account: AccountNew,
    ) -> CustomResult<Account, errors::StorageError>;

    /// Apply a partial update to the user's account row.
    async fn update_account_by_user_id(
        &self,
        user_id: &str,
        update: AccountUpdate,
    ) -> CustomResult<Account, errors::StorageError>;
}

#[async_trait::async_trait]
impl AccountInterface for MockDb {
    async fn find_account_by_user_id(
        &self,
        user_id: &str,
    ) -> CustomResult<Account, errors::StorageError> {
        let accounts = self
            .accounts
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        accounts
            .iter()
            .find(|account| account.user_id == user_id)
            .cloned()
            .ok_or(errors::StorageError::ValueNotFound(format!(
                "account for user {user_id}"
            )))
            .into_report()
    }

    async fn find_account_by_customer_id(
        &self,
        customer_id: &str,
    ) -> CustomResult<Account, errors::StorageError> {
        let accounts = self
            .accounts
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        accounts
            .iter()
            .find(|account| account.customer_id == customer_id)
            .cloned()
            .ok_or(errors::StorageError::ValueNotFound(format!(
                "account for customer {customer_id}"
            )))
            .into_report()
    }

    async fn insert_account(
        &self,
        account: AccountNew,
    ) -> CustomResult<Account, errors::StorageError> {
        let mut accounts = self
            .accounts
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        if accounts
            .iter()
            .any(|existing| existing.user_id == account.user_id)
        {
            return Err(errors::StorageError::DuplicateValue { entity: "account" }).into_report();
        }
        let account = account.into_account();
        accounts.push(account.clone());
        Ok(account)
    }

    async fn update_account_by_user_id(
        &self,
        user_id: &str,
        update: AccountUpdate,
    ) -> CustomResult<Account, errors::StorageError> {
        let mut accounts = self
            .accounts
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        let account = accounts
            .iter_mut()
            .find(|account| account.user_id == user_id)
            .ok_or(errors::StorageError::ValueNotFound(format!(
                "account for user {user_id}"
            )))
            .into_report()?;
        *account = account.clone().apply(update);
        Ok(account.clone())
    }
}
