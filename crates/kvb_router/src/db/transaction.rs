//! Database interface for transactions.

use common_utils::errors::CustomResult;
use error_stack::IntoReport;

use super::MockDb;
use crate::{
    core::errors,
    types::storage::{Transaction, TransactionNew, TransactionUpdate},
};

/// Transaction row access.
#[async_trait::async_trait]
pub trait TransactionInterface {
    /// Find a transaction by the id issued toward the bank.
    async fn find_transaction_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> CustomResult<Transaction, errors::StorageError>;

    /// All transactions recorded against a beneficiary.
    async fn find_transactions_by_beneficiary_id(
        &self,
        beneficiary_id: &str,
    ) -> CustomResult<Vec<Transaction>, errors::StorageError>;

    /// Insert a transaction row; errors on a duplicate id.
    async fn insert_transaction(
        &self,
        transaction: TransactionNew,
    ) -> CustomResult<Transaction, errors::StorageError>;

    /// Apply a partial update to a transaction row.
    async fn update_transaction_by_transaction_id(
        &self,
        transaction_id: &str,
        update: TransactionUpdate,
    ) -> CustomResult<Transaction, errors::StorageError>;
}

#[async_trait::async_trait]
impl TransactionInterface for MockDb {
    async fn find_transaction_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> CustomResult<Transaction, errors::StorageError> {
        let transactions = self
            .transactions
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        transactions
            .iter()
            .find(|transaction| transaction.transaction_id == transaction_id)
            .cloned()
            .ok_or(errors::StorageError::ValueNotFound(format!(
                "transaction {transaction_id}"
            )))
            .into_report()
    }

    async fn find_transactions_by_beneficiary_id(
        &self,
        beneficiary_id: &str,
    ) -> CustomResult<Vec<Transaction>, errors::StorageError> {
        let transactions = self
            .transactions
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        Ok(transactions
            .iter()
            .filter(|transaction| transaction.beneficiary_id.as_deref() == Some(beneficiary_id))
            .cloned()
            .collect())
    }

    async fn insert_transaction(
        &self,
        transaction: TransactionNew,
    ) -> CustomResult<Transaction, errors::StorageError> {
        let mut transactions = self
            .transactions
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        if transactions
            .iter()
            .any(|existing| existing.transaction_id == transaction.transaction_id)
        {
            return Err(errors::StorageError::DuplicateValue {
                entity: "transaction",
            })
            .into_report();
        }
        let transaction = transaction.into_transaction();
        transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn update_transaction_by_transaction_id(
        &self,
        transaction_id: &str,
        update: TransactionUpdate,
    ) -> CustomResult<Transaction, errors::StorageError> {
        let mut transactions = self
            .transactions
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        let transaction = transactions
            .iter_mut()
            .find(|transaction| transaction.transaction_id == transaction_id)
            .ok_or(errors::StorageError::ValueNotFound(format!(
                "transaction {transaction_id}"
            )))
            .into_report()?;
        *transaction = transaction.clone().apply(update);
        Ok(transaction.clone())
    }
}
