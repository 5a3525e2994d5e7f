//! Database interface for beneficiaries.

use common_utils::errors::CustomResult;
use error_stack::IntoReport;

use super::MockDb;
use crate::{
    core::errors,
    types::storage::{Beneficiary, BeneficiaryNew, BeneficiaryUpdate},
};

/// Beneficiary row access.
#[async_trait::async_trait]
pub trait BeneficiaryInterface {
    /// All beneficiaries registered by a user.
    async fn find_beneficiaries_by_user_id(
        &self,
        user_id: &str,
    ) -> CustomResult<Vec<Beneficiary>, errors::StorageError>;

    /// Find one beneficiary.
    async fn find_beneficiary_by_id(
        &self,
        beneficiary_id: &str,
    ) -> CustomResult<Beneficiary, errors::StorageError>;

    /// Insert a beneficiary row.
    async fn insert_beneficiary(
        &self,
        beneficiary: BeneficiaryNew,
    ) -> CustomResult<Beneficiary, errors::StorageError>;

    /// Apply a partial update to a beneficiary row.
    async fn update_beneficiary_by_id(
        &self,
        beneficiary_id: &str,
        update: BeneficiaryUpdate,
    ) -> CustomResult<Beneficiary, errors::StorageError>;
}

#[async_trait::async_trait]
impl BeneficiaryInterface for MockDb {
    async fn find_beneficiaries_by_user_id(
        &self,
        user_id: &str,
    ) -> CustomResult<Vec<Beneficiary>, errors::StorageError> {
        let beneficiaries = self
            .beneficiaries
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        Ok(beneficiaries
            .iter()
            .filter(|beneficiary| beneficiary.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_beneficiary_by_id(
        &self,
        beneficiary_id: &str,
    ) -> CustomResult<Beneficiary, errors::StorageError> {
        let beneficiaries = self
            .beneficiaries
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        beneficiaries
            .iter()
            .find(|beneficiary| beneficiary.beneficiary_id == beneficiary_id)
            .cloned()
            .ok_or(errors::StorageError::ValueNotFound(format!(
                "beneficiary {beneficiary_id}"
            )))
            .into_report()
    }

    async fn insert_beneficiary(
        &self,
        beneficiary: BeneficiaryNew,
    ) -> CustomResult<Beneficiary, errors::StorageError> {
        let mut beneficiaries = self
            .beneficiaries
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        if beneficiaries
            .iter()
            .any(|existing| existing.beneficiary_id == beneficiary.beneficiary_id)
        {
            return Err(errors::StorageError::DuplicateValue {
                entity: "beneficiary",
            })
            .into_report();
        }
        let beneficiary = beneficiary.into_beneficiary();
        beneficiaries.push(beneficiary.clone());
        Ok(beneficiary)
    }

    async fn update_beneficiary_by_id(
        &self,
        beneficiary_id: &str,
        update: BeneficiaryUpdate,
    ) -> CustomResult<Beneficiary, errors::StorageError> {
        let mut beneficiaries = self
            .beneficiaries
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        let beneficiary = beneficiaries
            .iter_mut()
            .find(|beneficiary| beneficiary.beneficiary_id == beneficiary_id)
            .ok_or(errors::StorageError::ValueNotFound(format!(
                "beneficiary {beneficiary_id}"
            )))
            .into_report()?;
        *beneficiary = beneficiary.clone().apply(update);
        Ok(beneficiary.clone())
    }
}
