//! Database interface for users.

use common_utils::errors::CustomResult;
use error_stack::IntoReport;

use super::MockDb;
use crate::{
    core::errors,
    types::storage::{User, UserNew, UserUpdate},
};

/// User row access.
#[async_trait::async_trait]
pub trait UserInterface {
    /// Find a user by id.
    async fn find_user_by_id(&self, user_id: &str) -> CustomResult<User, errors::StorageError>;

    /// Find a user by the CBS customer id.
    async fn find_user_by_customer_id(
        &self,
        customer_id: &str,
    ) -> CustomResult<User, errors::StorageError>;

    /// Insert a user row.
    async fn insert_user(&self, user: UserNew) -> CustomResult<User, errors::StorageError>;

    /// Apply a partial update to a user row.
    async fn update_user_by_id(
        &self,
        user_id: &str,
        update: UserUpdate,
    ) -> CustomResult<User, errors::StorageError>;
}

#[async_trait::async_trait]
impl UserInterface for MockDb {
    async fn find_user_by_id(&self, user_id: &str) -> CustomResult<User, errors::StorageError> {
        let users = self
            .users
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        users
            .iter()
            .find(|user| user.user_id == user_id)
            .cloned()
            .ok_or(errors::StorageError::ValueNotFound(format!("user {user_id}")))
            .into_report()
    }

    async fn find_user_by_customer_id(
        &self,
        customer_id: &str,
    ) -> CustomResult<User, errors::StorageError> {
        let users = self
            .users
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        users
            .iter()
            .find(|user| user.customer_id.as_deref() == Some(customer_id))
            .cloned()
            .ok_or(errors::StorageError::ValueNotFound(format!(
                "user for customer {customer_id}"
            )))
            .into_report()
    }

    async fn insert_user(&self, user: UserNew) -> CustomResult<User, errors::StorageError> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        if users.iter().any(|existing| existing.user_id == user.user_id) {
            return Err(errors::StorageError::DuplicateValue { entity: "user" }).into_report();
        }
        let user = user.into_user();
        users.push(user.clone());
        Ok(user)
    }

    async fn update_user_by_id(
        &self,
        user_id: &str,
        update: UserUpdate,
    ) -> CustomResult<User, errors::StorageError> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        let user = users
            .iter_mut()
            .find(|user| user.user_id == user_id)
            .ok_or(errors::StorageError::ValueNotFound(format!("user {user_id}")))
            .into_report()?;
        *user = user.clone().apply(update);
        Ok(user.clone())
    }
}
