//! Database interface for devices / client sessions.

use common_utils::errors::CustomResult;
use error_stack::IntoReport;

use super::MockDb;
use crate::{
    core::errors,
    types::storage::{Device, DeviceNew, DeviceUpdate},
};

/// Device row access.
#[async_trait::async_trait]
pub trait DeviceInterface {
    /// Find the device bound to a user.
    async fn find_device_by_user_id(
        &self,
        user_id: &str,
    ) -> CustomResult<Device, errors::StorageError>;

    /// Insert a device row, or replace the existing row for the user with
    /// the freshly bound one.
    async fn insert_device(
        &self,
        device: DeviceNew,
    ) -> CustomResult<Device, errors::StorageError>;

    /// Apply a partial update to the user's device row.
    async fn update_device_by_user_id(
        &self,
        user_id: &str,
        update: DeviceUpdate,
    ) -> CustomResult<Device, errors::StorageError>;

    /// Delete the user's device row, burning the client id. Succeeds with
    /// `false` when there was nothing to delete.
    async fn delete_device_by_user_id(
        &self,
        user_id: &str,
    ) -> CustomResult<bool, errors::StorageError>;
}

#[async_trait::async_trait]
impl DeviceInterface for MockDb {
    async fn find_device_by_user_id(
        &self,
        user_id: &str,
    ) -> CustomResult<Device, errors::StorageError> {
        let devices = self
            .devices
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        devices
            .iter()
            .find(|device| device.user_id == user_id)
            .cloned()
            .ok_or(errors::StorageError::ValueNotFound(format!(
                "device for user {user_id}"
            )))
            .into_report()
    }

    async fn insert_device(
        &self,
        device: DeviceNew,
    ) -> CustomResult<Device, errors::StorageError> {
        let mut devices = self
            .devices
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        devices.retain(|existing| existing.user_id != device.user_id);
        let device = device.into_device();
        devices.push(device.clone());
        Ok(device)
    }

    async fn update_device_by_user_id(
        &self,
        user_id: &str,
        update: DeviceUpdate,
    ) -> CustomResult<Device, errors::StorageError> {
        let mut devices = self
            .devices
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        let device = devices
            .iter_mut()
            .find(|device| device.user_id == user_id)
            .ok_or(errors::StorageError::ValueNotFound(format!(
                "device for user {user_id}"
            )))
            .into_report()?;
        *device = device.clone().apply(update);
        Ok(device.clone())
    }

    async fn delete_device_by_user_id(
        &self,
        user_id: &str,
    ) -> CustomResult<bool, errors::StorageError> {
        let mut devices = self
            .devices
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        let before = devices.len();
        devices.retain(|device| device.user_id != user_id);
        Ok(devices.len() != before)
    }
}
