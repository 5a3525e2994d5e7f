#![forbid(unsafe_code)]

//! Request and response models for the banking integration router.

pub mod beneficiary;
pub mod callbacks;
pub mod enums;
pub mod upi;
