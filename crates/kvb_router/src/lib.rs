#![forbid(unsafe_code)]

//! Integration router between the mobile banking app and the KVB core
//! banking partner.

pub mod configs;
pub mod connector;
pub mod consts;
pub mod core;
pub mod db;
pub mod routes;
pub mod services;
pub mod types;
pub mod utils;
pub mod workflows;

pub use self::routes::AppState;
