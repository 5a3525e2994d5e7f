//! Service layer: outbound transport, response envelopes, audit.

pub mod api;
pub mod audit;
pub mod encryption;

pub use api::{execute_bank_request, ApplicationResponse, BankTransport, ReqwestTransport, Response};
pub use audit::{AuditEntry, AuditSink, LogAuditSink};
