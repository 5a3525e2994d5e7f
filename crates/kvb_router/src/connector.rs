//! Connectors toward external partners.

pub mod kvb;

pub use kvb::Kvb;
