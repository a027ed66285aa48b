//! Lambda request handlers

pub mod index;
pub mod provision;

pub use index::IndexHandler;
pub use provision::ProvisionHandler;
