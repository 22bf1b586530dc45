//! Configuration types for the devnet bridge harness.
//!
//! This crate provides:
//! - Network configurations for the local L1/L2 devnet
//! - Contract roles and their resolved L1 addresses
//! - The JSON address book written by the deployment driver

pub mod address_book;
pub mod contracts;
pub mod network;

pub use address_book::AddressBook;
pub use contracts::{ContractRole, L1Contracts};
pub use network::{L1Config, L2Config, NetworkConfig, NetworkConfigBuilder};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Address book could not be read or written
    #[error("Address book {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Address book is not a flat `{name: address}` JSON object
    #[error("Malformed address book {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A required contract role has no entry in any address book
    #[error("No address recorded for {role} (expected key `{key}`)")]
    MissingContract { role: ContractRole, key: &'static str },
}
