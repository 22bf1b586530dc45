//! JSON address book shared between the deployment driver and the harness.
//!
//! The file is a flat object mapping contract names to hex-encoded addresses:
//!
//! ```json
//! { "Multicall3": "0x...", "FastWithdraw": "0x..." }
//! ```
//!
//! Updates are read-merge-write and not atomic; concurrent writers to the same
//! file may lose entries.

use crate::ConfigError;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressBook {
    entries: BTreeMap<String, Address>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an address book from disk. A missing file is an empty book.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(Self::new());
        }

        serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the address book to disk, replacing the file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Record a single entry: read the current file, merge, write it back.
    pub fn record(
        path: impl AsRef<Path>,
        name: impl Into<String>,
        address: Address,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut book = Self::load(path)?;
        book.insert(name, address);
        book.save(path)?;
        Ok(book)
    }

    pub fn get(&self, name: &str) -> Option<Address> {
        self.entries.get(name).copied()
    }

    /// Insert or overwrite an entry, returning the previous address.
    pub fn insert(&mut self, name: impl Into<String>, address: Address) -> Option<Address> {
        self.entries.insert(name.into(), address)
    }

    /// Merge another book into this one. Entries in `other` win.
    pub fn merge(&mut self, other: &Self) {
        for (name, address) in &other.entries {
            self.entries.insert(name.clone(), *address);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Address)> {
        self.entries.iter().map(|(name, address)| (name.as_str(), *address))
    }
}
