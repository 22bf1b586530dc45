//! Logical contract roles on L1 and their resolved addresses.

use crate::{AddressBook, ConfigError};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A contract the harness talks to on L1, identified by what it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContractRole {
    Portal,
    L2OutputOracle,
    L1StandardBridge,
    L1CrossDomainMessenger,
    DisputeGameFactory,
    Multicall3,
    /// ERC20 test token deployed by the harness
    Token,
    FastWithdraw,
}

impl ContractRole {
    pub const ALL: [Self; 8] = [
        Self::Portal,
        Self::L2OutputOracle,
        Self::L1StandardBridge,
        Self::L1CrossDomainMessenger,
        Self::DisputeGameFactory,
        Self::Multicall3,
        Self::Token,
        Self::FastWithdraw,
    ];

    /// Key under which the role is recorded in an address book.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Portal => "OptimismPortalProxy",
            Self::L2OutputOracle => "L2OutputOracleProxy",
            Self::L1StandardBridge => "L1StandardBridgeProxy",
            Self::L1CrossDomainMessenger => "L1CrossDomainMessengerProxy",
            Self::DisputeGameFactory => "DisputeGameFactoryProxy",
            Self::Multicall3 => "Multicall3",
            Self::Token => "Ton",
            Self::FastWithdraw => "FastWithdraw",
        }
    }
}

impl fmt::Display for ContractRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Portal => "portal",
            Self::L2OutputOracle => "l2OutputOracle",
            Self::L1StandardBridge => "l1StandardBridge",
            Self::L1CrossDomainMessenger => "l1CrossDomainMessenger",
            Self::DisputeGameFactory => "disputeGameFactory",
            Self::Multicall3 => "multicall3",
            Self::Token => "token",
            Self::FastWithdraw => "fastWithdraw",
        };
        f.write_str(name)
    }
}

/// L1 contract addresses resolved from one or more address books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1Contracts {
    pub portal: Address,
    pub l2_output_oracle: Address,
    pub l1_standard_bridge: Address,
    pub l1_cross_domain_messenger: Address,
    pub dispute_game_factory: Option<Address>,
    pub multicall3: Option<Address>,
    pub token: Option<Address>,
    pub fast_withdraw: Option<Address>,
}

impl L1Contracts {
    /// Resolve contracts from address books; later books override earlier ones.
    pub fn from_books(books: &[AddressBook]) -> Result<Self, ConfigError> {
        let mut merged = AddressBook::new();
        for book in books {
            merged.merge(book);
        }

        let required = |role: ContractRole| {
            merged.get(role.key()).ok_or(ConfigError::MissingContract {
                role,
                key: role.key(),
            })
        };

        Ok(Self {
            portal: required(ContractRole::Portal)?,
            l2_output_oracle: required(ContractRole::L2OutputOracle)?,
            l1_standard_bridge: required(ContractRole::L1StandardBridge)?,
            l1_cross_domain_messenger: required(ContractRole::L1CrossDomainMessenger)?,
            dispute_game_factory: merged.get(ContractRole::DisputeGameFactory.key()),
            multicall3: merged.get(ContractRole::Multicall3.key()),
            token: merged.get(ContractRole::Token.key()),
            fast_withdraw: merged.get(ContractRole::FastWithdraw.key()),
        })
    }

    /// Address for a role, if known.
    pub const fn get(&self, role: ContractRole) -> Option<Address> {
        match role {
            ContractRole::Portal => Some(self.portal),
            ContractRole::L2OutputOracle => Some(self.l2_output_oracle),
            ContractRole::L1StandardBridge => Some(self.l1_standard_bridge),
            ContractRole::L1CrossDomainMessenger => Some(self.l1_cross_domain_messenger),
            ContractRole::DisputeGameFactory => self.dispute_game_factory,
            ContractRole::Multicall3 => self.multicall3,
            ContractRole::Token => self.token,
            ContractRole::FastWithdraw => self.fast_withdraw,
        }
    }

    /// Address for a role, or an error naming the missing address book key.
    pub fn require(&self, role: ContractRole) -> Result<Address, ConfigError> {
        self.get(role).ok_or(ConfigError::MissingContract {
            role,
            key: role.key(),
        })
    }
}
