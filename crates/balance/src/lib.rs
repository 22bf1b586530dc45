//! Balance queries for bridge accounts.
//!
//! The harness snapshots balances around a bridge operation and checks the
//! change: a finalized withdrawal credits the recipient on L1, a deposit
//! credits it on L2.

pub mod monitor;

pub use monitor::{erc20_balance, BalanceMonitor};

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Represents a blockchain balance at a specific point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// The address holding the balance
    pub holder: Address,
    /// The asset address (zero address for native token)
    pub asset: Address,
    /// The balance amount
    pub amount: U256,
}

impl Balance {
    /// Change from `self` to a later reading of the same holder and asset.
    pub fn change_to(&self, later: &Self) -> eyre::Result<BalanceChange> {
        if self.holder != later.holder || self.asset != later.asset {
            eyre::bail!(
                "Cannot compare balance of {}/{} with {}/{}",
                self.holder,
                self.asset,
                later.holder,
                later.asset
            );
        }

        Ok(match later.amount.cmp(&self.amount) {
            std::cmp::Ordering::Greater => BalanceChange::Increased(later.amount - self.amount),
            std::cmp::Ordering::Less => BalanceChange::Decreased(self.amount - later.amount),
            std::cmp::Ordering::Equal => BalanceChange::Unchanged,
        })
    }
}

/// Direction and size of a balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceChange {
    Increased(U256),
    Decreased(U256),
    Unchanged,
}

impl BalanceChange {
    /// Amount gained, if any.
    pub const fn increase(&self) -> Option<U256> {
        match self {
            Self::Increased(amount) => Some(*amount),
            _ => None,
        }
    }
}

/// Type of balance query to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceQuery {
    /// Query ERC20 token balance for an EOA or contract
    ERC20Balance {
        /// Token contract address
        token: Address,
        /// Holder address
        holder: Address,
    },
    /// Query native ETH balance
    NativeBalance {
        /// Account address
        address: Address,
    },
}

impl BalanceQuery {
    pub const fn native(address: Address) -> Self {
        Self::NativeBalance { address }
    }

    /// Native balance when `token` is the zero address, ERC20 otherwise.
    pub fn for_asset(token: Address, holder: Address) -> Self {
        if token.is_zero() {
            Self::NativeBalance { address: holder }
        } else {
            Self::ERC20Balance { token, holder }
        }
    }
}

/// Trait for monitoring balances on a blockchain.
pub trait Monitor: Send + Sync {
    /// Query a single balance.
    fn query_balance(
        &self,
        query: BalanceQuery,
    ) -> impl Future<Output = eyre::Result<Balance>> + Send;
}
