//! Network configuration for the local L1/L2 devnet.
//!
//! Provides chain ids, RPC endpoints, and the L2 predeploy addresses. L1
//! contract addresses are deployment-specific and come from the address book
//! (see [`crate::contracts`]).

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

/// Default L1 devnet RPC endpoint.
pub const DEVNET_L1_RPC_URL: &str = "http://127.0.0.1:8545/";

/// Default L2 devnet RPC endpoint.
pub const DEVNET_L2_RPC_URL: &str = "http://127.0.0.1:9545/";

/// Settlement layer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1Config {
    /// Chain ID
    pub chain_id: u64,
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Block time in seconds
    pub block_time_secs: u64,
}

impl L1Config {
    /// Local devnet L1.
    pub fn devnet() -> Self {
        Self {
            chain_id: 900,
            rpc_url: DEVNET_L1_RPC_URL.to_string(),
            block_time_secs: 6,
        }
    }
}

/// Rollup layer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L2Config {
    /// Chain ID
    pub chain_id: u64,
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Block time in seconds
    pub block_time_secs: u64,
    /// L2ToL1MessagePasser predeploy
    pub message_passer: Address,
    /// L2CrossDomainMessenger predeploy
    pub cross_domain_messenger: Address,
    /// L2StandardBridge predeploy
    pub standard_bridge: Address,
    /// Multicall3 deployment on L2
    pub multicall3: Address,
}

impl L2Config {
    /// Local devnet L2.
    pub fn devnet() -> Self {
        Self {
            chain_id: 901,
            rpc_url: DEVNET_L2_RPC_URL.to_string(),
            block_time_secs: 2,
            message_passer: address!("4200000000000000000000000000000000000016"),
            cross_domain_messenger: address!("4200000000000000000000000000000000000007"),
            standard_bridge: address!("4200000000000000000000000000000000000010"),
            multicall3: address!("ca11bde05977b3631167028862be2a173976ca11"),
        }
    }
}

/// Complete network configuration for cross-chain actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// L1 configuration
    pub l1: L1Config,
    /// L2 configuration
    pub l2: L2Config,
}

impl NetworkConfig {
    /// Create the local devnet configuration.
    pub fn devnet() -> Self {
        Self {
            l1: L1Config::devnet(),
            l2: L2Config::devnet(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::devnet()
    }
}

/// Builder for custom network configurations.
#[derive(Debug, Clone)]
pub struct NetworkConfigBuilder {
    l1: L1Config,
    l2: L2Config,
}

impl NetworkConfigBuilder {
    /// Start with devnet defaults.
    pub fn devnet() -> Self {
        Self {
            l1: L1Config::devnet(),
            l2: L2Config::devnet(),
        }
    }

    /// Override the L1 RPC endpoint.
    pub fn l1_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.l1.rpc_url = url.into();
        self
    }

    /// Override the L2 RPC endpoint.
    pub fn l2_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.l2.rpc_url = url.into();
        self
    }

    /// Override the L1 chain id.
    pub const fn l1_chain_id(mut self, chain_id: u64) -> Self {
        self.l1.chain_id = chain_id;
        self
    }

    /// Override the L2 chain id.
    pub const fn l2_chain_id(mut self, chain_id: u64) -> Self {
        self.l2.chain_id = chain_id;
        self
    }

    /// Override the L2 Multicall3 address.
    pub const fn l2_multicall3(mut self, address: Address) -> Self {
        self.l2.multicall3 = address;
        self
    }

    /// Build the network configuration.
    pub fn build(self) -> NetworkConfig {
        NetworkConfig {
            l1: self.l1,
            l2: self.l2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_devnet_config() {
        let config = NetworkConfig::devnet();
        assert_eq!(config.l1.chain_id, 900);
        assert_eq!(config.l2.chain_id, 901);
        assert_eq!(config.l1.rpc_url, "http://127.0.0.1:8545/");
        assert_eq!(config.l2.rpc_url, "http://127.0.0.1:9545/");
    }

    #[test]
    fn test_predeploys() {
        let config = NetworkConfig::devnet();
        assert_eq!(
            config.l2.message_passer,
            address!("4200000000000000000000000000000000000016")
        );
        assert_eq!(
            config.l2.cross_domain_messenger,
            address!("4200000000000000000000000000000000000007")
        );
    }

    #[test]
    fn test_custom_config_builder() {
        let config = NetworkConfigBuilder::devnet()
            .l1_rpc_url("http://l1.internal:8545")
            .l2_chain_id(42069)
            .build();

        assert_eq!(config.l1.rpc_url, "http://l1.internal:8545");
        assert_eq!(config.l1.chain_id, 900);
        assert_eq!(config.l2.chain_id, 42069);
        assert_eq!(config.l2.rpc_url, DEVNET_L2_RPC_URL);
    }
}
