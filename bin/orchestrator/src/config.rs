use crate::lifecycle::{LifecycleSettings, ProveRetry};
use alloy_primitives::{utils::parse_ether, Address, U256};
use config::{AddressBook, L1Contracts, NetworkConfig, NetworkConfigBuilder};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Top-level orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// L1 RPC endpoint url
    pub l1_rpc_url: String,

    /// L2 RPC endpoint url
    pub l2_rpc_url: String,

    #[serde(default = "default_l1_chain_id")]
    pub l1_chain_id: u64,

    #[serde(default = "default_l2_chain_id")]
    pub l2_chain_id: u64,

    /// Address books with the L1 deployment, later files win
    pub address_books: Vec<PathBuf>,

    /// Address book the deployment driver records into
    #[serde(default = "default_deploy_output")]
    pub deploy_output: PathBuf,

    /// Hardhat `artifacts/contracts` directory
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Seconds between status polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Prometheus exporter port; no exporter when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,

    #[serde(default)]
    pub withdrawal: WithdrawalConfig,

    #[serde(default)]
    pub accounts: AccountsConfig,

    /// Retry proof submission while the oracle catches up
    #[serde(default)]
    pub prove_retry: Option<ProveRetryConfig>,

    #[serde(default)]
    pub log: LogConfig,
}

/// The withdrawal driven by the `orchestrator` binary and `step e2e`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalConfig {
    /// Amount in ether, e.g. `"1"` or `"0.5"`
    pub amount_eth: String,
    /// L1 recipient; the finalizing account when unset
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default = "default_min_gas_limit")]
    pub min_gas_limit: u32,
}

impl Default for WithdrawalConfig {
    fn default() -> Self {
        Self {
            amount_eth: "1".to_string(),
            to: None,
            min_gas_limit: default_min_gas_limit(),
        }
    }
}

impl WithdrawalConfig {
    pub fn amount(&self) -> eyre::Result<U256> {
        parse_ether(&self.amount_eth)
            .map_err(|e| eyre::eyre!("Invalid withdrawal amount {:?}: {e}", self.amount_eth))
    }
}

/// Devnet account indices used when no private key is given.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AccountsConfig {
    pub withdrawer: usize,
    pub prover: usize,
    pub finalizer: usize,
    pub deployer: usize,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            withdrawer: 0,
            prover: 1,
            finalizer: 2,
            deployer: 9,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProveRetryConfig {
    pub attempts: usize,
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

const fn default_l1_chain_id() -> u64 {
    900
}

const fn default_l2_chain_id() -> u64 {
    901
}

fn default_deploy_output() -> PathBuf {
    PathBuf::from("afterDevnetUp.deploy.json")
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts/contracts")
}

const fn default_poll_interval_secs() -> u64 {
    5
}

// plain value withdrawals need no more than a transfer on L1
const fn default_min_gas_limit() -> u32 {
    21_000
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;

        Ok(config)
    }

    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfigBuilder::devnet()
            .l1_rpc_url(&self.l1_rpc_url)
            .l2_rpc_url(&self.l2_rpc_url)
            .l1_chain_id(self.l1_chain_id)
            .l2_chain_id(self.l2_chain_id)
            .build()
    }

    /// Load the address books and resolve the L1 contracts.
    ///
    /// The deployment output is read last, so contracts deployed by the
    /// harness override the devnet's own book.
    pub fn l1_contracts(&self) -> eyre::Result<L1Contracts> {
        let mut books = Vec::with_capacity(self.address_books.len() + 1);
        for path in &self.address_books {
            books.push(AddressBook::load(path)?);
        }
        if !self.address_books.contains(&self.deploy_output) {
            books.push(AddressBook::load(&self.deploy_output)?);
        }

        Ok(L1Contracts::from_books(&books)?)
    }

    /// Hardhat artifact path for a contract, `<dir>/<Name>.sol/<Name>.json`.
    ///
    /// `contract` may carry a source subdirectory, e.g. `test/Ton`.
    pub fn artifact_path(&self, contract: &str) -> PathBuf {
        let name = contract.rsplit('/').next().unwrap_or(contract);
        self.artifacts_dir
            .join(format!("{contract}.sol"))
            .join(format!("{name}.json"))
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn lifecycle_settings(&self) -> LifecycleSettings {
        LifecycleSettings {
            min_gas_limit: self.withdrawal.min_gas_limit,
            prove_retry: self.prove_retry.map(|retry| ProveRetry {
                attempts: retry.attempts,
                interval: Duration::from_secs(retry.interval_secs),
            }),
            poll_interval: self.poll_interval(),
        }
    }
}
