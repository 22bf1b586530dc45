//! Contract deployment driver.
//!
//! Deploys a compiled contract from its Hardhat artifact and records the
//! created address in the JSON address book under the contract's name.

use crate::{submit, Action, SignerFn};
use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, Bytes};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::SolValue;
use config::{AddressBook, ContractRole};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Compiled contract as written by Hardhat (`artifacts/contracts/X.sol/X.json`).
///
/// Only the creation bytecode is used; the ABI is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    #[serde(rename = "contractName", default)]
    pub contract_name: Option<String>,
    pub bytecode: Bytes,
}

impl Artifact {
    pub fn load(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read artifact {}: {e}", path.display()))?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> eyre::Result<Self> {
        let artifact: Self = serde_json::from_str(json)?;
        if artifact.bytecode.is_empty() {
            eyre::bail!("Artifact has no creation bytecode (abstract contract or interface?)");
        }
        Ok(artifact)
    }
}

/// A contract the devnet needs, with its constructor arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployTarget {
    Multicall3,
    /// ERC20 used by the token bridge tests
    Token { name: String, symbol: String },
    FastWithdraw {
        portal: Address,
        l2_output_oracle: Address,
        l1_messenger: Address,
        l2_messenger: Address,
        l1_bridge: Address,
        l2_bridge: Address,
    },
}

impl DeployTarget {
    /// The devnet token, `TON`.
    pub fn ton() -> Self {
        Self::Token {
            name: "tokamak network".to_string(),
            symbol: "ton".to_string(),
        }
    }

    pub const fn role(&self) -> ContractRole {
        match self {
            Self::Multicall3 => ContractRole::Multicall3,
            Self::Token { .. } => ContractRole::Token,
            Self::FastWithdraw { .. } => ContractRole::FastWithdraw,
        }
    }

    /// Address book key the deployment is recorded under.
    pub const fn name(&self) -> &'static str {
        self.role().key()
    }

    /// Hardhat source path of the contract, relative to `artifacts/contracts`.
    pub const fn artifact_name(&self) -> &'static str {
        match self {
            Self::Multicall3 => "test/Multicall3",
            Self::Token { .. } => "test/Ton",
            Self::FastWithdraw { .. } => "FastWithdraw",
        }
    }

    /// ABI-encoded constructor arguments, appended to the creation code.
    pub fn constructor_args(&self) -> Vec<u8> {
        match self {
            Self::Multicall3 => Vec::new(),
            Self::Token { name, symbol } => (name.clone(), symbol.clone()).abi_encode_params(),
            Self::FastWithdraw {
                portal,
                l2_output_oracle,
                l1_messenger,
                l2_messenger,
                l1_bridge,
                l2_bridge,
            } => (
                *portal,
                *l2_output_oracle,
                *l1_messenger,
                *l2_messenger,
                *l1_bridge,
                *l2_bridge,
            )
                .abi_encode_params(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Deploy {
    pub target: DeployTarget,
    pub artifact: Artifact,
    /// Address book the created address is recorded in
    pub address_book: PathBuf,
    pub from: Address,
}

pub struct DeployAction<P> {
    provider: P,
    signer: SignerFn,
    action: Deploy,
    deployed: Option<Address>,
}

impl<P> DeployAction<P>
where
    P: Provider + Clone,
{
    pub fn new(provider: P, signer: SignerFn, action: Deploy) -> Self {
        Self {
            provider,
            signer,
            action,
            deployed: None,
        }
    }

    /// Address created by [`Action::execute`].
    pub const fn deployed(&self) -> Option<Address> {
        self.deployed
    }

    /// Creation code followed by the encoded constructor arguments.
    pub fn init_code(&self) -> Bytes {
        let mut code = self.action.artifact.bytecode.to_vec();
        code.extend(self.action.target.constructor_args());
        code.into()
    }

    async fn recorded_code_exists(&self) -> eyre::Result<bool> {
        let book = AddressBook::load(&self.action.address_book)?;
        let Some(address) = book.get(self.action.target.name()) else {
            return Ok(false);
        };
        let code = self.provider.get_code_at(address).await?;
        Ok(!code.is_empty())
    }
}

impl<P> Action for DeployAction<P>
where
    P: Provider + Clone,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        Ok(!self.action.artifact.bytecode.is_empty())
    }

    /// A deployment counts as done when the address book points at live code.
    async fn is_completed(&self) -> eyre::Result<bool> {
        self.recorded_code_exists().await
    }

    async fn execute(&mut self) -> eyre::Result<crate::Result> {
        let name = self.action.target.name();
        info!(contract = name, from = %self.action.from, "Deploying contract");

        let tx_request = TransactionRequest::default()
            .from(self.action.from)
            .with_deploy_code(self.init_code());

        let receipt = submit(&self.provider, &self.signer, tx_request).await?;
        let Some(address) = receipt.contract_address else {
            eyre::bail!(
                "Deployment of {name} in {} created no contract",
                receipt.transaction_hash
            );
        };

        AddressBook::record(&self.action.address_book, name, address)?;

        info!(
            contract = name,
            address = %address,
            tx_hash = %receipt.transaction_hash,
            address_book = %self.action.address_book.display(),
            "Contract deployed"
        );

        self.deployed = Some(address);
        Ok(crate::Result::from_receipt(&receipt))
    }

    fn description(&self) -> String {
        format!(
            "Deploy {} and record it in {}",
            self.action.target.name(),
            self.action.address_book.display()
        )
    }
}
