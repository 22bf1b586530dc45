pub mod deploy;
pub mod deposit;
pub mod fast_withdraw;
pub mod finalize;
pub mod prove;
pub mod transfer;
pub mod withdraw;

use alloy_primitives::{TxHash, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_rpc_types_eth::TransactionReceipt;
pub use client::SignerFn;
use std::future::Future;

/// Trait for executable onchain actions.
pub trait Action: Send + Sync {
    /// Check to see if the action is ready to be executed.
    ///
    /// Returns true if all preconditions are met.
    fn is_ready(&self) -> impl Future<Output = eyre::Result<bool>> + Send;

    /// Check if the action has already been completed.
    ///
    /// Returns true if the action was already executed successfully.
    fn is_completed(&self) -> impl Future<Output = eyre::Result<bool>> + Send;

    /// Execute the action.
    ///
    /// Returns the receipt summary of the last transaction sent.
    fn execute(&mut self) -> impl Future<Output = eyre::Result<Result>> + Send;

    /// Get a human-readable description of this action.
    fn description(&self) -> String;
}

/// Result of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Result {
    /// Transaction hash
    pub tx_hash: TxHash,
    /// Block number where transaction was included
    pub block_number: Option<u64>,
    /// Gas used
    pub gas_used: Option<U256>,
    /// Fee paid by the sender (gas used × effective gas price)
    pub fee: U256,
}

impl Result {
    pub fn from_receipt(receipt: &TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: Some(U256::from(receipt.gas_used)),
            fee: U256::from(receipt.gas_used) * U256::from(receipt.effective_gas_price),
        }
    }
}

/// Sign a request, broadcast it and wait for a successful receipt.
///
/// The signer fills nonce, fees and gas. A reverted receipt is an error.
pub(crate) async fn submit<P>(
    provider: &P,
    signer: &SignerFn,
    tx: TransactionRequest,
) -> eyre::Result<TransactionReceipt>
where
    P: Provider,
{
    let signed_tx = (signer)(tx).await?;

    let pending = provider.send_raw_transaction(&signed_tx).await?;
    let receipt = pending.get_receipt().await?;

    if !receipt.status() {
        eyre::bail!("Transaction {} reverted", receipt.transaction_hash);
    }

    Ok(receipt)
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::SignerFn;
    use alloy_provider::{network::Ethereum, Provider, RootProvider};
    use std::sync::Arc;

    /// Mock provider for unit tests.
    #[derive(Clone)]
    pub struct MockProvider;

    impl Provider for MockProvider {
        fn root(&self) -> &RootProvider<Ethereum> {
            todo!()
        }
    }

    /// Create a mock signer for testing that panics if called.
    /// Used for tests that don't actually execute transactions.
    pub fn mock_signer() -> SignerFn {
        Arc::new(|_tx| Box::pin(async { panic!("mock signer should not be called") }))
    }
}
