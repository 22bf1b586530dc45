//! Finalize withdrawal action.
//!
//! Completes a proven withdrawal on L1 along a resolved
//! [`FinalizationRoute`]: directly on the portal, or as a replay of a failed
//! relay on the L1 messenger.

use crate::{submit, Action, SignerFn};
use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::SolCall;
use binding::opstack::{
    ICrossDomainMessenger,
    IOptimismPortal::{self, finalizeWithdrawalTransactionCall},
};
use messenger::FinalizationRoute;
use tracing::info;
use withdrawal::{hash::hash_cross_domain_message_v1, timing, WithdrawalHash};

/// Input data for finalizing a withdrawal on L1.
#[derive(Clone, Debug)]
pub struct Finalize {
    /// OptimismPortal contract address on L1
    pub portal_address: Address,
    /// L2OutputOracle contract address on L1
    pub oracle_address: Address,
    /// L1CrossDomainMessenger contract address
    pub l1_messenger_address: Address,
    /// Hash of the withdrawal
    pub withdrawal_hash: WithdrawalHash,
    pub route: FinalizationRoute,
    /// Address that will submit the finalize transaction
    pub from: Address,
}

/// Build the L1 transaction a route finalizes with.
///
/// `Direct` calls the portal with the withdrawal tuple. `Replay` calls
/// `relayMessage` on the L1 messenger with no value attached, since the value
/// stayed in the messenger after the failed relay.
pub fn finalize_request(finalize: &Finalize) -> TransactionRequest {
    let (to, input) = match &finalize.route {
        FinalizationRoute::Direct(withdrawal) => (
            finalize.portal_address,
            finalizeWithdrawalTransactionCall {
                _tx: withdrawal.clone(),
            }
            .abi_encode(),
        ),
        FinalizationRoute::Replay(args) => (finalize.l1_messenger_address, args.abi_encode()),
    };

    TransactionRequest::default()
        .with_from(finalize.from)
        .with_to(to)
        .with_value(U256::ZERO)
        .with_input(input)
}

/// Action to finalize a proven withdrawal on L1.
///
/// `execute` does not check for a previous finalization; the portal and the
/// messenger reject duplicates themselves.
pub struct FinalizeAction<P> {
    l1_provider: P,
    signer: SignerFn,
    action: Finalize,
}

impl<P> FinalizeAction<P>
where
    P: Provider + Clone,
{
    pub fn new(l1_provider: P, signer: SignerFn, action: Finalize) -> Self {
        Self {
            l1_provider,
            signer,
            action,
        }
    }

    /// Get the withdrawal hash for this action.
    pub const fn withdrawal_hash(&self) -> WithdrawalHash {
        self.action.withdrawal_hash
    }

    pub const fn route(&self) -> &FinalizationRoute {
        &self.action.route
    }

    async fn check_is_finalized(&self) -> eyre::Result<bool> {
        let portal = IOptimismPortal::new(self.action.portal_address, &self.l1_provider);
        Ok(portal
            .finalizedWithdrawals(self.action.withdrawal_hash)
            .call()
            .await?)
    }

    async fn check_is_relayed(&self) -> eyre::Result<bool> {
        let FinalizationRoute::Replay(args) = &self.action.route else {
            return self.check_is_finalized().await;
        };

        let hash = hash_cross_domain_message_v1(
            args._nonce,
            args._sender,
            args._target,
            args._value,
            args._minGasLimit,
            args._message.clone(),
        )?;
        let messenger =
            ICrossDomainMessenger::new(self.action.l1_messenger_address, &self.l1_provider);
        Ok(messenger.successfulMessages(hash).call().await?)
    }
}

impl<P> Action for FinalizeAction<P>
where
    P: Provider + Clone,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        if self.check_is_relayed().await? {
            return Ok(false);
        }

        // not proven yet
        let Ok(remaining) = timing::time_to_finalize(
            &self.l1_provider,
            self.action.portal_address,
            self.action.oracle_address,
            self.action.withdrawal_hash,
        )
        .await
        else {
            return Ok(false);
        };

        Ok(remaining == 0)
    }

    async fn is_completed(&self) -> eyre::Result<bool> {
        self.check_is_relayed().await
    }

    async fn execute(&mut self) -> eyre::Result<crate::Result> {
        info!(
            withdrawal_hash = %self.action.withdrawal_hash,
            route = self.action.route.name(),
            "Finalizing withdrawal"
        );

        let tx_request = finalize_request(&self.action);
        let receipt = submit(&self.l1_provider, &self.signer, tx_request).await?;

        info!(
            tx_hash = %receipt.transaction_hash,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            withdrawal_hash = %self.action.withdrawal_hash,
            route = self.action.route.name(),
            "Withdrawal finalized on L1"
        );

        Ok(crate::Result::from_receipt(&receipt))
    }

    fn description(&self) -> String {
        match &self.action.route {
            FinalizationRoute::Direct(_) => {
                format!("Finalizing withdrawal {} on L1", self.action.withdrawal_hash)
            }
            FinalizationRoute::Replay(_) => format!(
                "Replaying failed relay of withdrawal {} on the L1 messenger",
                self.action.withdrawal_hash
            ),
        }
    }
}
