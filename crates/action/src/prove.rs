//! Prove withdrawal action.
//!
//! Submits a proof to L1 that a withdrawal was initiated on L2.

use crate::{submit, Action, SignerFn};
use alloy_primitives::Address;
use alloy_provider::Provider;
use binding::opstack::IOptimismPortal;
use tracing::info;
use withdrawal::{
    proof::{generate_proof, WithdrawalProof},
    state::WithdrawalStateProvider,
    InitiatedWithdrawal, WithdrawalHash,
};

/// Input data for proving a withdrawal on L1.
#[derive(Clone, Debug)]
pub struct Prove {
    /// OptimismPortal contract address on L1
    pub portal_address: Address,
    /// L2OutputOracle contract address on L1
    pub oracle_address: Address,
    /// L2ToL1MessagePasser address on L2
    pub message_passer_address: Address,
    /// The withdrawal, as located in its L2 receipt
    pub withdrawal: InitiatedWithdrawal,
    /// Address that will submit the proof transaction
    pub from: Address,
}

/// Action to prove a withdrawal on L1.
pub struct ProveAction<P1, P2> {
    l1_provider: P1,
    l2_provider: P2,
    signer: SignerFn,
    action: Prove,
    proof: Option<WithdrawalProof>,
}

impl<P1, P2> ProveAction<P1, P2>
where
    P1: Provider + Clone,
    P2: Provider + Clone,
{
    pub fn new(l1_provider: P1, l2_provider: P2, signer: SignerFn, action: Prove) -> Self {
        Self {
            l1_provider,
            l2_provider,
            signer,
            action,
            proof: None,
        }
    }

    /// Use an already generated proof instead of generating one on execute.
    pub fn with_proof(mut self, proof: WithdrawalProof) -> Self {
        self.proof = Some(proof);
        self
    }

    /// Get the withdrawal hash for this action.
    pub const fn withdrawal_hash(&self) -> WithdrawalHash {
        self.action.withdrawal.hash
    }

    /// The proof submitted (or about to be submitted) for this withdrawal.
    pub const fn proof(&self) -> Option<&WithdrawalProof> {
        self.proof.as_ref()
    }

    fn state(&self) -> WithdrawalStateProvider<P1, P2> {
        WithdrawalStateProvider::new(
            self.l1_provider.clone(),
            self.l2_provider.clone(),
            self.action.portal_address,
            self.action.oracle_address,
            self.action.message_passer_address,
        )
    }
}

impl<P1, P2> Action for ProveAction<P1, P2>
where
    P1: Provider + Clone,
    P2: Provider + Clone,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        let state = self.state();
        if state.is_proven(self.action.withdrawal.hash).await?.is_some() {
            return Ok(false);
        }
        state
            .is_output_published(self.action.withdrawal.l2_block)
            .await
    }

    async fn is_completed(&self) -> eyre::Result<bool> {
        let proven = self.state().is_proven(self.action.withdrawal.hash).await?;
        Ok(proven.is_some())
    }

    async fn execute(&mut self) -> eyre::Result<crate::Result> {
        let proof = match self.proof.take() {
            Some(proof) => proof,
            None => {
                info!(
                    withdrawal_hash = %self.action.withdrawal.hash,
                    l2_block = self.action.withdrawal.l2_block,
                    "Generating withdrawal proof"
                );
                generate_proof(
                    &self.l1_provider,
                    &self.l2_provider,
                    self.action.oracle_address,
                    self.action.message_passer_address,
                    self.action.withdrawal.hash,
                    self.action.withdrawal.l2_block,
                )
                .await?
            }
        };

        info!(
            output_index = %proof.l2_output_index,
            output_l2_block = proof.output_l2_block,
            proof_nodes = proof.withdrawal_proof.len(),
            "Submitting withdrawal proof to L1"
        );

        let portal = IOptimismPortal::new(self.action.portal_address, &self.l1_provider);
        let tx_request = portal
            .proveWithdrawalTransaction(
                self.action.withdrawal.request.to_transaction(),
                proof.l2_output_index,
                proof.output_root_proof.clone(),
                proof.withdrawal_proof.clone(),
            )
            .into_transaction_request()
            .from(self.action.from);

        // keep the proof around even if submission fails, for a retry
        self.proof = Some(proof);

        let receipt = submit(&self.l1_provider, &self.signer, tx_request).await?;

        info!(
            tx_hash = %receipt.transaction_hash,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            withdrawal_hash = %self.action.withdrawal.hash,
            "Withdrawal proven on L1"
        );

        Ok(crate::Result::from_receipt(&receipt))
    }

    fn description(&self) -> String {
        format!("Proving withdrawal {} on L1", self.action.withdrawal.hash)
    }
}
