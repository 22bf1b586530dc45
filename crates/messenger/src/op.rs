use crate::{
    message::{CrossChainMessage, LowLevelMessage, MessageDirection},
    MessengerAdapter,
};
use alloy_primitives::{Address, TxHash};
use alloy_provider::Provider;
use async_trait::async_trait;
use binding::opstack::ICrossDomainMessenger;
use config::{L1Contracts, L2Config};
use eyre::eyre;
use withdrawal::{
    proof::{generate_proof, WithdrawalProof},
    state::WithdrawalStateProvider,
    status::{derive_deposit_status, derive_withdrawal_status},
    timing, InitiatedWithdrawal, MessageStatus, WithdrawalHash,
};

/// Messenger adapter over the output-oracle bridge contracts.
pub struct OpMessenger<P1, P2> {
    l1_provider: P1,
    l2_provider: P2,
    contracts: L1Contracts,
    l2_messenger: Address,
    message_passer: Address,
    state: WithdrawalStateProvider<P1, P2>,
}

impl<P1, P2> OpMessenger<P1, P2>
where
    P1: Provider + Clone,
    P2: Provider + Clone,
{
    pub fn new(l1_provider: P1, l2_provider: P2, contracts: L1Contracts, l2: &L2Config) -> Self {
        let state = WithdrawalStateProvider::new(
            l1_provider.clone(),
            l2_provider.clone(),
            contracts.portal,
            contracts.l2_output_oracle,
            l2.message_passer,
        )
        .with_l1_messenger(contracts.l1_cross_domain_messenger);

        Self {
            l1_provider,
            l2_provider,
            contracts,
            l2_messenger: l2.cross_domain_messenger,
            message_passer: l2.message_passer,
            state,
        }
    }

    pub const fn contracts(&self) -> &L1Contracts {
        &self.contracts
    }

    pub const fn state(&self) -> &WithdrawalStateProvider<P1, P2> {
        &self.state
    }

    /// `(successful, failed)` relay records on the receiving messenger.
    async fn relay_record(
        &self,
        message: &CrossChainMessage,
    ) -> eyre::Result<(bool, bool)> {
        let hash = message.hash()?;
        match message.direction {
            MessageDirection::L2ToL1 => {
                let messenger = ICrossDomainMessenger::new(
                    self.contracts.l1_cross_domain_messenger,
                    &self.l1_provider,
                );
                let succeeded = messenger.successfulMessages(hash).call().await?;
                let failed = messenger.failedMessages(hash).call().await?;
                Ok((succeeded, failed))
            }
            MessageDirection::L1ToL2 => {
                let messenger = ICrossDomainMessenger::new(self.l2_messenger, &self.l2_provider);
                let succeeded = messenger.successfulMessages(hash).call().await?;
                let failed = messenger.failedMessages(hash).call().await?;
                Ok((succeeded, failed))
            }
        }
    }
}

#[async_trait]
impl<P1, P2> MessengerAdapter for OpMessenger<P1, P2>
where
    P1: Provider + Clone + 'static,
    P2: Provider + Clone + 'static,
{
    async fn to_cross_chain_message(
        &self,
        tx_hash: TxHash,
        index: usize,
    ) -> eyre::Result<Option<CrossChainMessage>> {
        let (messages, layer) =
            if let Some(receipt) = self.l2_provider.get_transaction_receipt(tx_hash).await? {
                let messages = CrossChainMessage::all_from_receipt(
                    &receipt,
                    self.l2_messenger,
                    MessageDirection::L2ToL1,
                );
                (messages, "L2")
            } else if let Some(receipt) = self.l1_provider.get_transaction_receipt(tx_hash).await?
            {
                let messages = CrossChainMessage::all_from_receipt(
                    &receipt,
                    self.contracts.l1_cross_domain_messenger,
                    MessageDirection::L1ToL2,
                );
                (messages, "L1")
            } else {
                eyre::bail!("Transaction {} not found on L1 or L2", tx_hash);
            };

        if messages.is_empty() {
            return Ok(None);
        }

        let count = messages.len();
        messages.into_iter().nth(index).map(Some).ok_or_else(|| {
            eyre!(
                "Message index {} out of range: {} transaction {} sent {} messages",
                index,
                layer,
                tx_hash,
                count
            )
        })
    }

    async fn to_low_level_message(
        &self,
        tx_hash: TxHash,
        index: usize,
    ) -> eyre::Result<LowLevelMessage> {
        let receipt = self
            .l2_provider
            .get_transaction_receipt(tx_hash)
            .await?
            .ok_or_else(|| eyre!("L2 transaction {} not found", tx_hash))?;

        InitiatedWithdrawal::from_receipt(&receipt, index)
    }

    async fn is_failed_relay(&self, message: &CrossChainMessage) -> eyre::Result<bool> {
        let (_, failed) = self.relay_record(message).await?;
        Ok(failed)
    }

    async fn is_successful_relay(&self, message: &CrossChainMessage) -> eyre::Result<bool> {
        let (succeeded, _) = self.relay_record(message).await?;
        Ok(succeeded)
    }

    async fn message_status(&self, tx_hash: TxHash, index: usize) -> eyre::Result<MessageStatus> {
        let message = self.to_cross_chain_message(tx_hash, index).await?;

        if let Some(message) = message.as_ref() {
            if message.direction == MessageDirection::L1ToL2 {
                let (succeeded, failed) = self.relay_record(message).await?;
                return Ok(derive_deposit_status(succeeded, failed));
            }
        }

        let low_level = self.to_low_level_message(tx_hash, index).await?;
        let mut facts = self
            .state
            .collect_facts(low_level.hash, low_level.l2_block)
            .await?;

        if let Some(message) = message.as_ref() {
            let (succeeded, failed) = self.relay_record(message).await?;
            facts.relay_succeeded = succeeded;
            facts.relay_failed = failed;
        }

        Ok(derive_withdrawal_status(&facts))
    }

    async fn message_proof(&self, message: &LowLevelMessage) -> eyre::Result<WithdrawalProof> {
        generate_proof(
            &self.l1_provider,
            &self.l2_provider,
            self.contracts.l2_output_oracle,
            self.message_passer,
            message.hash,
            message.l2_block,
        )
        .await
    }

    async fn time_to_prove(&self, l2_block: u64) -> eyre::Result<u64> {
        timing::time_to_prove(&self.l1_provider, self.contracts.l2_output_oracle, l2_block).await
    }

    async fn time_to_finalize(&self, withdrawal_hash: WithdrawalHash) -> eyre::Result<u64> {
        timing::time_to_finalize(
            &self.l1_provider,
            self.contracts.portal,
            self.contracts.l2_output_oracle,
            withdrawal_hash,
        )
        .await
    }
}
