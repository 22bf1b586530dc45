use crate::{
    hash::hash_cross_domain_message_v1,
    status::{derive_withdrawal_status, MessageStatus, WithdrawalFacts},
    timing::{finalization_period, is_block_covered, latest_l1_timestamp},
    types::{InitiatedWithdrawal, WithdrawalHash, WithdrawalRequest},
};
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::BlockNumberOrTag;
use alloy_sol_types::SolCall;
use binding::opstack::{
    ICrossDomainMessenger::{self, relayMessageCall},
    IL2OutputOracle, IL2ToL1MessagePasser, IOptimismPortal,
};
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{debug, error, warn};

/// Portal record of a proven withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvenWithdrawal {
    pub output_root: B256,
    pub timestamp: u64,
    pub l2_output_index: U256,
}

#[derive(Debug, Clone)]
pub struct PendingWithdrawal {
    pub withdrawal: InitiatedWithdrawal,
    pub status: MessageStatus,
}

/// Hash of the cross-domain message a withdrawal carries, if it was sent
/// through the L2 messenger.
///
/// Such withdrawals target the L1 messenger with `relayMessage` calldata.
pub fn messenger_message_hash(
    target: Address,
    data: &Bytes,
    l1_messenger: Address,
) -> Option<B256> {
    if target != l1_messenger || !data.starts_with(relayMessageCall::SELECTOR.as_slice()) {
        return None;
    }

    let call = relayMessageCall::abi_decode(data).ok()?;
    hash_cross_domain_message_v1(
        call._nonce,
        call._sender,
        call._target,
        call._value,
        call._minGasLimit,
        call._message,
    )
    .ok()
}

/// Reads withdrawal state from the portal, the oracle and the message passer.
///
/// With an L1 messenger configured, the pending scan also reads the
/// messenger's relay records, so a withdrawal finalized on the portal whose
/// relay failed shows up as replayable instead of relayed.
pub struct WithdrawalStateProvider<P1, P2> {
    l1_provider: P1,
    l2_provider: P2,
    portal_address: Address,
    oracle_address: Address,
    message_passer_address: Address,
    l1_messenger_address: Option<Address>,
}

impl<P1, P2> WithdrawalStateProvider<P1, P2>
where
    P1: Provider + Clone,
    P2: Provider + Clone,
{
    pub const fn new(
        l1_provider: P1,
        l2_provider: P2,
        portal_address: Address,
        oracle_address: Address,
        message_passer_address: Address,
    ) -> Self {
        Self {
            l1_provider,
            l2_provider,
            portal_address,
            oracle_address,
            message_passer_address,
            l1_messenger_address: None,
        }
    }

    pub const fn with_l1_messenger(mut self, l1_messenger: Address) -> Self {
        self.l1_messenger_address = Some(l1_messenger);
        self
    }

    /// `(successful, failed)` records of a message on the L1 messenger.
    pub async fn relay_record(&self, message_hash: B256) -> eyre::Result<(bool, bool)> {
        let Some(l1_messenger) = self.l1_messenger_address else {
            return Ok((false, false));
        };
        let messenger = ICrossDomainMessenger::new(l1_messenger, &self.l1_provider);
        let succeeded = messenger.successfulMessages(message_hash).call().await?;
        let failed = messenger.failedMessages(message_hash).call().await?;
        Ok((succeeded, failed))
    }

    /// Portal and oracle facts for a withdrawal included in `l2_block`.
    pub async fn collect_facts(
        &self,
        hash: WithdrawalHash,
        l2_block: u64,
    ) -> eyre::Result<WithdrawalFacts> {
        let finalized = self.is_finalized(hash).await?;
        let proven = self.is_proven(hash).await?;
        let output_published = self.is_output_published(l2_block).await?;
        let finalization_period = finalization_period(&self.l1_provider, self.oracle_address).await?;
        let now = latest_l1_timestamp(&self.l1_provider).await?;

        Ok(WithdrawalFacts {
            finalized,
            output_published,
            proven_at: proven.map(|p| p.timestamp),
            finalization_period,
            now,
            ..Default::default()
        })
    }

    pub async fn query_withdrawal_status(
        &self,
        hash: WithdrawalHash,
        l2_block: u64,
    ) -> eyre::Result<MessageStatus> {
        let facts = self.collect_facts(hash, l2_block).await?;
        Ok(derive_withdrawal_status(&facts))
    }

    /// Get all unfinalized withdrawals from L2 events in the given block range.
    ///
    /// Both endpoints are resolved to concrete numbers before scanning so that
    /// the whole scan runs against one snapshot. Ranges are split into chunks
    /// and each chunk is retried with exponential backoff.
    pub async fn get_pending_withdrawals(
        &self,
        from_block: BlockNumberOrTag,
        to_block: BlockNumberOrTag,
        sender: Option<Address>,
    ) -> eyre::Result<Vec<PendingWithdrawal>> {
        let from_block_num = self.resolve_block_number(from_block).await?;
        let to_block_num = self.resolve_block_number(to_block).await?;

        if from_block_num > to_block_num {
            return Err(eyre::eyre!(
                "from_block ({}) must be <= to_block ({})",
                from_block_num,
                to_block_num
            ));
        }

        debug!(
            from = from_block_num,
            to = to_block_num,
            "Scanning for withdrawals (snapshot taken)"
        );

        self.scan_chunks(from_block_num, to_block_num, sender).await
    }

    async fn resolve_block_number(&self, block: BlockNumberOrTag) -> eyre::Result<u64> {
        match block {
            BlockNumberOrTag::Number(n) => Ok(n),
            BlockNumberOrTag::Earliest => Ok(0),
            BlockNumberOrTag::Latest => Ok(self.l2_provider.get_block_number().await?),
            _ => Err(eyre::eyre!("Unsupported block tag: {:?}", block)),
        }
    }

    async fn scan_chunks(
        &self,
        from_block: u64,
        to_block: u64,
        sender: Option<Address>,
    ) -> eyre::Result<Vec<PendingWithdrawal>> {
        const CHUNK_SIZE: u64 = 9_500;

        let mut all_withdrawals = Vec::new();
        let mut current = from_block;

        while current <= to_block {
            let chunk_end = (current + CHUNK_SIZE - 1).min(to_block);

            debug!(from = current, to = chunk_end, "Scanning chunk for withdrawals");

            let chunk_withdrawals = self
                .scan_chunk_with_retry(current, chunk_end, sender)
                .await?;

            all_withdrawals.extend(chunk_withdrawals);
            current = chunk_end + 1;
        }

        Ok(all_withdrawals)
    }

    async fn scan_chunk_with_retry(
        &self,
        from_block: u64,
        to_block: u64,
        sender: Option<Address>,
    ) -> eyre::Result<Vec<PendingWithdrawal>> {
        // 100ms, 200ms, 400ms, 800ms, 1.6s
        let retry_strategy = ExponentialBackoff::from_millis(100).take(5);

        Retry::spawn(retry_strategy, || async {
            self.scan_chunk(from_block, to_block, sender)
                .await
                .map_err(|e| {
                    warn!(
                        from = from_block,
                        to = to_block,
                        error = %e,
                        "Chunk scan failed, will retry"
                    );
                    e
                })
        })
        .await
    }

    async fn scan_chunk(
        &self,
        from_block: u64,
        to_block: u64,
        sender: Option<Address>,
    ) -> eyre::Result<Vec<PendingWithdrawal>> {
        let contract = IL2ToL1MessagePasser::new(self.message_passer_address, &self.l2_provider);

        let events = contract
            .MessagePassed_filter()
            .from_block(from_block)
            .to_block(to_block)
            .query()
            .await?;

        let mut withdrawals = vec![];
        for (event, log) in events {
            if sender.is_some_and(|s| s != event.sender) {
                continue;
            }

            let request = WithdrawalRequest {
                message_nonce: event.nonce,
                sender: event.sender,
                target: event.target,
                value: event.value,
                min_gas_limit: event.gasLimit,
                message_data: event.data,
            };

            let computed_hash = request.hash();
            if computed_hash != event.withdrawalHash {
                error!(
                    block = ?log.block_number,
                    computed_hash = %computed_hash,
                    withdrawal_hash = %event.withdrawalHash,
                    "Withdrawal hash mismatch, skipping"
                );
                continue;
            }

            let l2_block = log.block_number.unwrap_or_default();
            let mut facts = self.collect_facts(event.withdrawalHash, l2_block).await?;
            if let Some(message_hash) = self.l1_messenger_address.and_then(|messenger| {
                messenger_message_hash(request.target, &request.message_data, messenger)
            }) {
                let (succeeded, failed) = self.relay_record(message_hash).await?;
                facts.relay_succeeded = succeeded;
                facts.relay_failed = failed;
            }
            let status = derive_withdrawal_status(&facts);

            if status == MessageStatus::Relayed {
                continue;
            }

            withdrawals.push(PendingWithdrawal {
                withdrawal: InitiatedWithdrawal {
                    request,
                    hash: event.withdrawalHash,
                    l2_block,
                    tx_hash: log.transaction_hash.unwrap_or_default(),
                },
                status,
            });
        }

        Ok(withdrawals)
    }

    pub async fn is_finalized(&self, hash: WithdrawalHash) -> eyre::Result<bool> {
        let portal = IOptimismPortal::new(self.portal_address, &self.l1_provider);
        let finalized = portal.finalizedWithdrawals(hash).call().await?;
        Ok(finalized)
    }

    pub async fn is_proven(&self, hash: WithdrawalHash) -> eyre::Result<Option<ProvenWithdrawal>> {
        let portal = IOptimismPortal::new(self.portal_address, &self.l1_provider);
        let proven = portal.provenWithdrawals(hash).call().await?;

        if proven.timestamp == 0 {
            return Ok(None);
        }

        Ok(Some(ProvenWithdrawal {
            output_root: proven.outputRoot,
            timestamp: u64::try_from(proven.timestamp).unwrap_or(u64::MAX),
            l2_output_index: U256::from(proven.l2OutputIndex),
        }))
    }

    /// True once the oracle holds an output at or after `l2_block`.
    pub async fn is_output_published(&self, l2_block: u64) -> eyre::Result<bool> {
        let oracle = IL2OutputOracle::new(self.oracle_address, &self.l1_provider);
        let next_index = oracle.nextOutputIndex().call().await?;
        let latest = oracle.latestBlockNumber().call().await?;
        Ok(is_block_covered(next_index, latest, l2_block))
    }

    /// Confirm the withdrawal was recorded by the message passer on L2.
    pub async fn is_sent(&self, hash: WithdrawalHash) -> eyre::Result<bool> {
        let passer = IL2ToL1MessagePasser::new(self.message_passer_address, &self.l2_provider);
        Ok(passer.sentMessages(hash).call().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::encode_cross_domain_message_v1;
    use alloy_primitives::address;

    const L1_MESSENGER: Address = address!("959922bE3CAee4b8Cd9a407cc3ac1C251C2007B1");

    fn relay_payload() -> (U256, Bytes) {
        let nonce = U256::from(1) << 240 | U256::from(3);
        let data = encode_cross_domain_message_v1(
            nonce,
            Address::repeat_byte(0x11),
            Address::repeat_byte(0x22),
            U256::from(1_000),
            U256::from(200_000),
            Bytes::from(vec![0xca, 0xfe]),
        );
        (nonce, data)
    }

    #[test]
    fn test_messenger_withdrawal_yields_message_hash() {
        let (nonce, data) = relay_payload();
        let expected = hash_cross_domain_message_v1(
            nonce,
            Address::repeat_byte(0x11),
            Address::repeat_byte(0x22),
            U256::from(1_000),
            U256::from(200_000),
            Bytes::from(vec![0xca, 0xfe]),
        )
        .unwrap();

        assert_eq!(
            messenger_message_hash(L1_MESSENGER, &data, L1_MESSENGER),
            Some(expected)
        );
    }

    #[test]
    fn test_plain_withdrawal_has_no_message_hash() {
        let (_, data) = relay_payload();
        // same payload, but sent straight to an EOA
        assert_eq!(
            messenger_message_hash(Address::repeat_byte(0x33), &data, L1_MESSENGER),
            None
        );
        assert_eq!(
            messenger_message_hash(L1_MESSENGER, &Bytes::new(), L1_MESSENGER),
            None
        );
        assert_eq!(
            messenger_message_hash(L1_MESSENGER, &Bytes::from(vec![0xde, 0xad]), L1_MESSENGER),
            None
        );
    }

    #[test]
    fn test_finalized_withdrawal_with_failed_relay_stays_pending() {
        // what the scan sees for a portal-finalized withdrawal whose relay reverted
        let facts = WithdrawalFacts {
            finalized: true,
            relay_failed: true,
            output_published: true,
            proven_at: Some(100),
            finalization_period: 12,
            now: 1_000,
            ..Default::default()
        };
        assert_eq!(derive_withdrawal_status(&facts), MessageStatus::ReadyForRelay);

        let relayed = WithdrawalFacts {
            relay_failed: false,
            relay_succeeded: true,
            ..facts
        };
        assert_eq!(derive_withdrawal_status(&relayed), MessageStatus::Relayed);
    }
}
