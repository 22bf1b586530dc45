//! Selection of the L1 call that completes a withdrawal.

use crate::{
    error::RouteError,
    message::{LowLevelMessage, MessageDirection},
    MessengerAdapter,
};
use alloy_primitives::TxHash;
use alloy_sol_types::SolCall;
use binding::opstack::{ICrossDomainMessenger::relayMessageCall, WithdrawalTransaction};
use tracing::debug;

/// How a proven withdrawal is completed on L1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizationRoute {
    /// `finalizeWithdrawalTransaction` on the portal with the 6-field tuple
    Direct(WithdrawalTransaction),
    /// `relayMessage` on the L1 messenger, re-delivering a message whose first
    /// relay failed
    Replay(relayMessageCall),
}

impl FinalizationRoute {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Direct(_) => "direct",
            Self::Replay(_) => "replay",
        }
    }

    /// Route for a low-level message, given whether its relay failed before.
    ///
    /// A replay re-sends the exact `relayMessage` calldata the portal handed
    /// to the messenger, which is the withdrawal's data field.
    pub fn for_message(
        low_level: &LowLevelMessage,
        previously_failed: bool,
    ) -> Result<Self, RouteError> {
        if previously_failed {
            let args = relayMessageCall::abi_decode(&low_level.request.message_data)?;
            Ok(Self::Replay(args))
        } else {
            Ok(Self::Direct(low_level.request.to_transaction()))
        }
    }
}

/// Resolve the finalization route for the `index`-th withdrawal of `tx_hash`.
///
/// The failed-relay check and the low-level lookup run concurrently; when
/// both fail, every reason is reported.
pub async fn resolve_route<A>(
    adapter: &A,
    tx_hash: TxHash,
    index: usize,
) -> Result<FinalizationRoute, RouteError>
where
    A: MessengerAdapter + ?Sized,
{
    let message = adapter
        .to_cross_chain_message(tx_hash, index)
        .await
        .map_err(RouteError::Lookup)?;

    let Some(message) = message else {
        // plain message-passer withdrawal, nothing to replay
        let low_level = adapter
            .to_low_level_message(tx_hash, index)
            .await
            .map_err(RouteError::Lookup)?;
        return FinalizationRoute::for_message(&low_level, false);
    };

    if message.direction != MessageDirection::L2ToL1 {
        return Err(RouteError::WrongDirection(message.direction));
    }

    let (failed, low_level) = tokio::join!(
        adapter.is_failed_relay(&message),
        adapter.to_low_level_message(tx_hash, index)
    );

    let (failed, low_level) = match (failed, low_level) {
        (Ok(failed), Ok(low_level)) => (failed, low_level),
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => return Err(RouteError::Lookup(e)),
        (Err(failed), Err(low_level)) => {
            return Err(RouteError::Aggregate(vec![failed, low_level]))
        }
    };

    let route = FinalizationRoute::for_message(&low_level, failed)?;
    debug!(
        tx_hash = %tx_hash,
        withdrawal_hash = %low_level.hash,
        route = route.name(),
        "Resolved finalization route"
    );
    Ok(route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::CrossChainMessage;
    use alloy_primitives::{address, Address, Bytes, B256, U256};
    use async_trait::async_trait;
    use withdrawal::{
        hash::encode_cross_domain_message_v1, proof::WithdrawalProof, InitiatedWithdrawal,
        MessageStatus, WithdrawalHash, WithdrawalRequest,
    };

    const L1_MESSENGER: Address = address!("1111111111111111111111111111111111111111");

    /// Adapter answering from fixed values; `None` answers fail the lookup.
    struct MockAdapter {
        message: Option<CrossChainMessage>,
        failed: Option<bool>,
        low_level: Option<LowLevelMessage>,
    }

    #[async_trait]
    impl MessengerAdapter for MockAdapter {
        async fn to_cross_chain_message(
            &self,
            _tx_hash: TxHash,
            _index: usize,
        ) -> eyre::Result<Option<CrossChainMessage>> {
            Ok(self.message.clone())
        }

        async fn to_low_level_message(
            &self,
            _tx_hash: TxHash,
            _index: usize,
        ) -> eyre::Result<LowLevelMessage> {
            self.low_level
                .clone()
                .ok_or_else(|| eyre::eyre!("receipt not found"))
        }

        async fn is_failed_relay(&self, _message: &CrossChainMessage) -> eyre::Result<bool> {
            self.failed.ok_or_else(|| eyre::eyre!("failedMessages call reverted"))
        }

        async fn is_successful_relay(&self, _message: &CrossChainMessage) -> eyre::Result<bool> {
            Ok(false)
        }

        async fn message_status(
            &self,
            _tx_hash: TxHash,
            _index: usize,
        ) -> eyre::Result<MessageStatus> {
            Ok(MessageStatus::ReadyForRelay)
        }

        async fn message_proof(&self, _message: &LowLevelMessage) -> eyre::Result<WithdrawalProof> {
            eyre::bail!("not used")
        }

        async fn time_to_prove(&self, _l2_block: u64) -> eyre::Result<u64> {
            Ok(0)
        }

        async fn time_to_finalize(&self, _hash: WithdrawalHash) -> eyre::Result<u64> {
            Ok(0)
        }
    }

    fn cross_chain_message(direction: MessageDirection) -> CrossChainMessage {
        CrossChainMessage {
            direction,
            sender: Address::repeat_byte(0xaa),
            target: Address::repeat_byte(0xbb),
            message: Bytes::from(vec![0xca, 0xfe]),
            message_nonce: U256::from(1) << 240 | U256::from(3),
            min_gas_limit: U256::from(200_000),
            value: U256::from(1_000),
        }
    }

    /// The withdrawal the L2 messenger passes down for `message`.
    fn low_level_for(message: &CrossChainMessage) -> LowLevelMessage {
        let request = WithdrawalRequest {
            message_nonce: U256::from(1) << 240 | U256::from(9),
            sender: Address::repeat_byte(0x07),
            target: L1_MESSENGER,
            value: message.value,
            min_gas_limit: U256::from(287_000),
            message_data: encode_cross_domain_message_v1(
                message.message_nonce,
                message.sender,
                message.target,
                message.value,
                message.min_gas_limit,
                message.message.clone(),
            ),
        };
        InitiatedWithdrawal {
            hash: request.hash(),
            request,
            l2_block: 42,
            tx_hash: B256::repeat_byte(0x01),
        }
    }

    #[tokio::test]
    async fn test_never_attempted_routes_direct() {
        let message = cross_chain_message(MessageDirection::L2ToL1);
        let low_level = low_level_for(&message);
        let adapter = MockAdapter {
            message: Some(message),
            failed: Some(false),
            low_level: Some(low_level.clone()),
        };

        let route = resolve_route(&adapter, B256::ZERO, 0).await.unwrap();
        assert_eq!(route, FinalizationRoute::Direct(low_level.request.to_transaction()));
        assert_eq!(route.name(), "direct");
    }

    #[tokio::test]
    async fn test_previously_failed_routes_replay_with_original_args() {
        let message = cross_chain_message(MessageDirection::L2ToL1);
        let adapter = MockAdapter {
            message: Some(message.clone()),
            failed: Some(true),
            low_level: Some(low_level_for(&message)),
        };

        let route = resolve_route(&adapter, B256::ZERO, 0).await.unwrap();
        let FinalizationRoute::Replay(args) = route else {
            panic!("expected replay route, got {route:?}");
        };
        assert_eq!(args._nonce, message.message_nonce);
        assert_eq!(args._sender, message.sender);
        assert_eq!(args._target, message.target);
        assert_eq!(args._value, message.value);
        assert_eq!(args._minGasLimit, message.min_gas_limit);
        assert_eq!(args._message, message.message);
    }

    #[tokio::test]
    async fn test_plain_withdrawal_routes_direct() {
        let low_level = low_level_for(&cross_chain_message(MessageDirection::L2ToL1));
        let adapter = MockAdapter {
            message: None,
            // never consulted without a cross-chain message
            failed: None,
            low_level: Some(low_level.clone()),
        };

        let route = resolve_route(&adapter, B256::ZERO, 0).await.unwrap();
        assert_eq!(route, FinalizationRoute::Direct(low_level.request.to_transaction()));
    }

    #[tokio::test]
    async fn test_deposit_is_rejected() {
        let adapter = MockAdapter {
            message: Some(cross_chain_message(MessageDirection::L1ToL2)),
            failed: Some(false),
            low_level: None,
        };

        let err = resolve_route(&adapter, B256::ZERO, 0).await.unwrap_err();
        assert!(matches!(
            err,
            RouteError::WrongDirection(MessageDirection::L1ToL2)
        ));
    }

    #[tokio::test]
    async fn test_single_lookup_failure_surfaces_alone() {
        let message = cross_chain_message(MessageDirection::L2ToL1);
        let adapter = MockAdapter {
            message: Some(message),
            failed: Some(false),
            low_level: None,
        };

        let err = resolve_route(&adapter, B256::ZERO, 0).await.unwrap_err();
        assert!(matches!(err, RouteError::Lookup(_)));
        assert_eq!(err.reasons(), vec!["receipt not found".to_string()]);
    }

    #[tokio::test]
    async fn test_both_lookup_failures_are_aggregated() {
        let adapter = MockAdapter {
            message: Some(cross_chain_message(MessageDirection::L2ToL1)),
            failed: None,
            low_level: None,
        };

        let err = resolve_route(&adapter, B256::ZERO, 0).await.unwrap_err();
        assert!(matches!(err, RouteError::Aggregate(_)));
        assert_eq!(
            err.reasons(),
            vec![
                "failedMessages call reverted".to_string(),
                "receipt not found".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_replay_of_undecodable_data_fails() {
        let message = cross_chain_message(MessageDirection::L2ToL1);
        let mut low_level = low_level_for(&message);
        low_level.request.message_data = Bytes::from(vec![0x00, 0x01]);
        let adapter = MockAdapter {
            message: Some(message),
            failed: Some(true),
            low_level: Some(low_level),
        };

        let err = resolve_route(&adapter, B256::ZERO, 0).await.unwrap_err();
        assert!(matches!(err, RouteError::Decode(_)));
    }
}
