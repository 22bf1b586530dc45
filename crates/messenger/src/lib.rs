//! Cross-domain messenger adapter.
//!
//! Wraps the L1 and L2 contract handles behind one interface so the lifecycle
//! orchestrator can ask about a message by the transaction that sent it.

pub mod error;
pub mod message;
pub mod op;
pub mod route;

pub use error::RouteError;
pub use message::{CrossChainMessage, LowLevelMessage, MessageDirection};
pub use op::OpMessenger;
pub use route::{resolve_route, FinalizationRoute};

use alloy_primitives::TxHash;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use withdrawal::{proof::WithdrawalProof, MessageStatus, WithdrawalHash};

// async_trait keeps the trait usable as `dyn MessengerAdapter`
#[async_trait]
pub trait MessengerAdapter: Send + Sync {
    /// The cross-domain message sent by the `index`-th messenger call of a
    /// transaction, or `None` if the transaction withdrew through the message
    /// passer directly.
    async fn to_cross_chain_message(
        &self,
        tx_hash: TxHash,
        index: usize,
    ) -> eyre::Result<Option<CrossChainMessage>>;

    /// The `index`-th `MessagePassed` withdrawal of an L2 transaction.
    async fn to_low_level_message(
        &self,
        tx_hash: TxHash,
        index: usize,
    ) -> eyre::Result<LowLevelMessage>;

    /// Whether the receiving messenger recorded a failed relay.
    async fn is_failed_relay(&self, message: &CrossChainMessage) -> eyre::Result<bool>;

    /// Whether the receiving messenger recorded a successful relay.
    async fn is_successful_relay(&self, message: &CrossChainMessage) -> eyre::Result<bool>;

    async fn message_status(&self, tx_hash: TxHash, index: usize) -> eyre::Result<MessageStatus>;

    async fn message_proof(&self, message: &LowLevelMessage) -> eyre::Result<WithdrawalProof>;

    /// Estimated seconds until a withdrawal in `l2_block` is provable.
    async fn time_to_prove(&self, l2_block: u64) -> eyre::Result<u64>;

    /// Seconds left in the challenge period of a proven withdrawal.
    async fn time_to_finalize(&self, withdrawal_hash: WithdrawalHash) -> eyre::Result<u64>;

    /// Poll until the message has reached `target` in lifecycle order.
    async fn wait_for_message_status(
        &self,
        tx_hash: TxHash,
        index: usize,
        target: MessageStatus,
        poll_interval: Duration,
    ) -> eyre::Result<MessageStatus> {
        loop {
            let status = self.message_status(tx_hash, index).await?;
            if status.has_reached(target) {
                return Ok(status);
            }

            debug!(
                tx_hash = %tx_hash,
                status = %status,
                target = %target,
                "Waiting for message status"
            );
            tokio::time::sleep(poll_interval).await;
        }
    }
}
