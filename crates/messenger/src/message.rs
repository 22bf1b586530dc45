use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rpc_types_eth::{Log, TransactionReceipt};
use alloy_sol_types::SolEvent;
use binding::opstack::ICrossDomainMessenger::{SentMessage, SentMessageExtension1};
use std::fmt;
use withdrawal::{hash::hash_cross_domain_message_v1, InitiatedWithdrawal};

/// The `MessagePassed` record underneath a withdrawal.
pub type LowLevelMessage = InitiatedWithdrawal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageDirection {
    L1ToL2,
    L2ToL1,
}

impl fmt::Display for MessageDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::L1ToL2 => f.write_str("L1→L2"),
            Self::L2ToL1 => f.write_str("L2→L1"),
        }
    }
}

/// A message sent through a cross-domain messenger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossChainMessage {
    pub direction: MessageDirection,
    pub sender: Address,
    pub target: Address,
    pub message: Bytes,
    pub message_nonce: U256,
    pub min_gas_limit: U256,
    pub value: U256,
}

impl CrossChainMessage {
    /// Key of the receiving messenger's relay records.
    pub fn hash(&self) -> eyre::Result<B256> {
        hash_cross_domain_message_v1(
            self.message_nonce,
            self.sender,
            self.target,
            self.value,
            self.min_gas_limit,
            self.message.clone(),
        )
    }

    /// Collect the messages `messenger` emitted in a receipt, in log order.
    pub fn all_from_receipt(
        receipt: &TransactionReceipt,
        messenger: Address,
        direction: MessageDirection,
    ) -> Vec<Self> {
        Self::all_from_logs(receipt.logs(), messenger, direction)
    }

    /// `SentMessageExtension1` follows its `SentMessage` and carries the value.
    pub fn all_from_logs(logs: &[Log], messenger: Address, direction: MessageDirection) -> Vec<Self> {
        let mut messages: Vec<Self> = Vec::new();

        for log in logs {
            if log.address() != messenger {
                continue;
            }

            if let Ok(sent) = SentMessage::decode_log(&log.inner) {
                messages.push(Self {
                    direction,
                    sender: sent.sender,
                    target: sent.target,
                    message: sent.message.clone(),
                    message_nonce: sent.messageNonce,
                    min_gas_limit: sent.gasLimit,
                    value: U256::ZERO,
                });
            } else if let Ok(extension) = SentMessageExtension1::decode_log(&log.inner) {
                if let Some(last) = messages.last_mut() {
                    last.value = extension.value;
                }
            }
        }

        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Log as PrimitiveLog;

    fn sent_message_log(messenger: Address, nonce: U256) -> Log {
        let event = SentMessage {
            target: Address::repeat_byte(0xbb),
            sender: Address::repeat_byte(0xaa),
            message: Bytes::from(vec![1, 2, 3]),
            messageNonce: nonce,
            gasLimit: U256::from(200_000),
        };
        Log {
            inner: PrimitiveLog {
                address: messenger,
                data: event.encode_log_data(),
            },
            ..Default::default()
        }
    }

    fn extension_log(messenger: Address, value: u64) -> Log {
        let event = SentMessageExtension1 {
            sender: Address::repeat_byte(0xaa),
            value: U256::from(value),
        };
        Log {
            inner: PrimitiveLog {
                address: messenger,
                data: event.encode_log_data(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_messages_pick_up_extension_value() {
        let messenger = Address::repeat_byte(0x07);
        let nonce = U256::from(1) << 240;
        let logs = vec![
            sent_message_log(messenger, nonce),
            extension_log(messenger, 1_000),
            // a foreign emitter with the same ABI is ignored
            sent_message_log(Address::repeat_byte(0x99), nonce + U256::from(1)),
        ];

        let messages = CrossChainMessage::all_from_logs(&logs, messenger, MessageDirection::L2ToL1);

        assert_eq!(messages.len(), 1);
        let message = &messages[0];
        assert_eq!(message.direction, MessageDirection::L2ToL1);
        assert_eq!(message.sender, Address::repeat_byte(0xaa));
        assert_eq!(message.target, Address::repeat_byte(0xbb));
        assert_eq!(message.value, U256::from(1_000));
        assert_eq!(message.message_nonce, nonce);
        assert!(message.hash().is_ok());
    }

    #[test]
    fn test_extension_without_message_is_ignored() {
        let messenger = Address::repeat_byte(0x07);
        let logs = vec![extension_log(messenger, 5)];
        let messages = CrossChainMessage::all_from_logs(&logs, messenger, MessageDirection::L1ToL2);
        assert!(messages.is_empty());
    }

    #[test]
    fn test_each_extension_binds_to_preceding_message() {
        let messenger = Address::repeat_byte(0x07);
        let nonce = U256::from(1) << 240;
        let logs = vec![
            sent_message_log(messenger, nonce),
            sent_message_log(messenger, nonce + U256::from(1)),
            extension_log(messenger, 42),
        ];

        let messages = CrossChainMessage::all_from_logs(&logs, messenger, MessageDirection::L1ToL2);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].value, U256::ZERO);
        assert_eq!(messages[1].value, U256::from(42));
    }
}
