use crate::hash::{compute_withdrawal_hash, nonce_version};
use alloy_primitives::{Address, Bytes, TxHash, B256, U256};
use alloy_rpc_types_eth::TransactionReceipt;
use alloy_sol_types::SolEvent;
use binding::{
    fast_withdraw::WithdrawalTx,
    opstack::{IL2ToL1MessagePasser, WithdrawalTransaction},
};

pub type WithdrawalHash = B256;

/// An in-flight L2→L1 message as recorded by the message passer.
///
/// Immutable once created on L2. Proving and finalizing only ever reference it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WithdrawalRequest {
    /// Versioned nonce (version in the top two bytes)
    pub message_nonce: U256,
    pub sender: Address,
    pub target: Address,
    pub value: U256,
    pub min_gas_limit: U256,
    pub message_data: Bytes,
}

impl WithdrawalRequest {
    /// Hash committed to by the message passer and keyed on by the portal.
    pub fn hash(&self) -> WithdrawalHash {
        compute_withdrawal_hash(&self.to_transaction())
    }

    /// The 6-field tuple expected by `proveWithdrawalTransaction` and
    /// `finalizeWithdrawalTransaction`.
    pub fn to_transaction(&self) -> WithdrawalTransaction {
        WithdrawalTransaction {
            nonce: self.message_nonce,
            sender: self.sender,
            target: self.target,
            value: self.value,
            gasLimit: self.min_gas_limit,
            data: self.message_data.clone(),
        }
    }

    /// The 4-field tuple expected by the FastWithdraw request calls.
    pub fn to_fast_withdraw_tx(&self) -> WithdrawalTx {
        WithdrawalTx {
            nonce: self.message_nonce,
            value: self.value,
            gasLimit: self.min_gas_limit,
            data: self.message_data.clone(),
        }
    }

    /// Message version encoded in the top two bytes of the nonce.
    pub fn nonce_version(&self) -> u16 {
        nonce_version(self.message_nonce)
    }
}

impl From<WithdrawalTransaction> for WithdrawalRequest {
    fn from(tx: WithdrawalTransaction) -> Self {
        Self {
            message_nonce: tx.nonce,
            sender: tx.sender,
            target: tx.target,
            value: tx.value,
            min_gas_limit: tx.gasLimit,
            message_data: tx.data,
        }
    }
}

/// A withdrawal located in an L2 receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiatedWithdrawal {
    pub request: WithdrawalRequest,
    pub hash: WithdrawalHash,
    /// L2 block that included the initiating transaction
    pub l2_block: u64,
    pub tx_hash: TxHash,
}

impl InitiatedWithdrawal {
    /// Extract every `MessagePassed` withdrawal from a receipt, in log order.
    ///
    /// Fails if an event's hash does not match the hash recomputed from its
    /// fields, which would mean the event layout is not the one we expect.
    pub fn all_from_receipt(receipt: &TransactionReceipt) -> eyre::Result<Vec<Self>> {
        let l2_block = receipt
            .block_number
            .ok_or_else(|| eyre::eyre!("Receipt {} is not mined", receipt.transaction_hash))?;

        let mut withdrawals = Vec::new();
        for log in receipt.logs() {
            let Ok(event) = IL2ToL1MessagePasser::MessagePassed::decode_log(&log.inner) else {
                continue;
            };

            let request = WithdrawalRequest {
                message_nonce: event.nonce,
                sender: event.sender,
                target: event.target,
                value: event.value,
                min_gas_limit: event.gasLimit,
                message_data: event.data.data.clone(),
            };

            let computed = request.hash();
            if computed != event.withdrawalHash {
                eyre::bail!(
                    "Withdrawal hash mismatch in {}: event {} computed {}",
                    receipt.transaction_hash,
                    event.withdrawalHash,
                    computed
                );
            }

            withdrawals.push(Self {
                request,
                hash: event.withdrawalHash,
                l2_block,
                tx_hash: receipt.transaction_hash,
            });
        }

        Ok(withdrawals)
    }

    /// Extract the `index`-th withdrawal from a receipt.
    pub fn from_receipt(receipt: &TransactionReceipt, index: usize) -> eyre::Result<Self> {
        let mut withdrawals = Self::all_from_receipt(receipt)?;
        if index >= withdrawals.len() {
            eyre::bail!(
                "Withdrawal index {} out of range: {} has {} MessagePassed events",
                index,
                receipt.transaction_hash,
                withdrawals.len()
            );
        }
        Ok(withdrawals.swap_remove(index))
    }
}
