//! Initiate withdrawal action.
//!
//! Starts an L2→L1 withdrawal, either directly through the message passer or
//! through the L2 standard bridge.

use crate::{submit, Action, SignerFn};
use alloy_primitives::{utils::format_ether, Address, Bytes, B256, U256};
use alloy_provider::Provider;
use binding::opstack::{IL2StandardBridge, IL2ToL1MessagePasser};
use tracing::info;
use withdrawal::InitiatedWithdrawal;

/// How the withdrawal leaves L2.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WithdrawKind {
    /// Native ETH through `L2ToL1MessagePasser.initiateWithdrawal`
    Native { message_passer: Address },
    /// Bridged token through `L2StandardBridge.withdrawTo`
    Erc20 { l2_bridge: Address, l2_token: Address },
}

/// Withdraw input data.
#[derive(Clone, Debug)]
pub struct Withdraw {
    pub kind: WithdrawKind,
    /// Account initiating the withdrawal on L2
    pub from: Address,
    /// Recipient on L1
    pub to: Address,
    pub amount: U256,
    /// Gas the L1 side must forward to the recipient
    pub min_gas_limit: u32,
    pub data: Bytes,
    /// Optional: only exists on initiated withdrawal
    pub tx_hash: Option<B256>,
}

pub struct InitiateAction<P> {
    provider: P,
    signer: SignerFn,
    action: Withdraw,
    initiated: Option<InitiatedWithdrawal>,
}

impl<P: Provider + Clone> InitiateAction<P> {
    pub fn new(provider: P, signer: SignerFn, action: Withdraw) -> Self {
        Self {
            provider,
            signer,
            action,
            initiated: None,
        }
    }

    /// The withdrawal created by [`Action::execute`].
    pub const fn withdrawal(&self) -> Option<&InitiatedWithdrawal> {
        self.initiated.as_ref()
    }

    fn validate(&self) -> eyre::Result<()> {
        if self.action.amount == U256::ZERO {
            eyre::bail!("Withdrawal amount is zero");
        }

        if self.action.to == Address::ZERO {
            eyre::bail!("Recipient address is zero");
        }

        if let WithdrawKind::Erc20 { l2_token, .. } = &self.action.kind {
            if *l2_token == Address::ZERO {
                eyre::bail!("L2 token address is zero");
            }
        }

        Ok(())
    }
}

impl<P> Action for InitiateAction<P>
where
    P: Provider + Clone,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        if self.validate().is_err() {
            return Ok(false);
        }

        match &self.action.kind {
            WithdrawKind::Native { .. } => {
                let balance = self.provider.get_balance(self.action.from).await?;
                Ok(balance >= self.action.amount)
            }
            WithdrawKind::Erc20 { l2_token, .. } => {
                let balance = balance::erc20_balance(&self.provider, *l2_token, self.action.from).await?;
                Ok(balance >= self.action.amount)
            }
        }
    }

    async fn is_completed(&self) -> eyre::Result<bool> {
        let Some(tx_hash) = self.action.tx_hash else {
            return Ok(false);
        };

        let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? else {
            return Ok(false);
        };

        let Ok(withdrawals) = InitiatedWithdrawal::all_from_receipt(&receipt) else {
            return Ok(false);
        };

        Ok(!withdrawals.is_empty())
    }

    async fn execute(&mut self) -> eyre::Result<crate::Result> {
        self.validate()?;

        if self.is_completed().await? {
            eyre::bail!("Withdrawal already initiated")
        }

        let tx_request = match &self.action.kind {
            WithdrawKind::Native { message_passer } => {
                let contract = IL2ToL1MessagePasser::new(*message_passer, &self.provider);
                contract
                    .initiateWithdrawal(
                        self.action.to,
                        U256::from(self.action.min_gas_limit),
                        self.action.data.clone(),
                    )
                    .into_transaction_request()
                    .from(self.action.from)
                    .value(self.action.amount)
            }
            WithdrawKind::Erc20 {
                l2_bridge,
                l2_token,
            } => {
                let bridge = IL2StandardBridge::new(*l2_bridge, &self.provider);
                bridge
                    .withdrawTo(
                        *l2_token,
                        self.action.to,
                        self.action.amount,
                        self.action.min_gas_limit,
                        self.action.data.clone(),
                    )
                    .into_transaction_request()
                    .from(self.action.from)
            }
        };

        let receipt = submit(&self.provider, &self.signer, tx_request).await?;
        let initiated = InitiatedWithdrawal::from_receipt(&receipt, 0)?;

        info!(
            tx_hash = %receipt.transaction_hash,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            withdrawal_hash = %initiated.hash,
            nonce = %initiated.request.message_nonce,
            "Withdrawal initiated"
        );

        self.action.tx_hash = Some(receipt.transaction_hash);
        self.initiated = Some(initiated);

        Ok(crate::Result::from_receipt(&receipt))
    }

    fn description(&self) -> String {
        match &self.action.kind {
            WithdrawKind::Native { .. } => format!(
                "Withdrawing {} ETH to {} on L1",
                format_ether(self.action.amount),
                self.action.to
            ),
            WithdrawKind::Erc20 { l2_token, .. } => format!(
                "Withdrawing {} of token {} to {} on L1",
                self.action.amount, l2_token, self.action.to
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{mock_signer, MockProvider};
    use alloy_primitives::{address, utils::parse_ether};

    fn native_withdraw() -> Withdraw {
        Withdraw {
            kind: WithdrawKind::Native {
                message_passer: address!("4200000000000000000000000000000000000016"),
            },
            from: address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            to: address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"),
            amount: parse_ether("1").unwrap(),
            min_gas_limit: 100_000,
            data: Bytes::new(),
            tx_hash: None,
        }
    }

    #[test]
    fn test_validate() {
        let action = InitiateAction::new(MockProvider, mock_signer(), native_withdraw());
        assert!(action.validate().is_ok());

        let mut zero = native_withdraw();
        zero.amount = U256::ZERO;
        let action = InitiateAction::new(MockProvider, mock_signer(), zero);
        assert!(action.validate().unwrap_err().to_string().contains("amount"));

        let mut no_recipient = native_withdraw();
        no_recipient.to = Address::ZERO;
        let action = InitiateAction::new(MockProvider, mock_signer(), no_recipient);
        assert!(action.validate().unwrap_err().to_string().contains("Recipient"));

        let mut no_token = native_withdraw();
        no_token.kind = WithdrawKind::Erc20 {
            l2_bridge: address!("4200000000000000000000000000000000000010"),
            l2_token: Address::ZERO,
        };
        let action = InitiateAction::new(MockProvider, mock_signer(), no_token);
        assert!(action.validate().unwrap_err().to_string().contains("token"));
    }

    #[tokio::test]
    async fn test_not_completed_without_tx_hash() {
        let action = InitiateAction::new(MockProvider, mock_signer(), native_withdraw());
        assert!(!action.is_completed().await.unwrap());
        assert!(action.withdrawal().is_none());
    }

    #[test]
    fn test_description() {
        let action = InitiateAction::new(MockProvider, mock_signer(), native_withdraw());
        let desc = action.description();
        assert!(desc.contains("1.000000000000000000 ETH"));
        assert!(desc.contains("L1"));
    }
}
