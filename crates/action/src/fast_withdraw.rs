//! Fast withdrawal request action.
//!
//! Asks the FastWithdraw contract on L1 to pay out a withdrawal ahead of the
//! challenge window. The contract identifies the withdrawal by the 4-field
//! [`WithdrawalTx`] tuple, so the request must match the initiated one.

use crate::{submit, Action, SignerFn};
use alloy_primitives::Address;
use alloy_provider::Provider;
use binding::fast_withdraw::{IFastWithdraw, WithdrawalTx};
use tracing::info;
use withdrawal::{state::WithdrawalStateProvider, InitiatedWithdrawal};

/// Which payout the request asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FastWithdrawAsset {
    Eth,
    Erc20,
}

/// Input data for a fast withdrawal request.
#[derive(Clone, Debug)]
pub struct FastWithdraw {
    /// FastWithdraw contract address on L1
    pub fast_withdraw_address: Address,
    /// OptimismPortal contract address on L1
    pub portal_address: Address,
    /// L2OutputOracle contract address on L1
    pub oracle_address: Address,
    /// L2ToL1MessagePasser address on L2
    pub message_passer_address: Address,
    pub asset: FastWithdrawAsset,
    pub withdrawal: InitiatedWithdrawal,
    /// Address requesting the payout on L1
    pub from: Address,
}

pub struct FastWithdrawAction<P1, P2> {
    l1_provider: P1,
    l2_provider: P2,
    signer: SignerFn,
    action: FastWithdraw,
}

impl<P1, P2> FastWithdrawAction<P1, P2>
where
    P1: Provider + Clone,
    P2: Provider + Clone,
{
    pub fn new(l1_provider: P1, l2_provider: P2, signer: SignerFn, action: FastWithdraw) -> Self {
        Self {
            l1_provider,
            l2_provider,
            signer,
            action,
        }
    }

    /// The tuple sent to the contract.
    pub fn request(&self) -> WithdrawalTx {
        self.action.withdrawal.request.to_fast_withdraw_tx()
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

impl<P1, P2> Action for FastWithdrawAction<P1, P2>
where
    P1: Provider + Clone,
    P2: Provider + Clone,
{
    /// Ready once the withdrawal is proven and not yet finalized.
    async fn is_ready(&self) -> eyre::Result<bool> {
        if self.action.fast_withdraw_address == Address::ZERO {
            return Ok(false);
        }

        let state = self.state();
        let hash = self.action.withdrawal.hash;
        if state.is_finalized(hash).await? {
            return Ok(false);
        }
        Ok(state.is_proven(hash).await?.is_some())
    }

    async fn is_completed(&self) -> eyre::Result<bool> {
        self.state().is_finalized(self.action.withdrawal.hash).await
    }

    async fn execute(&mut self) -> eyre::Result<crate::Result> {
        let contract = IFastWithdraw::new(self.action.fast_withdraw_address, &self.l1_provider);
        let request = self.request();

        let tx_request = match self.action.asset {
            FastWithdrawAsset::Eth => contract.requestFWETH(request).into_transaction_request(),
            FastWithdrawAsset::Erc20 => contract.requestFWERC20(request).into_transaction_request(),
        }
        .from(self.action.from);

        let receipt = submit(&self.l1_provider, &self.signer, tx_request).await?;

        info!(
            tx_hash = %receipt.transaction_hash,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            withdrawal_hash = %self.action.withdrawal.hash,
            asset = ?self.action.asset,
            "Fast withdrawal requested"
        );

        Ok(crate::Result::from_receipt(&receipt))
    }

    fn description(&self) -> String {
        format!(
            "Requesting fast {} payout of withdrawal {} from {}",
            match self.action.asset {
                FastWithdrawAsset::Eth => "ETH",
                FastWithdrawAsset::Erc20 => "ERC20",
            },
            self.action.withdrawal.hash,
            self.action.fast_withdraw_address
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{mock_signer, MockProvider};
    use alloy_primitives::{address, b256, Bytes, U256};
    use withdrawal::WithdrawalRequest;

    fn create_action(asset: FastWithdrawAsset) -> FastWithdrawAction<MockProvider, MockProvider> {
        let request = WithdrawalRequest {
            message_nonce: (U256::from(1) << 240) | U256::from(7),
            sender: address!("4200000000000000000000000000000000000007"),
            target: address!("959922bE3CAee4b8Cd9a407cc3ac1C251C2007B1"),
            value: U256::from(5_000),
            min_gas_limit: U256::from(200_000),
            message_data: Bytes::from(vec![0xde, 0xad]),
        };
        let fast = FastWithdraw {
            fast_withdraw_address: address!("7a2088a1bFc9d81c55368AE168C2C02570cB814F"),
            portal_address: address!("9A676e781A523b5d0C0e43731313A708CB607508"),
            oracle_address: address!("0B306BF915C4d645ff596e518fAf3F9669b97016"),
            message_passer_address: address!("4200000000000000000000000000000000000016"),
            asset,
            withdrawal: InitiatedWithdrawal {
                hash: b256!("1111111111111111111111111111111111111111111111111111111111111111"),
                request,
                l2_block: 42,
                tx_hash: b256!("2222222222222222222222222222222222222222222222222222222222222222"),
            },
            from: address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
        };

        FastWithdrawAction::new(MockProvider, MockProvider, mock_signer(), fast)
    }

    #[test]
    fn test_request_uses_withdrawal_fields() {
        let action = create_action(FastWithdrawAsset::Eth);
        let tx = action.request();

        assert_eq!(tx.nonce, (U256::from(1) << 240) | U256::from(7));
        assert_eq!(tx.value, U256::from(5_000));
        assert_eq!(tx.gasLimit, U256::from(200_000));
        assert_eq!(tx.data, Bytes::from(vec![0xde, 0xad]));
    }

    #[test]
    fn test_description() {
        let desc = create_action(FastWithdrawAsset::Erc20).description();
        assert!(desc.contains("ERC20"));
        assert!(desc.contains("1111111111111111111111111111111111111111111111111111111111111111"));
    }
}
