//! Plain value transfer on a single chain.

use crate::{submit, Action, SignerFn};
use alloy_primitives::{utils::format_ether, Address, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use binding::token::IERC20;
use tracing::info;

/// Native ETH or an ERC20 token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Asset {
    Native,
    Erc20(Address),
}

#[derive(Clone, Debug)]
pub struct Transfer {
    pub asset: Asset,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
    /// Optional: only exists once the transfer was sent
    pub tx_hash: Option<B256>,
}

pub struct TransferAction<P> {
    provider: P,
    signer: SignerFn,
    action: Transfer,
}

impl<P> TransferAction<P>
where
    P: Provider + Clone,
{
    pub fn new(provider: P, signer: SignerFn, action: Transfer) -> Self {
        Self {
            provider,
            signer,
            action,
        }
    }

    fn validate(&self) -> eyre::Result<()> {
        if self.action.to == Address::ZERO {
            eyre::bail!("Recipient address is zero");
        }
        if self.action.amount == U256::ZERO {
            eyre::bail!("Transfer amount is zero");
        }
        if self.action.asset == Asset::Erc20(Address::ZERO) {
            eyre::bail!("Token address is zero");
        }
        Ok(())
    }

    async fn sender_balance(&self) -> eyre::Result<U256> {
        match self.action.asset {
            Asset::Native => Ok(self.provider.get_balance(self.action.from).await?),
            Asset::Erc20(token) => {
                Ok(balance::erc20_balance(&self.provider, token, self.action.from).await?)
            }
        }
    }
}

impl<P> Action for TransferAction<P>
where
    P: Provider + Clone,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        if self.validate().is_err() {
            return Ok(false);
        }
        Ok(self.sender_balance().await? >= self.action.amount)
    }

    async fn is_completed(&self) -> eyre::Result<bool> {
        let Some(tx_hash) = self.action.tx_hash else {
            return Ok(false);
        };

        let receipt = self.provider.get_transaction_receipt(tx_hash).await?;
        Ok(receipt.is_some_and(|r| r.status()))
    }

    async fn execute(&mut self) -> eyre::Result<crate::Result> {
        self.validate()?;

        let tx_request = match self.action.asset {
            Asset::Native => TransactionRequest::default()
                .from(self.action.from)
                .to(self.action.to)
                .value(self.action.amount),
            Asset::Erc20(token) => IERC20::new(token, &self.provider)
                .transfer(self.action.to, self.action.amount)
                .into_transaction_request()
                .from(self.action.from),
        };

        let receipt = submit(&self.provider, &self.signer, tx_request).await?;

        info!(
            tx_hash = %receipt.transaction_hash,
            to = %self.action.to,
            amount = %self.action.amount,
            "Transfer confirmed"
        );

        self.action.tx_hash = Some(receipt.transaction_hash);
        Ok(crate::Result::from_receipt(&receipt))
    }

    fn description(&self) -> String {
        match self.action.asset {
            Asset::Native => format!(
                "Transfer {} ETH from {} to {}",
                format_ether(self.action.amount),
                self.action.from,
                self.action.to
            ),
            Asset::Erc20(token) => format!(
                "Transfer {} of token {} from {} to {}",
                self.action.amount, token, self.action.from, self.action.to
            ),
        }
    }
}
