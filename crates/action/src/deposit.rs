//! L1→L2 deposit action.

use crate::{submit, Action, SignerFn};
use alloy_primitives::{utils::format_ether, Address, Bytes, B256, U256};
use alloy_provider::Provider;
use binding::{
    opstack::{IL1StandardBridge, IOptimismPortal},
    token::IERC20,
};
use tracing::info;

/// What is deposited, and through which contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositKind {
    /// ETH minted on L2 through `OptimismPortal.depositTransaction`
    Eth { portal: Address },
    /// ERC20 locked in the L1 standard bridge and minted as `l2_token`
    Erc20 {
        l1_bridge: Address,
        l1_token: Address,
        l2_token: Address,
    },
}

/// Configuration for a deposit action.
#[derive(Debug, Clone)]
pub struct DepositConfig {
    pub kind: DepositKind,
    /// Depositor on L1
    pub from: Address,
    /// Recipient on L2
    pub to: Address,
    pub amount: U256,
    /// Gas limit of the L2 execution
    pub gas_limit: u32,
    pub data: Bytes,
    /// Optional: only exists once the deposit was sent
    pub tx_hash: Option<B256>,
}

/// Deposit action for moving ETH or tokens from L1 to L2.
pub struct DepositAction<P> {
    provider: P,
    signer: SignerFn,
    config: DepositConfig,
}

impl<P> DepositAction<P>
where
    P: Provider + Clone,
{
    pub fn new(provider: P, signer: SignerFn, config: DepositConfig) -> Self {
        Self {
            provider,
            signer,
            config,
        }
    }

    fn validate_config(&self) -> eyre::Result<()> {
        if self.config.to == Address::ZERO {
            eyre::bail!("Recipient address is zero");
        }

        if self.config.amount == U256::ZERO {
            eyre::bail!("Deposit amount is zero");
        }

        match &self.config.kind {
            DepositKind::Eth { portal } if *portal == Address::ZERO => {
                eyre::bail!("Portal address is zero")
            }
            DepositKind::Erc20 {
                l1_bridge,
                l1_token,
                l2_token,
            } if *l1_bridge == Address::ZERO
                || *l1_token == Address::ZERO
                || *l2_token == Address::ZERO =>
            {
                eyre::bail!("Bridge or token address is zero")
            }
            _ => Ok(()),
        }
    }

    /// Approve the bridge for the deposit amount if the allowance is short.
    async fn ensure_allowance(&self, l1_bridge: Address, l1_token: Address) -> eyre::Result<()> {
        let token = IERC20::new(l1_token, &self.provider);
        let allowance = token.allowance(self.config.from, l1_bridge).call().await?;
        if allowance >= self.config.amount {
            return Ok(());
        }

        let tx_request = token
            .approve(l1_bridge, self.config.amount)
            .into_transaction_request()
            .from(self.config.from);
        let receipt = submit(&self.provider, &self.signer, tx_request).await?;

        info!(
            tx_hash = %receipt.transaction_hash,
            token = %l1_token,
            spender = %l1_bridge,
            amount = %self.config.amount,
            "Approved bridge for deposit"
        );
        Ok(())
    }
}

impl<P> Action for DepositAction<P>
where
    P: Provider + Clone,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        if self.validate_config().is_err() {
            return Ok(false);
        }

        let balance = match &self.config.kind {
            DepositKind::Eth { .. } => self.provider.get_balance(self.config.from).await?,
            DepositKind::Erc20 { l1_token, .. } => {
                balance::erc20_balance(&self.provider, *l1_token, self.config.from).await?
            }
        };
        Ok(balance >= self.config.amount)
    }

    async fn is_completed(&self) -> eyre::Result<bool> {
        let Some(tx_hash) = self.config.tx_hash else {
            return Ok(false);
        };

        let receipt = self.provider.get_transaction_receipt(tx_hash).await?;
        Ok(receipt.is_some_and(|r| r.status()))
    }

    async fn execute(&mut self) -> eyre::Result<crate::Result> {
        self.validate_config()?;

        let tx_request = match self.config.kind.clone() {
            DepositKind::Eth { portal } => {
                let portal = IOptimismPortal::new(portal, &self.provider);
                portal
                    .depositTransaction(
                        self.config.to,
                        self.config.amount,
                        u64::from(self.config.gas_limit),
                        false,
                        self.config.data.clone(),
                    )
                    .into_transaction_request()
                    .from(self.config.from)
                    .value(self.config.amount)
            }
            DepositKind::Erc20 {
                l1_bridge,
                l1_token,
                l2_token,
            } => {
                self.ensure_allowance(l1_bridge, l1_token).await?;

                let bridge = IL1StandardBridge::new(l1_bridge, &self.provider);
                bridge
                    .depositERC20To(
                        l1_token,
                        l2_token,
                        self.config.to,
                        self.config.amount,
                        self.config.gas_limit,
                        self.config.data.clone(),
                    )
                    .into_transaction_request()
                    .from(self.config.from)
            }
        };

        let receipt = submit(&self.provider, &self.signer, tx_request).await?;

        info!(
            tx_hash = %receipt.transaction_hash,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            to = %self.config.to,
            amount = %self.config.amount,
            "Deposit sent to L2"
        );

        self.config.tx_hash = Some(receipt.transaction_hash);
        Ok(crate::Result::from_receipt(&receipt))
    }

    fn description(&self) -> String {
        match &self.config.kind {
            DepositKind::Eth { .. } => format!(
                "Deposit {} ETH from {} to {} on L2",
                format_ether(self.config.amount),
                self.config.from,
                self.config.to
            ),
            DepositKind::Erc20 { l1_token, .. } => format!(
                "Deposit {} of token {} from {} to {} on L2",
                self.config.amount, l1_token, self.config.from, self.config.to
            ),
        }
    }
}
