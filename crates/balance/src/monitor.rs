use crate::{Balance, BalanceQuery, Monitor};
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use binding::token::IERC20;
use eyre::Result;
use tracing::debug;

/// ERC20 `balanceOf` for a single holder.
pub async fn erc20_balance<P>(provider: &P, token: Address, holder: Address) -> Result<U256>
where
    P: Provider,
{
    let contract = IERC20::new(token, provider);
    Ok(contract.balanceOf(holder).call().await?)
}

// Balance monitor implementation.
pub struct BalanceMonitor<P> {
    provider: P,
}

impl<P> BalanceMonitor<P>
where
    P: Provider + Clone,
{
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    async fn query_native(&self, address: Address) -> Result<Balance> {
        debug!(address = %address, "Querying native balance");

        let balance = self.provider.get_balance(address).await?;

        Ok(Balance {
            holder: address,
            asset: Address::ZERO,
            amount: balance,
        })
    }

    async fn query_erc20(&self, token: Address, holder: Address) -> Result<Balance> {
        debug!(token = %token, holder = %holder, "Querying erc20 balance");

        let amount = erc20_balance(&self.provider, token, holder).await?;

        Ok(Balance {
            holder,
            asset: token,
            amount,
        })
    }

    /// Query several balances in order.
    pub async fn snapshot(&self, queries: &[BalanceQuery]) -> Result<Vec<Balance>> {
        let mut balances = Vec::with_capacity(queries.len());
        for query in queries {
            balances.push(self.query_balance(query.clone()).await?);
        }
        Ok(balances)
    }
}

impl<P> Monitor for BalanceMonitor<P>
where
    P: Provider + Clone,
{
    async fn query_balance(&self, query: BalanceQuery) -> Result<Balance> {
        match query {
            BalanceQuery::ERC20Balance { token, holder } => self.query_erc20(token, holder).await,
            BalanceQuery::NativeBalance { address } => self.query_native(address).await,
        }
    }
}
