pub mod config;
pub mod lifecycle;
pub mod metrics;

use crate::{config::Config, lifecycle::Account};
use alloy_primitives::Address;
use alloy_provider::Provider;
use balance::{Balance, BalanceMonitor, BalanceQuery, Monitor};
use client::SignerFn;
use std::collections::BTreeMap;
use tracing_subscriber::EnvFilter;
use withdrawal::{state::PendingWithdrawal, MessageStatus};

/// Install the global tracing subscriber, `info` unless `RUST_LOG` says otherwise.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Where the signing key of a role comes from.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// One key for every role
    PrivateKey(String),
    /// Prefunded devnet account by index
    DevAccount(usize),
}

impl KeySource {
    /// An explicit key wins over the configured dev account.
    pub fn resolve(private_key: Option<&str>, dev_index: usize) -> Self {
        match private_key {
            Some(key) => Self::PrivateKey(key.to_string()),
            None => Self::DevAccount(dev_index),
        }
    }

    /// Account signing on the chain reached through `provider`.
    pub fn account<P>(&self, chain_id: u64, provider: P) -> eyre::Result<Account>
    where
        P: Provider + Clone + 'static,
    {
        let signer = match self {
            Self::PrivateKey(key) => client::parse_private_key(key)?,
            Self::DevAccount(index) => client::dev_signer(*index, chain_id)?,
        };
        let address = signer.address();
        let signer: SignerFn = client::signer_fn(signer, chain_id, provider);
        Ok(Account { address, signer })
    }
}

/// Key source for each role of a withdrawal flow.
pub fn role_keys(config: &Config, private_key: Option<&str>) -> [KeySource; 3] {
    [
        KeySource::resolve(private_key, config.accounts.withdrawer),
        KeySource::resolve(private_key, config.accounts.prover),
        KeySource::resolve(private_key, config.accounts.finalizer),
    ]
}

pub async fn check_native_balance<P>(
    monitor: &BalanceMonitor<P>,
    address: Address,
) -> eyre::Result<Balance>
where
    P: Provider + Clone,
{
    let query = BalanceQuery::NativeBalance { address };
    let balance = monitor.query_balance(query).await?;
    Ok(balance)
}

/// Number of pending withdrawals per status.
pub fn pending_counts(pending: &[PendingWithdrawal]) -> BTreeMap<MessageStatus, usize> {
    let mut counts = BTreeMap::new();
    for item in pending {
        *counts.entry(item.status).or_insert(0) += 1;
    }
    counts
}
