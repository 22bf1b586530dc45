mod dev_accounts;

use alloy_consensus::TxEnvelope;
use alloy_network::{eip2718::Encodable2718, EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, Bytes};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
pub use dev_accounts::{dev_private_key, dev_signer, DEV_ACCOUNT_COUNT};
use std::{future::Future, pin::Pin, sync::Arc};
use thiserror::Error;

/// A function that signs a transaction request and returns signed bytes.
///
/// Actions only ever see this type, so the same action code runs against a
/// devnet dev account or any other key the binary was configured with.
pub type SignerFn = Arc<
    dyn Fn(TransactionRequest) -> Pin<Box<dyn Future<Output = eyre::Result<Bytes>> + Send>>
        + Send
        + Sync,
>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// Error with private key
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Dev account index outside the prefunded range
    #[error("Unknown dev account index {0} (devnet prefunds {DEV_ACCOUNT_COUNT} accounts)")]
    UnknownDevAccount(usize),
}

/// Convenience function to create an ethereum rpc provider from url.
pub fn create_provider(rpc_url: &str) -> Result<impl Provider + Clone, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;
    let provider = ProviderBuilder::new().connect_http(url);

    Ok(provider)
}

/// Parse a hex private key, with or without `0x` prefix.
pub fn parse_private_key(private_key: &str) -> Result<PrivateKeySigner, ClientError> {
    private_key
        .parse()
        .map_err(|e| ClientError::InvalidPrivateKey(format!("{}", e)))
}

/// Create a SignerFn from an already parsed signer.
pub fn signer_fn<P>(signer: PrivateKeySigner, chain_id: u64, provider: P) -> SignerFn
where
    P: Provider + Clone + 'static,
{
    let from_address = signer.address();
    let wallet = EthereumWallet::from(signer);

    Arc::new(move |tx: TransactionRequest| {
        let wallet = wallet.clone();
        let provider = provider.clone();
        Box::pin(async move {
            let filled_tx = fill_transaction(tx, &provider, from_address, chain_id).await?;

            // Build and sign the typed transaction
            let tx_envelope: TxEnvelope = filled_tx
                .build(&wallet)
                .await
                .map_err(|e| eyre::eyre!("{}", e))?;

            // Encode to EIP-2718 bytes
            let mut encoded = Vec::new();
            tx_envelope.encode_2718(&mut encoded);
            Ok(Bytes::from(encoded))
        })
    })
}

/// Fill missing transaction fields using the provider.
///
/// Gas estimation runs the call against the latest state, so a transaction
/// that would revert (window not elapsed, duplicate finalization) fails here
/// with the revert reason.
pub async fn fill_transaction<P>(
    mut tx: TransactionRequest,
    provider: &P,
    from: Address,
    chain_id: u64,
) -> eyre::Result<TransactionRequest>
where
    P: Provider,
{
    // Set from address
    if tx.from.is_none() {
        tx.from = Some(from);
    }

    // Set chain_id
    if tx.chain_id.is_none() {
        tx.chain_id = Some(chain_id);
    }

    // Get nonce if not set
    if tx.nonce.is_none() {
        let nonce = provider.get_transaction_count(from).await?;
        tx.nonce = Some(nonce);
    }

    // Get fee parameters if not set (EIP-1559) - do this before gas estimation
    // since gas estimation may need fee info
    if tx.max_fee_per_gas.is_none() || tx.max_priority_fee_per_gas.is_none() {
        let fee_estimate = provider.estimate_eip1559_fees().await?;
        if tx.max_fee_per_gas.is_none() {
            tx.max_fee_per_gas = Some(fee_estimate.max_fee_per_gas);
        }
        if tx.max_priority_fee_per_gas.is_none() {
            tx.max_priority_fee_per_gas = Some(fee_estimate.max_priority_fee_per_gas);
        }
    }

    // Estimate gas if not set
    if tx.gas.is_none() {
        let gas_estimate = provider.estimate_gas(tx.clone()).await?;
        // Add 20% buffer for safety
        tx.gas = Some(gas_estimate + gas_estimate / 5);
    }

    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url() {
        let result = create_provider("not a url");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_private_key() {
        let result = parse_private_key("0x1234");
        assert!(matches!(result, Err(ClientError::InvalidPrivateKey(_))));
    }

    #[tokio::test]
    async fn test_signer_fn_signs_filled_request() {
        // every field is set, so the provider is never asked
        let provider = create_provider("http://127.0.0.1:1").unwrap();
        let signer = dev_signer(0, 900).unwrap();
        let sign = signer_fn(signer, 900, provider);

        let tx = TransactionRequest::default()
            .with_to(Address::repeat_byte(1))
            .with_value(alloy_primitives::U256::from(1))
            .with_nonce(0)
            .with_gas_limit(21_000)
            .with_max_fee_per_gas(2_000_000_000)
            .with_max_priority_fee_per_gas(1_000_000_000);

        let raw = sign(tx).await.unwrap();
        // EIP-1559 envelope
        assert_eq!(raw[0], 0x02);
    }
}
