//! Integration tests for withdrawal state querying.
//!
//! Tests the WithdrawalStateProvider's ability to:
//! - Scan L2 for MessagePassed events
//! - Query L1 for withdrawal status (proven/finalized)
//! - Reconstruct state from blockchain

use crate::setup::{load_test_config, setup_account, setup_orchestrator, setup_provider};
use alloy_primitives::{utils::parse_ether, B256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::BlockNumberOrTag;
use withdrawal::{state::WithdrawalStateProvider, MessageStatus};


#[tokio::test]
#[ignore = "requires local devnet - run with: cargo test -- --ignored"]
async fn test_unknown_withdrawal_is_not_proven_or_finalized() {
    let config = load_test_config();
    let network = config.network_config();
    let contracts = config.l1_contracts().unwrap();

    let state_provider = WithdrawalStateProvider::new(
        setup_provider(&network.l1.rpc_url),
        setup_provider(&network.l2.rpc_url),
        contracts.portal,
        contracts.l2_output_oracle,
        network.l2.message_passer,
    );

    let unknown = B256::repeat_byte(0xab);
    assert!(!state_provider.is_finalized(unknown).await.unwrap());
    assert!(state_provider.is_proven(unknown).await.unwrap().is_none());
    assert!(!state_provider.is_sent(unknown).await.unwrap());

    // far beyond anything proposed
    assert!(!state_provider.is_output_published(u64::MAX / 2).await.unwrap());
}

#[tokio::test]
#[ignore = "requires local devnet and submits actual transaction - run with: cargo test -- --ignored"]
async fn test_scan_finds_initiated_withdrawal() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let config = load_test_config();
    let network = config.network_config();
    let orchestrator = setup_orchestrator(&config);
    let l2_provider = setup_provider(&network.l2.rpc_url);
    let withdrawer = setup_account(config.accounts.withdrawer, network.l2.chain_id, l2_provider.clone());

    let from_block = l2_provider.get_block_number().await.unwrap();
    let (withdrawal, _) = orchestrator
        .initiate(&withdrawer, withdrawer.address, parse_ether("0.01").unwrap())
        .await
        .expect("Failed to initiate withdrawal");

    let state = orchestrator.messenger().state();
    assert!(state.is_sent(withdrawal.hash).await.unwrap());

    let pending = state
        .get_pending_withdrawals(
            BlockNumberOrTag::Number(from_block),
            BlockNumberOrTag::Latest,
            Some(withdrawer.address),
        )
        .await
        .expect("Failed to scan withdrawals");

    println!("Found {} pending withdrawals since block {from_block}", pending.len());
    let found = pending
        .iter()
        .find(|p| p.withdrawal.hash == withdrawal.hash)
        .expect("initiated withdrawal should be pending");

    assert_eq!(found.withdrawal.tx_hash, withdrawal.tx_hash);
    assert_eq!(found.withdrawal.l2_block, withdrawal.l2_block);
    assert!(!found.status.has_reached(MessageStatus::InChallengePeriod));

    let status = state
        .query_withdrawal_status(withdrawal.hash, withdrawal.l2_block)
        .await
        .unwrap();
    assert_eq!(status, found.status);
}

#[tokio::test]
#[ignore = "requires local devnet - run with: cargo test -- --ignored"]
async fn test_scan_rejects_inverted_range() {
    let config = load_test_config();
    let orchestrator = setup_orchestrator(&config);

    let result = orchestrator
        .messenger()
        .state()
        .get_pending_withdrawals(BlockNumberOrTag::Number(10), BlockNumberOrTag::Number(5), None)
        .await;

    assert!(result.is_err());
}
