//! Integration tests for finalizing withdrawals on L1.
//!
//! Tests the orchestrator's ability to:
//! - Wait out the finalization period of a proven withdrawal
//! - Route a first-time finalization to the portal
//! - Surface the revert of a second finalization

use crate::setup::{load_test_config, setup_account, setup_orchestrator, setup_provider};
use alloy_primitives::utils::parse_ether;
use messenger::{resolve_route, FinalizationRoute, MessengerAdapter};
use withdrawal::{hash::compute_withdrawal_hash, MessageStatus};


/// Test finalizing a freshly proven withdrawal
///
/// This test:
/// 1. Initiates and proves a withdrawal
/// 2. Waits for the finalization period and an L1 block past it
/// 3. Checks the route is a direct portal finalization
/// 4. Finalizes, then finalizes again and expects the revert
#[tokio::test]
#[ignore = "requires local devnet and submits actual transactions - run with: cargo test -- --ignored"]
async fn test_finalize_direct_then_duplicate() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let config = load_test_config();
    let network = config.network_config();
    let settings = config.lifecycle_settings();
    let orchestrator = setup_orchestrator(&config);

    let l1_provider = setup_provider(&network.l1.rpc_url);
    let withdrawer = setup_account(
        config.accounts.withdrawer,
        network.l2.chain_id,
        setup_provider(&network.l2.rpc_url),
    );
    let prover = setup_account(config.accounts.prover, network.l1.chain_id, l1_provider.clone());
    let finalizer = setup_account(config.accounts.finalizer, network.l1.chain_id, l1_provider);

    let (withdrawal, _) = orchestrator
        .initiate(&withdrawer, finalizer.address, parse_ether("0.01").unwrap())
        .await
        .expect("Failed to initiate withdrawal");
    let tx_hash = withdrawal.tx_hash;

    orchestrator.wait_until_provable(&withdrawal).await.unwrap();
    let retry = settings.prove_retry.expect("test config enables prove retries");
    orchestrator
        .prove_with_retry(&prover, tx_hash, 0, retry)
        .await
        .expect("Failed to prove withdrawal");

    let waited = orchestrator
        .wait_until_finalizable(withdrawal.hash)
        .await
        .expect("Failed to read the finalization period");
    println!("Waited {waited}s for the finalization period");

    let messenger = orchestrator.messenger();
    messenger
        .wait_for_message_status(tx_hash, 0, MessageStatus::ReadyForRelay, settings.poll_interval)
        .await
        .unwrap();

    // never attempted before: portal finalization of the same withdrawal
    let route = resolve_route(messenger, tx_hash, 0).await.unwrap();
    match &route {
        FinalizationRoute::Direct(tx) => assert_eq!(compute_withdrawal_hash(tx), withdrawal.hash),
        FinalizationRoute::Replay(_) => panic!("expected a direct route, got a replay"),
    }

    let (result, route) = orchestrator
        .finalize(&finalizer, tx_hash, 0)
        .await
        .expect("Failed to finalize withdrawal");
    println!("✓ Finalized in tx {} via {}", result.tx_hash, route.name());
    assert_eq!(route.name(), "direct");

    let status = messenger.message_status(tx_hash, 0).await.unwrap();
    assert_eq!(status, MessageStatus::Relayed);

    let err = orchestrator
        .finalize(&finalizer, tx_hash, 0)
        .await
        .expect_err("second finalization must revert");
    println!("✓ Second finalization rejected: {err}");
}
