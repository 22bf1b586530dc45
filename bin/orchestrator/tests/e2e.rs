//! End-to-end withdrawal scenario.
//!
//! Withdraws 1 ETH from the withdrawer on L2 to the finalizer on L1, waits
//! both windows, proves and finalizes, then checks the L1 balance delta
//! against the withdrawn amount less the L1 fees the recipient paid.
//!
//! Run with:
//! ```bash
//! cargo test --package orchestrator --test e2e -- --ignored --nocapture
//! ```

use crate::setup::{load_test_config, setup_account, setup_orchestrator, setup_provider};
use alloy_primitives::utils::{format_ether, parse_ether};
use balance::{BalanceChange, BalanceMonitor};
use orchestrator::{
    check_native_balance,
    lifecycle::{LifecycleStage, RunRequest},
};


#[tokio::test]
#[ignore = "requires local devnet, submits actual transactions and waits out the finalization period"]
async fn test_withdrawal_lifecycle_end_to_end() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let config = load_test_config();
    let network = config.network_config();
    let orchestrator = setup_orchestrator(&config);

    let l1_provider = setup_provider(&network.l1.rpc_url);
    let l2_provider = setup_provider(&network.l2.rpc_url);
    let finalizer = setup_account(config.accounts.finalizer, network.l1.chain_id, l1_provider.clone());
    let amount = parse_ether("1").unwrap();

    let request = RunRequest {
        withdrawer: setup_account(config.accounts.withdrawer, network.l2.chain_id, l2_provider),
        prover: setup_account(config.accounts.prover, network.l1.chain_id, l1_provider.clone()),
        to: finalizer.address,
        amount,
        finalizer,
    };

    let monitor = BalanceMonitor::new(l1_provider);
    let before = check_native_balance(&monitor, request.to).await.unwrap();

    let flow = orchestrator
        .run(&request)
        .await
        .expect("Withdrawal flow failed");

    let after = check_native_balance(&monitor, request.to).await.unwrap();
    let finalize_fee = flow.finalize_tx.as_ref().expect("finalize receipt").fee;

    println!("✓ Flow reached {}", flow.stage());
    println!("  Before: {} ETH", format_ether(before.amount));
    println!("  After:  {} ETH", format_ether(after.amount));
    println!("  Finalize fee: {} ETH", format_ether(finalize_fee));

    assert_eq!(flow.stage(), LifecycleStage::Finalized);
    assert_eq!(flow.route.as_ref().map(|route| route.name()), Some("direct"));
    assert!(flow.prove_tx.is_some());
    assert!(flow.proof.is_some());

    // with dev accounts the recipient only pays for the finalization; with one
    // PRIVATE_KEY for every role it pays for the proof too
    let expected = request.expected_recipient_increase(&flow);
    if request.prover.address != request.to {
        assert_eq!(expected, amount - finalize_fee);
    }
    assert_eq!(
        before.change_to(&after).unwrap(),
        BalanceChange::Increased(expected)
    );
}
