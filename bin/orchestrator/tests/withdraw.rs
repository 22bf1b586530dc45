//! Integration tests for withdrawal initiation on L2.

use crate::setup::{load_test_config, mock_signer, setup_account, setup_orchestrator, setup_provider};
use action::{
    withdraw::{InitiateAction, Withdraw, WithdrawKind},
    Action,
};
use alloy_primitives::{utils::parse_ether, Address, Bytes, U256};
use alloy_provider::Provider;
use messenger::MessengerAdapter;
use withdrawal::{InitiatedWithdrawal, MessageStatus};


fn create_test_withdrawal(message_passer: Address, from: Address, to: Address) -> Withdraw {
    Withdraw {
        kind: WithdrawKind::Native { message_passer },
        from,
        to,
        amount: parse_ether("0.01").unwrap(),
        min_gas_limit: 21_000,
        data: Bytes::new(),
        tx_hash: None,
    }
}

#[tokio::test]
async fn test_withdraw_action_validation() {
    let config = load_test_config();
    let network = config.network_config();
    // validation fails before any request is made
    let provider = setup_provider(&network.l2.rpc_url);
    let from = Address::repeat_byte(1);

    let zero_target = create_test_withdrawal(network.l2.message_passer, from, Address::ZERO);
    let action = InitiateAction::new(provider.clone(), mock_signer(), zero_target);
    assert!(!action.is_ready().await.expect("Failed to check is_ready"));

    let mut zero_amount = create_test_withdrawal(network.l2.message_passer, from, from);
    zero_amount.amount = U256::ZERO;
    let mut action = InitiateAction::new(provider, mock_signer(), zero_amount);
    assert!(!action.is_ready().await.expect("Failed to check is_ready"));
    assert!(action.execute().await.is_err());
    assert!(action.withdrawal().is_none());
}

#[tokio::test]
#[ignore = "requires local devnet - run with: cargo test -- --ignored"]
async fn test_withdraw_action_is_ready_checks_balance() {
    let config = load_test_config();
    let network = config.network_config();
    let provider = setup_provider(&network.l2.rpc_url);
    let account = setup_account(config.accounts.withdrawer, network.l2.chain_id, provider.clone());

    let balance = provider
        .get_balance(account.address)
        .await
        .expect("Failed to get balance");
    println!("Withdrawer balance: {} wei", balance);

    let mut withdraw = create_test_withdrawal(network.l2.message_passer, account.address, account.address);
    let action = InitiateAction::new(provider.clone(), mock_signer(), withdraw.clone());
    assert!(action.is_ready().await.unwrap());

    withdraw.amount = balance + U256::from(1);
    let action = InitiateAction::new(provider, mock_signer(), withdraw);
    assert!(!action.is_ready().await.unwrap());
}

/// Initiates a real withdrawal and checks what the receipt and the messenger
/// report about it.
#[tokio::test]
#[ignore = "requires local devnet and submits actual transaction - run with: cargo test -- --ignored"]
async fn test_initiate_withdrawal() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let config = load_test_config();
    let network = config.network_config();
    let orchestrator = setup_orchestrator(&config);
    let l2_provider = setup_provider(&network.l2.rpc_url);
    let withdrawer = setup_account(config.accounts.withdrawer, network.l2.chain_id, l2_provider.clone());
    let amount = parse_ether("0.01").unwrap();

    let (withdrawal, result) = orchestrator
        .initiate(&withdrawer, withdrawer.address, amount)
        .await
        .expect("Failed to initiate withdrawal");

    println!("✓ Withdrawal initiated");
    println!("  Tx: {}", result.tx_hash);
    println!("  Hash: {}", withdrawal.hash);
    println!("  L2 block: {}", withdrawal.l2_block);

    assert_eq!(withdrawal.tx_hash, result.tx_hash);
    assert_eq!(withdrawal.hash, withdrawal.request.hash());
    assert_eq!(withdrawal.request.sender, withdrawer.address);
    assert_eq!(withdrawal.request.target, withdrawer.address);
    assert_eq!(withdrawal.request.value, amount);
    assert_eq!(withdrawal.request.min_gas_limit, U256::from(21_000));

    // the receipt decodes to the same withdrawal
    let receipt = l2_provider
        .get_transaction_receipt(result.tx_hash)
        .await
        .unwrap()
        .expect("receipt should exist");
    let decoded = InitiatedWithdrawal::from_receipt(&receipt, 0).unwrap();
    assert_eq!(decoded.hash, withdrawal.hash);

    let messenger = orchestrator.messenger();
    assert!(messenger
        .to_cross_chain_message(result.tx_hash, 0)
        .await
        .unwrap()
        .is_none());

    let status = messenger.message_status(result.tx_hash, 0).await.unwrap();
    println!("  Status: {status}");
    assert!(!status.has_reached(MessageStatus::InChallengePeriod));
}
