//! Integration tests for the deployment driver.
//!
//! Needs the compiled Hardhat artifacts under `artifacts_dir`.

use crate::setup::{load_test_config, setup_account, setup_provider};
use action::{
    deploy::{Artifact, Deploy, DeployAction, DeployTarget},
    Action,
};
use alloy_provider::Provider;
use config::AddressBook;


#[tokio::test]
#[ignore = "requires local devnet, compiled artifacts and submits actual transaction"]
async fn test_deploy_records_address() {
    let config = load_test_config();
    let network = config.network_config();
    let l1_provider = setup_provider(&network.l1.rpc_url);
    let deployer = setup_account(config.accounts.deployer, network.l1.chain_id, l1_provider.clone());

    let dir = tempfile::tempdir().unwrap();
    let book_path = dir.path().join("afterDevnetUp.deploy.json");
    // entries already in the book survive the deployment
    let mut book = AddressBook::new();
    book.insert("Existing", deployer.address);
    book.save(&book_path).unwrap();

    let target = DeployTarget::Multicall3;
    let artifact = Artifact::load(config.artifact_path(target.artifact_name()))
        .expect("Multicall3 artifact; compile the contracts first");

    let mut action = DeployAction::new(
        l1_provider.clone(),
        deployer.signer.clone(),
        Deploy {
            target,
            artifact,
            address_book: book_path.clone(),
            from: deployer.address,
        },
    );
    assert!(!action.is_completed().await.unwrap());

    let result = action.execute().await.expect("Failed to deploy");
    let address = action.deployed().expect("deployment address");
    println!("✓ Multicall3 deployed at {address} in tx {}", result.tx_hash);

    let book = AddressBook::load(&book_path).unwrap();
    assert_eq!(book.get("Multicall3"), Some(address));
    assert_eq!(book.get("Existing"), Some(deployer.address));

    let code = l1_provider.get_code_at(address).await.unwrap();
    assert!(!code.is_empty());
    assert!(action.is_completed().await.unwrap());
}
