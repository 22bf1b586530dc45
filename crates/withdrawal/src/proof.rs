//! Proof generation for L2→L1 withdrawals.
//!
//! A withdrawal is proven against the first L2 output, published by the
//! L2OutputOracle, whose block is at or after the withdrawal's L2 block.

use crate::{timing::is_block_covered, types::WithdrawalHash};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::BlockNumberOrTag;
use binding::opstack::{IL2OutputOracle, OutputRootProof, OUTPUT_VERSION_V0};
use eyre::{eyre, Result};
use tracing::debug;

/// Everything `proveWithdrawalTransaction` needs besides the withdrawal itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalProof {
    pub l2_output_index: U256,
    pub output_root_proof: OutputRootProof,
    /// Merkle proof of the `sentMessages` slot in the message passer
    pub withdrawal_proof: Vec<Bytes>,
    /// L2 block of the output the proof is anchored to
    pub output_l2_block: u64,
}

/// Generate the proof for a withdrawal included in `l2_block`.
///
/// Fails if the oracle has not yet published an output covering `l2_block`,
/// or if the output root recomputed from L2 state does not match the one
/// stored by the oracle.
pub async fn generate_proof<P1, P2>(
    l1_provider: &P1,
    l2_provider: &P2,
    oracle_address: Address,
    message_passer_address: Address,
    withdrawal_hash: WithdrawalHash,
    l2_block: u64,
) -> Result<WithdrawalProof>
where
    P1: Provider,
    P2: Provider,
{
    let oracle = IL2OutputOracle::new(oracle_address, l1_provider);

    let next_index = oracle.nextOutputIndex().call().await?;
    let latest = oracle.latestBlockNumber().call().await?;
    if !is_block_covered(next_index, latest, l2_block) {
        eyre::bail!(
            "No output covers L2 block {} yet (latest output block {})",
            l2_block,
            latest
        );
    }

    // 1. Find the first output at or after the withdrawal block
    let l2_output_index = oracle
        .getL2OutputIndexAfter(U256::from(l2_block))
        .call()
        .await?;
    let output = oracle.getL2Output(l2_output_index).call().await?;
    let output_l2_block = u64::try_from(output.l2BlockNumber)
        .map_err(|_| eyre!("Output L2 block {} out of range", output.l2BlockNumber))?;

    debug!(
        output_index = %l2_output_index,
        output_l2_block,
        withdrawal_block = l2_block,
        "Found output covering withdrawal block"
    );

    // 2. The proof must be taken against the OUTPUT's block, not the withdrawal block
    let block = l2_provider
        .get_block_by_number(BlockNumberOrTag::Number(output_l2_block))
        .await?
        .ok_or_else(|| eyre!("Block not found: {}", output_l2_block))?;

    // 3. Storage proof of sentMessages[withdrawalHash]
    let storage_slot = compute_storage_slot(withdrawal_hash);
    let proof_result = l2_provider
        .get_proof(message_passer_address, vec![storage_slot])
        .block_id(BlockNumberOrTag::Number(output_l2_block).into())
        .await?;

    let withdrawal_proof = proof_result
        .storage_proof
        .first()
        .ok_or_else(|| eyre!("No storage proof returned"))?
        .proof
        .clone();

    debug!(proof_nodes = withdrawal_proof.len(), "Generated storage proof");

    let output_root_proof = OutputRootProof {
        version: OUTPUT_VERSION_V0,
        stateRoot: block.header.state_root,
        messagePasserStorageRoot: proof_result.storage_hash,
        latestBlockhash: block.header.hash,
    };

    let computed = compute_output_root(&output_root_proof);
    if computed != output.outputRoot {
        eyre::bail!(
            "Output root mismatch at index {}: oracle {} computed {}",
            l2_output_index,
            output.outputRoot,
            computed
        );
    }

    Ok(WithdrawalProof {
        l2_output_index,
        output_root_proof,
        withdrawal_proof,
        output_l2_block,
    })
}

/// Storage slot of `sentMessages[withdrawal_hash]` in the message passer.
///
/// The mapping lives at slot 0, so the slot is keccak256(hash || 0).
pub fn compute_storage_slot(withdrawal_hash: B256) -> B256 {
    let mut data = [0u8; 64];
    data[0..32].copy_from_slice(withdrawal_hash.as_slice());
    keccak256(data)
}

/// keccak256(version || stateRoot || messagePasserStorageRoot || latestBlockhash)
pub fn compute_output_root(proof: &OutputRootProof) -> B256 {
    let mut data = [0u8; 128];
    data[0..32].copy_from_slice(proof.version.as_slice());
    data[32..64].copy_from_slice(proof.stateRoot.as_slice());
    data[64..96].copy_from_slice(proof.messagePasserStorageRoot.as_slice());
    data[96..128].copy_from_slice(proof.latestBlockhash.as_slice());
    keccak256(data)
}
