//! Delay windows of the withdrawal lifecycle.
//!
//! Two waits exist on L1: until an output covering the withdrawal block is
//! published (prove), and until the finalization period has elapsed since the
//! proof (finalize). Both are estimated against the latest L1 block timestamp
//! rather than the local clock, so a devnet with a skewed clock still agrees
//! with what the portal will accept.

use crate::types::WithdrawalHash;
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::BlockNumberOrTag;
use binding::opstack::{IL2OutputOracle, IOptimismPortal};
use eyre::{eyre, Result};

/// Output submission cadence of the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputCadence {
    /// L2 blocks between consecutive outputs
    pub submission_interval: u64,
    /// Seconds per L2 block
    pub l2_block_time: u64,
}

impl OutputCadence {
    /// Seconds between outputs, padded by 10% for proposer jitter.
    pub const fn interval_with_buffer(&self) -> u64 {
        (self.submission_interval * self.l2_block_time * 11).div_ceil(10)
    }
}

/// The most recent output the oracle holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestOutput {
    pub timestamp: u64,
    pub l2_block_number: u64,
}

/// Estimated seconds until an output covering `l2_block` is published.
pub fn seconds_to_next_output(
    now: u64,
    latest: LatestOutput,
    cadence: OutputCadence,
    l2_block: u64,
) -> u64 {
    if now < latest.timestamp || latest.l2_block_number >= l2_block {
        return 0;
    }

    let buffered = cadence.interval_with_buffer();
    if buffered == 0 || cadence.submission_interval == 0 {
        return 0;
    }

    let elapsed_blocks = l2_block - latest.l2_block_number;
    let elapsed_secs = now - latest.timestamp;
    let to_next = buffered - (elapsed_secs % buffered);

    if elapsed_blocks < cadence.submission_interval {
        to_next
    } else {
        (elapsed_blocks / cadence.submission_interval) * buffered + to_next
    }
}

/// True once the oracle holds an output at or after `l2_block`.
///
/// `latest_block_number` reports the oracle's starting block until the first
/// proposal, so an empty oracle never counts as covering anything.
pub fn is_block_covered(next_output_index: U256, latest_block_number: U256, l2_block: u64) -> bool {
    next_output_index > U256::ZERO && latest_block_number >= U256::from(l2_block)
}

/// Seconds until a withdrawal proven at `proven_at` can be finalized.
pub const fn seconds_to_finalize(now: u64, proven_at: u64, finalization_period: u64) -> u64 {
    proven_at
        .saturating_add(finalization_period)
        .saturating_sub(now)
}

/// Timestamp of the latest L1 block, used as "now" for every estimate.
pub async fn latest_l1_timestamp<P: Provider>(l1_provider: &P) -> Result<u64> {
    let block = l1_provider
        .get_block_by_number(BlockNumberOrTag::Latest)
        .await?
        .ok_or_else(|| eyre!("Latest L1 block not found"))?;
    Ok(block.header.timestamp)
}

pub async fn output_cadence<P: Provider>(l1_provider: &P, oracle: Address) -> Result<OutputCadence> {
    let oracle = IL2OutputOracle::new(oracle, l1_provider);
    let submission_interval = oracle.SUBMISSION_INTERVAL().call().await?;
    let l2_block_time = oracle.L2_BLOCK_TIME().call().await?;
    Ok(OutputCadence {
        submission_interval: submission_interval.saturating_to(),
        l2_block_time: l2_block_time.saturating_to(),
    })
}

/// Latest published output, or `None` before the proposer's first submission.
pub async fn latest_output<P: Provider>(
    l1_provider: &P,
    oracle: Address,
) -> Result<Option<LatestOutput>> {
    let oracle = IL2OutputOracle::new(oracle, l1_provider);
    let next_index = oracle.nextOutputIndex().call().await?;
    if next_index == U256::ZERO {
        return Ok(None);
    }

    let index = oracle.latestOutputIndex().call().await?;
    let output = oracle.getL2Output(index).call().await?;
    Ok(Some(LatestOutput {
        timestamp: u64::try_from(output.timestamp).unwrap_or(u64::MAX),
        l2_block_number: u64::try_from(output.l2BlockNumber).unwrap_or(u64::MAX),
    }))
}

pub async fn finalization_period<P: Provider>(l1_provider: &P, oracle: Address) -> Result<u64> {
    let oracle = IL2OutputOracle::new(oracle, l1_provider);
    let period = oracle.FINALIZATION_PERIOD_SECONDS().call().await?;
    Ok(period.saturating_to())
}

/// Estimated seconds until `l2_block` becomes provable.
///
/// Before the first output exists there is nothing to extrapolate from, so
/// one buffered interval is returned.
pub async fn time_to_prove<P: Provider>(l1_provider: &P, oracle: Address, l2_block: u64) -> Result<u64> {
    let cadence = output_cadence(l1_provider, oracle).await?;
    let Some(latest) = latest_output(l1_provider, oracle).await? else {
        return Ok(cadence.interval_with_buffer());
    };
    let now = latest_l1_timestamp(l1_provider).await?;
    Ok(seconds_to_next_output(now, latest, cadence, l2_block))
}

/// Seconds until a proven withdrawal can be finalized.
///
/// Fails if the withdrawal has not been proven.
pub async fn time_to_finalize<P: Provider>(
    l1_provider: &P,
    portal: Address,
    oracle: Address,
    withdrawal_hash: WithdrawalHash,
) -> Result<u64> {
    let portal = IOptimismPortal::new(portal, l1_provider);
    let proven = portal.provenWithdrawals(withdrawal_hash).call().await?;
    if proven.timestamp == 0 {
        eyre::bail!("Withdrawal {} has not been proven", withdrawal_hash);
    }

    let period = finalization_period(l1_provider, oracle).await?;
    let now = latest_l1_timestamp(l1_provider).await?;
    let proven_at = u64::try_from(proven.timestamp).unwrap_or(u64::MAX);
    Ok(seconds_to_finalize(now, proven_at, period))
}
