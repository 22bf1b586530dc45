//! Withdrawal lifecycle orchestration.
//!
//! A withdrawal moves through two independently clocked chains:
//!
//! 1. initiate on L2
//! 2. wait until an output covering the withdrawal block is published
//! 3. prove on L1
//! 4. wait out the finalization period
//! 5. finalize on L1, on the portal or as a replay on the L1 messenger
//!
//! Waits are estimates. An early proof or finalization reverts on chain and
//! the error is returned to the caller; only proving can opt into retries.

use crate::metrics::Metrics;
use action::{
    finalize::{Finalize, FinalizeAction},
    prove::{Prove, ProveAction},
    withdraw::{InitiateAction, Withdraw, WithdrawKind},
    Action, SignerFn,
};
use alloy_primitives::{Address, Bytes, TxHash, U256};
use alloy_provider::Provider;
use config::{L1Contracts, L2Config};
use eyre::WrapErr;
use messenger::{
    resolve_route, FinalizationRoute, MessageDirection, MessengerAdapter, OpMessenger, RouteError,
};
use std::{
    fmt,
    future::Future,
    time::{Duration, Instant},
};
use tokio_retry::{strategy::FixedInterval, Retry};
use tracing::{info, warn};
use withdrawal::{
    hash::compute_withdrawal_hash, proof::WithdrawalProof, InitiatedWithdrawal, MessageStatus,
    WithdrawalHash,
};

/// Stage of a single withdrawal flow. Stages only move forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LifecycleStage {
    #[default]
    Created,
    Initiated,
    AwaitingProof,
    Proven,
    AwaitingFinalization,
    Finalized,
    FinalizedViaReplay,
}

impl LifecycleStage {
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Initiated)
                | (Self::Initiated, Self::AwaitingProof)
                | (Self::AwaitingProof, Self::Proven)
                | (Self::Proven, Self::AwaitingFinalization)
                | (
                    Self::AwaitingFinalization,
                    Self::Finalized | Self::FinalizedViaReplay
                )
        )
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finalized | Self::FinalizedViaReplay)
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Initiated => "initiated",
            Self::AwaitingProof => "awaiting_proof",
            Self::Proven => "proven",
            Self::AwaitingFinalization => "awaiting_finalization",
            Self::Finalized => "finalized",
            Self::FinalizedViaReplay => "finalized_via_replay",
        };
        f.write_str(s)
    }
}

/// Record of one withdrawal flow: where it is and what it produced.
#[derive(Debug, Clone, Default)]
pub struct WithdrawalFlow {
    stage: LifecycleStage,
    pub withdrawal: Option<InitiatedWithdrawal>,
    pub initiate_tx: Option<action::Result>,
    pub proof: Option<WithdrawalProof>,
    pub prove_tx: Option<action::Result>,
    pub route: Option<FinalizationRoute>,
    pub finalize_tx: Option<action::Result>,
}

impl WithdrawalFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn stage(&self) -> LifecycleStage {
        self.stage
    }

    pub fn withdrawal_hash(&self) -> Option<WithdrawalHash> {
        self.withdrawal.as_ref().map(|w| w.hash)
    }

    /// Move to `next`, rejecting skipped or backward transitions.
    pub fn advance(&mut self, next: LifecycleStage) -> eyre::Result<()> {
        if !self.stage.can_advance_to(next) {
            eyre::bail!("Invalid lifecycle transition {} -> {}", self.stage, next);
        }
        self.stage = next;
        Ok(())
    }

    pub fn record_initiated(
        &mut self,
        withdrawal: InitiatedWithdrawal,
        tx: action::Result,
    ) -> eyre::Result<()> {
        self.advance(LifecycleStage::Initiated)?;
        self.withdrawal = Some(withdrawal);
        self.initiate_tx = Some(tx);
        Ok(())
    }

    pub fn record_proven(&mut self, tx: action::Result, proof: WithdrawalProof) -> eyre::Result<()> {
        self.advance(LifecycleStage::Proven)?;
        self.prove_tx = Some(tx);
        self.proof = Some(proof);
        Ok(())
    }

    pub fn record_finalized(
        &mut self,
        tx: action::Result,
        route: FinalizationRoute,
    ) -> eyre::Result<()> {
        let next = match route {
            FinalizationRoute::Direct(_) => LifecycleStage::Finalized,
            FinalizationRoute::Replay(_) => LifecycleStage::FinalizedViaReplay,
        };
        self.advance(next)?;
        self.finalize_tx = Some(tx);
        self.route = Some(route);
        Ok(())
    }
}

/// An account and the signer for the chain it acts on.
#[derive(Clone)]
pub struct Account {
    pub address: Address,
    pub signer: SignerFn,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Inputs of a full [`WithdrawalOrchestrator::run`].
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Initiates on L2
    pub withdrawer: Account,
    /// Submits the proof on L1
    pub prover: Account,
    /// Finalizes on L1
    pub finalizer: Account,
    /// Recipient on L1
    pub to: Address,
    pub amount: U256,
}

impl RunRequest {
    /// L1 balance increase the recipient should see once `flow` finalized.
    ///
    /// Fees of the L1 transactions the recipient signed itself (as prover or
    /// finalizer) come out of the withdrawn amount.
    pub fn expected_recipient_increase(&self, flow: &WithdrawalFlow) -> U256 {
        let fee_if_paid_by_recipient = |account: &Account, tx: &Option<action::Result>| {
            tx.as_ref()
                .filter(|_| account.address == self.to)
                .map_or(U256::ZERO, |tx| tx.fee)
        };

        self.amount
            .saturating_sub(fee_if_paid_by_recipient(&self.prover, &flow.prove_tx))
            .saturating_sub(fee_if_paid_by_recipient(&self.finalizer, &flow.finalize_tx))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProveRetry {
    /// Retries after the first attempt
    pub attempts: usize,
    pub interval: Duration,
}

#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub min_gas_limit: u32,
    pub prove_retry: Option<ProveRetry>,
    /// Status poll interval before finalizing in [`WithdrawalOrchestrator::run`]
    pub poll_interval: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            min_gas_limit: 21_000,
            prove_retry: None,
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Drives withdrawals from L2 initiation to L1 finalization.
///
/// Holds no per-flow state; several flows may run concurrently on one
/// orchestrator.
pub struct WithdrawalOrchestrator<P1, P2> {
    l1_provider: P1,
    l2_provider: P2,
    l2: L2Config,
    messenger: OpMessenger<P1, P2>,
    settings: LifecycleSettings,
    metrics: Metrics,
}

impl<P1, P2> WithdrawalOrchestrator<P1, P2>
where
    P1: Provider + Clone + 'static,
    P2: Provider + Clone + 'static,
{
    pub fn new(
        l1_provider: P1,
        l2_provider: P2,
        contracts: L1Contracts,
        l2: L2Config,
        settings: LifecycleSettings,
    ) -> Self {
        let messenger = OpMessenger::new(l1_provider.clone(), l2_provider.clone(), contracts, &l2);
        Self {
            l1_provider,
            l2_provider,
            l2,
            messenger,
            settings,
            metrics: Metrics::new(),
        }
    }

    pub const fn messenger(&self) -> &OpMessenger<P1, P2> {
        &self.messenger
    }

    pub const fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub const fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    async fn track<T>(
        &self,
        step: &'static str,
        fut: impl Future<Output = eyre::Result<T>>,
    ) -> eyre::Result<T> {
        match fut.await {
            Ok(value) => {
                self.metrics.record_step_success(step);
                Ok(value)
            }
            Err(e) => {
                self.metrics.record_step_failure(step);
                Err(e)
            }
        }
    }

    /// Withdraw `amount` of ETH from `from` on L2 to `to` on L1.
    pub async fn initiate(
        &self,
        from: &Account,
        to: Address,
        amount: U256,
    ) -> eyre::Result<(InitiatedWithdrawal, action::Result)> {
        let withdraw = Withdraw {
            kind: WithdrawKind::Native {
                message_passer: self.l2.message_passer,
            },
            from: from.address,
            to,
            amount,
            min_gas_limit: self.settings.min_gas_limit,
            data: Bytes::new(),
            tx_hash: None,
        };
        let mut action = InitiateAction::new(self.l2_provider.clone(), from.signer.clone(), withdraw);
        info!(action = %action.description(), "Initiating withdrawal");

        let result = self.track("initiate", action.execute()).await?;
        let withdrawal = action.withdrawal().cloned().ok_or_else(|| {
            eyre::eyre!("Transaction {} initiated no withdrawal", result.tx_hash)
        })?;

        self.metrics.record_withdrawal_initiated(amount);
        Ok((withdrawal, result))
    }

    /// Sleep until an output covering the withdrawal block should exist.
    ///
    /// Returns the seconds slept. The estimate is a lower bound; proving can
    /// still revert if the proposer is late.
    pub async fn wait_until_provable(&self, withdrawal: &InitiatedWithdrawal) -> eyre::Result<u64> {
        let seconds = self.messenger.time_to_prove(withdrawal.l2_block).await?;
        info!(
            withdrawal_hash = %withdrawal.hash,
            l2_block = withdrawal.l2_block,
            seconds,
            "Waiting for an output covering the withdrawal"
        );

        self.metrics.record_wait("prove", seconds);
        tokio::time::sleep(Duration::from_secs(seconds)).await;
        Ok(seconds)
    }

    /// Prove the `index`-th withdrawal of `tx_hash` on L1 from `account`.
    ///
    /// Returns the transaction summary and the proof arguments submitted.
    pub async fn prove(
        &self,
        account: &Account,
        tx_hash: TxHash,
        index: usize,
    ) -> eyre::Result<(action::Result, WithdrawalProof)> {
        if let Some(message) = self.messenger.to_cross_chain_message(tx_hash, index).await? {
            if message.direction == MessageDirection::L1ToL2 {
                return Err(RouteError::WrongDirection(message.direction).into());
            }
        }

        let withdrawal = self.messenger.to_low_level_message(tx_hash, index).await?;
        let proof = self.messenger.message_proof(&withdrawal).await?;

        let contracts = self.messenger.contracts();
        let prove = Prove {
            portal_address: contracts.portal,
            oracle_address: contracts.l2_output_oracle,
            message_passer_address: self.l2.message_passer,
            withdrawal,
            from: account.address,
        };
        let mut action = ProveAction::new(
            self.l1_provider.clone(),
            self.l2_provider.clone(),
            account.signer.clone(),
            prove,
        )
        .with_proof(proof.clone());

        self.metrics.record_prove_attempt();
        let result = self.track("prove", action.execute()).await?;
        self.metrics.record_withdrawal_proven();

        Ok((result, proof))
    }

    /// [`Self::prove`], retried at a fixed interval while it fails.
    pub async fn prove_with_retry(
        &self,
        account: &Account,
        tx_hash: TxHash,
        index: usize,
        retry: ProveRetry,
    ) -> eyre::Result<(action::Result, WithdrawalProof)> {
        let strategy = FixedInterval::new(retry.interval).take(retry.attempts);

        Retry::spawn(strategy, || async {
            self.prove(account, tx_hash, index).await.map_err(|e| {
                warn!(
                    tx_hash = %tx_hash,
                    error = %e,
                    "Proof submission failed, will retry"
                );
                e
            })
        })
        .await
    }

    /// Sleep until the finalization period of a proven withdrawal is over.
    ///
    /// Returns the seconds slept. Fails if the withdrawal is not proven.
    pub async fn wait_until_finalizable(&self, withdrawal_hash: WithdrawalHash) -> eyre::Result<u64> {
        let seconds = self.messenger.time_to_finalize(withdrawal_hash).await?;
        info!(
            withdrawal_hash = %withdrawal_hash,
            seconds,
            "Waiting for the finalization period"
        );

        self.metrics.record_wait("finalize", seconds);
        tokio::time::sleep(Duration::from_secs(seconds)).await;
        Ok(seconds)
    }

    /// Finalize the `index`-th withdrawal of `tx_hash` on L1 from `account`.
    ///
    /// A withdrawal whose relay failed before is replayed on the L1 messenger,
    /// any other goes to the portal. Finalizing twice reverts.
    pub async fn finalize(
        &self,
        account: &Account,
        tx_hash: TxHash,
        index: usize,
    ) -> eyre::Result<(action::Result, FinalizationRoute)> {
        let route = resolve_route(&self.messenger, tx_hash, index).await?;
        let withdrawal_hash = match &route {
            FinalizationRoute::Direct(tx) => compute_withdrawal_hash(tx),
            FinalizationRoute::Replay(_) => {
                self.messenger
                    .to_low_level_message(tx_hash, index)
                    .await?
                    .hash
            }
        };

        let contracts = self.messenger.contracts();
        let finalize = Finalize {
            portal_address: contracts.portal,
            oracle_address: contracts.l2_output_oracle,
            l1_messenger_address: contracts.l1_cross_domain_messenger,
            withdrawal_hash,
            route: route.clone(),
            from: account.address,
        };
        let mut action =
            FinalizeAction::new(self.l1_provider.clone(), account.signer.clone(), finalize);

        let result = self.track("finalize", action.execute()).await?;
        self.metrics.record_withdrawal_finalized(route.name());

        Ok((result, route))
    }

    /// Run one withdrawal through every stage.
    pub async fn run(&self, request: &RunRequest) -> eyre::Result<WithdrawalFlow> {
        let started = Instant::now();
        let mut flow = WithdrawalFlow::new();

        let result = self.drive(request, &mut flow).await;
        self.metrics.record_flow(result.is_ok(), started.elapsed());

        result.wrap_err_with(|| format!("Withdrawal flow stopped at stage {}", flow.stage()))?;
        Ok(flow)
    }

    async fn drive(&self, request: &RunRequest, flow: &mut WithdrawalFlow) -> eyre::Result<()> {
        let (withdrawal, tx) = self
            .initiate(&request.withdrawer, request.to, request.amount)
            .await?;
        // a native initiation emits exactly one withdrawal
        let (tx_hash, index) = (withdrawal.tx_hash, 0);
        let withdrawal_hash = withdrawal.hash;
        flow.record_initiated(withdrawal.clone(), tx)?;

        flow.advance(LifecycleStage::AwaitingProof)?;
        self.wait_until_provable(&withdrawal).await?;

        let (tx, proof) = match self.settings.prove_retry {
            Some(retry) => {
                self.prove_with_retry(&request.prover, tx_hash, index, retry)
                    .await?
            }
            None => self.prove(&request.prover, tx_hash, index).await?,
        };
        flow.record_proven(tx, proof)?;

        flow.advance(LifecycleStage::AwaitingFinalization)?;
        self.wait_until_finalizable(withdrawal_hash).await?;

        // L1 time only moves with blocks; wait for one past the window
        self.messenger
            .wait_for_message_status(
                tx_hash,
                index,
                MessageStatus::ReadyForRelay,
                self.settings.poll_interval,
            )
            .await?;

        let (tx, route) = self.finalize(&request.finalizer, tx_hash, index).await?;
        info!(
            withdrawal_hash = %withdrawal_hash,
            route = route.name(),
            tx_hash = %tx.tx_hash,
            "Withdrawal flow complete"
        );
        flow.record_finalized(tx, route)?;

        Ok(())
    }
}
