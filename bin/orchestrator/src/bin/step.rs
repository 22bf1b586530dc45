//! CLI tool to run individual harness steps against the local devnet.
//!
//! Every stage of a withdrawal can be driven on its own, addressed by the
//! initiating L2 transaction hash and the withdrawal index in it:
//! - `deploy`: Deploy Multicall3, the Ton token or FastWithdraw and record it
//! - `deposit`: Deposit ETH (or a token) from L1 to L2
//! - `withdraw`: Initiate an L2→L1 withdrawal
//! - `prove` / `finalize`: Prove or finalize an initiated withdrawal
//! - `status`: Show the lifecycle status of one or all pending withdrawals
//! - `request-fast-withdraw` / `fund`: Exercise the FastWithdraw contract
//! - `e2e`: Run a full withdrawal flow

use action::{
    deploy::{Artifact, Deploy, DeployAction, DeployTarget},
    deposit::{DepositAction, DepositConfig, DepositKind},
    fast_withdraw::{FastWithdraw, FastWithdrawAction, FastWithdrawAsset},
    transfer::{Asset, Transfer, TransferAction},
    withdraw::{InitiateAction, Withdraw, WithdrawKind},
    Action,
};
use alloy_primitives::{
    utils::{format_ether, parse_ether},
    Address, Bytes, TxHash, U256,
};
use alloy_provider::Provider;
use alloy_rpc_types_eth::BlockNumberOrTag;
use clap::{Parser, Subcommand};
use config::ContractRole;
use messenger::MessengerAdapter;
use orchestrator::{
    config::Config,
    init_tracing,
    lifecycle::{Account, RunRequest, WithdrawalOrchestrator},
    metrics::install_prometheus_exporter,
    pending_counts, KeySource,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "step")]
#[command(about = "Run individual bridge harness steps against the local devnet")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Private key for signing transactions (hex string, with or without 0x prefix)
    #[arg(short = 'k', long, env = "PRIVATE_KEY")]
    private_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deploy a contract on L1 and record it in the deployment address book
    Deploy {
        #[command(subcommand)]
        target: DeployCommand,

        /// Artifact JSON; derived from the artifacts directory when unset
        #[arg(long, global = true)]
        artifact: Option<PathBuf>,

        /// Deploy again even if the recorded contract exists
        #[arg(long, global = true)]
        force: bool,
    },

    /// Deposit ETH, or a token when `--l1-token` is set, from L1 to L2
    Deposit {
        /// Amount in ether units
        #[arg(long, default_value = "1")]
        amount: String,
        /// Recipient on L2; the depositor when unset
        #[arg(long)]
        to: Option<Address>,
        #[arg(long, requires = "l2_token")]
        l1_token: Option<Address>,
        #[arg(long, requires = "l1_token")]
        l2_token: Option<Address>,
        /// Gas limit of the L2 execution
        #[arg(long, default_value_t = 100_000)]
        gas_limit: u32,
    },

    /// Initiate an L2→L1 withdrawal of ETH, or of a bridged token
    Withdraw {
        /// Amount in ether units
        #[arg(long, default_value = "1")]
        amount: String,
        /// Recipient on L1; the withdrawer when unset
        #[arg(long)]
        to: Option<Address>,
        /// Bridged token on L2
        #[arg(long)]
        l2_token: Option<Address>,
    },

    /// Prove a withdrawal on L1
    Prove {
        #[arg(long)]
        tx_hash: TxHash,
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Wait for an output covering the withdrawal first
        #[arg(long)]
        wait: bool,
    },

    /// Finalize a proven withdrawal on L1
    Finalize {
        #[arg(long)]
        tx_hash: TxHash,
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Wait for the finalization period first
        #[arg(long)]
        wait: bool,
    },

    /// Show the status of a withdrawal, or of all pending withdrawals
    Status {
        #[arg(long)]
        tx_hash: Option<TxHash>,
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// First L2 block scanned for pending withdrawals
        #[arg(long, default_value_t = 0)]
        from_block: u64,
        /// Only withdrawals sent by this address
        #[arg(long)]
        sender: Option<Address>,
    },

    /// Ask the FastWithdraw contract to pay out a proven withdrawal
    RequestFastWithdraw {
        #[arg(long)]
        tx_hash: TxHash,
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Request the token payout instead of ETH
        #[arg(long)]
        erc20: bool,
    },

    /// Fund the FastWithdraw contract from the deployer
    Fund {
        /// Amount in ether units
        #[arg(long)]
        amount: String,
        /// Token on L1; ETH when unset
        #[arg(long)]
        token: Option<Address>,
    },

    /// Run one withdrawal through every stage
    E2e,
}

#[derive(Subcommand, Clone, Copy)]
enum DeployCommand {
    Multicall3,
    Token,
    FastWithdraw,
}

fn parse_amount(amount: &str) -> eyre::Result<U256> {
    parse_ether(amount).map_err(|e| eyre::eyre!("Invalid amount {amount:?}: {e}"))
}

fn role_account<P>(
    cli: &Cli,
    index: usize,
    chain_id: u64,
    provider: P,
) -> eyre::Result<Account>
where
    P: Provider + Clone + 'static,
{
    KeySource::resolve(cli.private_key.as_deref(), index).account(chain_id, provider)
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_file(&cli.config)?;
    init_tracing(config.log.json);

    if let Some(port) = config.metrics_port {
        install_prometheus_exporter(port)?;
        info!(port, "Prometheus exporter listening");
    }

    let network = config.network_config();
    let contracts = config.l1_contracts()?;
    let (l1_chain, l2_chain) = (network.l1.chain_id, network.l2.chain_id);

    info!("Loaded config:");
    info!("  L1: {} (chain {})", network.l1.rpc_url, l1_chain);
    info!("  L2: {} (chain {})", network.l2.rpc_url, l2_chain);
    info!("  Portal: {}", contracts.portal);

    let l1_provider = client::create_provider(&network.l1.rpc_url)?;
    let l2_provider = client::create_provider(&network.l2.rpc_url)?;

    let orchestrator = WithdrawalOrchestrator::new(
        l1_provider.clone(),
        l2_provider.clone(),
        contracts.clone(),
        network.l2.clone(),
        config.lifecycle_settings(),
    );

    match &cli.command {
        Command::Deploy {
            target,
            artifact,
            force,
        } => {
            let target = match target {
                DeployCommand::Multicall3 => DeployTarget::Multicall3,
                DeployCommand::Token => DeployTarget::ton(),
                DeployCommand::FastWithdraw => DeployTarget::FastWithdraw {
                    portal: contracts.portal,
                    l2_output_oracle: contracts.l2_output_oracle,
                    l1_messenger: contracts.l1_cross_domain_messenger,
                    l2_messenger: network.l2.cross_domain_messenger,
                    l1_bridge: contracts.l1_standard_bridge,
                    l2_bridge: network.l2.standard_bridge,
                },
            };
            info!("Running: deploy {}", target.name());

            let path = artifact
                .clone()
                .unwrap_or_else(|| config.artifact_path(target.artifact_name()));
            let deployer = role_account(&cli, config.accounts.deployer, l1_chain, l1_provider.clone())?;
            let mut action = DeployAction::new(
                l1_provider.clone(),
                deployer.signer,
                Deploy {
                    target,
                    artifact: Artifact::load(&path)?,
                    address_book: config.deploy_output.clone(),
                    from: deployer.address,
                },
            );

            if !force && action.is_completed().await? {
                info!("Contract already deployed, pass --force to redeploy");
                return Ok(());
            }

            let result = action.execute().await?;
            info!(
                address = ?action.deployed(),
                tx_hash = %result.tx_hash,
                book = %config.deploy_output.display(),
                "Step completed: deploy"
            );
        }
        Command::Deposit {
            amount,
            to,
            l1_token,
            l2_token,
            gas_limit,
        } => {
            info!("Running: deposit");

            let depositor = role_account(&cli, config.accounts.withdrawer, l1_chain, l1_provider.clone())?;
            let kind = match (l1_token, l2_token) {
                (Some(l1_token), Some(l2_token)) => DepositKind::Erc20 {
                    l1_bridge: contracts.l1_standard_bridge,
                    l1_token: *l1_token,
                    l2_token: *l2_token,
                },
                _ => DepositKind::Eth {
                    portal: contracts.portal,
                },
            };
            let mut action = DepositAction::new(
                l1_provider.clone(),
                depositor.signer,
                DepositConfig {
                    kind,
                    from: depositor.address,
                    to: to.unwrap_or(depositor.address),
                    amount: parse_amount(amount)?,
                    gas_limit: *gas_limit,
                    data: Bytes::new(),
                    tx_hash: None,
                },
            );
            info!(action = %action.description(), "Depositing");

            let result = action.execute().await?;
            orchestrator.metrics().record_deposit();
            info!(tx_hash = %result.tx_hash, "Step completed: deposit");
        }
        Command::Withdraw {
            amount,
            to,
            l2_token,
        } => {
            info!("Running: withdraw");

            let withdrawer = role_account(&cli, config.accounts.withdrawer, l2_chain, l2_provider.clone())?;
            let to = to.unwrap_or(withdrawer.address);
            let amount = parse_amount(amount)?;

            let (withdrawal, result) = match l2_token {
                None => orchestrator.initiate(&withdrawer, to, amount).await?,
                Some(l2_token) => {
                    let mut action = InitiateAction::new(
                        l2_provider.clone(),
                        withdrawer.signer.clone(),
                        Withdraw {
                            kind: WithdrawKind::Erc20 {
                                l2_bridge: network.l2.standard_bridge,
                                l2_token: *l2_token,
                            },
                            from: withdrawer.address,
                            to,
                            amount,
                            min_gas_limit: config.withdrawal.min_gas_limit,
                            data: Bytes::new(),
                            tx_hash: None,
                        },
                    );
                    let result = action.execute().await?;
                    let withdrawal = action.withdrawal().cloned().ok_or_else(|| {
                        eyre::eyre!("Transaction {} initiated no withdrawal", result.tx_hash)
                    })?;
                    (withdrawal, result)
                }
            };

            info!(
                tx_hash = %result.tx_hash,
                withdrawal_hash = %withdrawal.hash,
                l2_block = withdrawal.l2_block,
                "Step completed: withdraw"
            );
        }
        Command::Prove {
            tx_hash,
            index,
            wait,
        } => {
            info!("Running: prove");

            if *wait {
                let withdrawal = orchestrator
                    .messenger()
                    .to_low_level_message(*tx_hash, *index)
                    .await?;
                orchestrator.wait_until_provable(&withdrawal).await?;
            }

            let prover = role_account(&cli, config.accounts.prover, l1_chain, l1_provider.clone())?;
            let (result, proof) = match orchestrator.settings().prove_retry {
                Some(retry) => {
                    orchestrator
                        .prove_with_retry(&prover, *tx_hash, *index, retry)
                        .await?
                }
                None => orchestrator.prove(&prover, *tx_hash, *index).await?,
            };

            info!(
                tx_hash = %result.tx_hash,
                l2_output_index = %proof.l2_output_index,
                "Step completed: prove"
            );
        }
        Command::Finalize {
            tx_hash,
            index,
            wait,
        } => {
            info!("Running: finalize");

            if *wait {
                let withdrawal = orchestrator
                    .messenger()
                    .to_low_level_message(*tx_hash, *index)
                    .await?;
                orchestrator.wait_until_finalizable(withdrawal.hash).await?;
            }

            let finalizer = role_account(&cli, config.accounts.finalizer, l1_chain, l1_provider.clone())?;
            let (result, route) = orchestrator.finalize(&finalizer, *tx_hash, *index).await?;

            info!(
                tx_hash = %result.tx_hash,
                route = route.name(),
                fee = %format_ether(result.fee),
                "Step completed: finalize"
            );
        }
        Command::Status {
            tx_hash,
            index,
            from_block,
            sender,
        } => {
            let messenger = orchestrator.messenger();
            match tx_hash {
                Some(tx_hash) => {
                    let status = messenger.message_status(*tx_hash, *index).await?;
                    info!(tx_hash = %tx_hash, index, status = %status, "Message status");
                }
                None => {
                    let pending = messenger
                        .state()
                        .get_pending_withdrawals(
                            BlockNumberOrTag::Number(*from_block),
                            BlockNumberOrTag::Latest,
                            *sender,
                        )
                        .await?;

                    info!(count = pending.len(), "Pending withdrawals");
                    for (status, count) in pending_counts(&pending) {
                        orchestrator
                            .metrics()
                            .set_pending_withdrawals(&status.to_string(), count);
                    }
                    for item in pending {
                        info!(
                            withdrawal_hash = %item.withdrawal.hash,
                            tx_hash = %item.withdrawal.tx_hash,
                            l2_block = item.withdrawal.l2_block,
                            value = %format_ether(item.withdrawal.request.value),
                            status = %item.status,
                            "Pending withdrawal"
                        );
                    }
                }
            }
        }
        Command::RequestFastWithdraw {
            tx_hash,
            index,
            erc20,
        } => {
            info!("Running: request-fast-withdraw");

            let fast_withdraw_address = contracts.require(ContractRole::FastWithdraw)?;
            let requester = role_account(&cli, config.accounts.finalizer, l1_chain, l1_provider.clone())?;
            let withdrawal = orchestrator
                .messenger()
                .to_low_level_message(*tx_hash, *index)
                .await?;

            let mut action = FastWithdrawAction::new(
                l1_provider.clone(),
                l2_provider.clone(),
                requester.signer,
                FastWithdraw {
                    fast_withdraw_address,
                    portal_address: contracts.portal,
                    oracle_address: contracts.l2_output_oracle,
                    message_passer_address: network.l2.message_passer,
                    asset: if *erc20 {
                        FastWithdrawAsset::Erc20
                    } else {
                        FastWithdrawAsset::Eth
                    },
                    withdrawal,
                    from: requester.address,
                },
            );

            if !action.is_ready().await? {
                eyre::bail!("Withdrawal is not proven or already finalized");
            }

            let result = action.execute().await?;
            info!(tx_hash = %result.tx_hash, "Step completed: request-fast-withdraw");
        }
        Command::Fund { amount, token } => {
            info!("Running: fund");

            let fast_withdraw_address = contracts.require(ContractRole::FastWithdraw)?;
            let funder = role_account(&cli, config.accounts.deployer, l1_chain, l1_provider.clone())?;
            let mut action = TransferAction::new(
                l1_provider.clone(),
                funder.signer,
                Transfer {
                    asset: token.map_or(Asset::Native, Asset::Erc20),
                    from: funder.address,
                    to: fast_withdraw_address,
                    amount: parse_amount(amount)?,
                    tx_hash: None,
                },
            );
            info!(action = %action.description(), "Funding FastWithdraw");

            let result = action.execute().await?;
            info!(tx_hash = %result.tx_hash, "Step completed: fund");
        }
        Command::E2e => {
            info!("Running: e2e");

            let finalizer = role_account(&cli, config.accounts.finalizer, l1_chain, l1_provider.clone())?;
            let request = RunRequest {
                withdrawer: role_account(&cli, config.accounts.withdrawer, l2_chain, l2_provider.clone())?,
                prover: role_account(&cli, config.accounts.prover, l1_chain, l1_provider.clone())?,
                to: config.withdrawal.to.unwrap_or(finalizer.address),
                amount: config.withdrawal.amount()?,
                finalizer,
            };

            let flow = orchestrator.run(&request).await?;
            info!(
                stage = %flow.stage(),
                withdrawal_hash = ?flow.withdrawal_hash(),
                route = ?flow.route.as_ref().map(|route| route.name()),
                "Step completed: e2e"
            );
        }
    }

    Ok(())
}
