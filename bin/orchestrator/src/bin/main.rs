use alloy_primitives::utils::format_ether;
use balance::BalanceMonitor;
use clap::Parser;
use orchestrator::{
    check_native_balance,
    config::Config,
    init_tracing,
    lifecycle::{RunRequest, WithdrawalOrchestrator},
    metrics::install_prometheus_exporter,
    role_keys,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "orchestrator")]
#[command(about = "Run one L2→L1 withdrawal through prove and finalize on the local devnet")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Private key used for every role; configured dev accounts when unset
    #[arg(short = 'k', long, env = "PRIVATE_KEY")]
    private_key: Option<String>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_file(&cli.config)?;
    init_tracing(config.log.json);

    info!("Starting Orchestrator");

    if let Some(port) = config.metrics_port {
        install_prometheus_exporter(port)?;
        info!(port, "Prometheus exporter listening");
    }

    let network = config.network_config();
    let contracts = config.l1_contracts()?;

    info!("Loaded config:");
    info!("  L1: {} (chain {})", network.l1.rpc_url, network.l1.chain_id);
    info!("  L2: {} (chain {})", network.l2.rpc_url, network.l2.chain_id);
    info!("  Portal: {}", contracts.portal);
    info!("  L2OutputOracle: {}", contracts.l2_output_oracle);
    info!("  L1CrossDomainMessenger: {}", contracts.l1_cross_domain_messenger);

    let l1_provider = client::create_provider(&network.l1.rpc_url)?;
    let l2_provider = client::create_provider(&network.l2.rpc_url)?;

    let [withdrawer, prover, finalizer] = role_keys(&config, cli.private_key.as_deref());
    let withdrawer = withdrawer.account(network.l2.chain_id, l2_provider.clone())?;
    let prover = prover.account(network.l1.chain_id, l1_provider.clone())?;
    let finalizer = finalizer.account(network.l1.chain_id, l1_provider.clone())?;

    let request = RunRequest {
        to: config.withdrawal.to.unwrap_or(finalizer.address),
        amount: config.withdrawal.amount()?,
        withdrawer,
        prover,
        finalizer,
    };

    let monitor = BalanceMonitor::new(l1_provider.clone());
    let l2_monitor = BalanceMonitor::new(l2_provider.clone());
    let before = check_native_balance(&monitor, request.to).await?;

    let orchestrator = WithdrawalOrchestrator::new(
        l1_provider,
        l2_provider,
        contracts,
        network.l2,
        config.lifecycle_settings(),
    );
    let flow = orchestrator.run(&request).await?;

    let after = check_native_balance(&monitor, request.to).await?;
    let change = before.change_to(&after)?;
    let withdrawer_l2 = check_native_balance(&l2_monitor, request.withdrawer.address).await?;
    orchestrator.metrics().set_l1_eoa_balance(after.amount);
    orchestrator.metrics().set_l2_eoa_balance(withdrawer_l2.amount);

    let finalize_fee = flow.finalize_tx.as_ref().map(|tx| tx.fee).unwrap_or_default();
    info!(
        recipient = %request.to,
        stage = %flow.stage(),
        withdrawal_hash = ?flow.withdrawal_hash(),
        before = %format_ether(before.amount),
        after = %format_ether(after.amount),
        change = ?change,
        finalize_fee = %format_ether(finalize_fee),
        "Withdrawal finalized"
    );

    Ok(())
}
