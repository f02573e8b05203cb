use std::{path::PathBuf, process, time::Duration};

use airdrop_batcher::{
    ContractEndpoint, DistributionConfig, DistributionRunner, GasBudget, Ledger, Network,
    RetryPolicy, SimulatedLedger, amount,
    config::{
        DEFAULT_CHUNK_SIZE, DEFAULT_GAS_BASE, DEFAULT_GAS_CEILING, DEFAULT_GAS_PER_PARTICIPANT,
        DEFAULT_MAX_RETRIES, DEFAULT_METHOD, DEFAULT_RETRY_MULTIPLIER,
    },
    engine,
    ingest::read_participants_from_path,
    types::{AccountId, Gas, ValidatedParticipant},
};
use clap::{Args, Parser, Subcommand};
use eyre::WrapErr;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Distributes tokens to the accounts listed in a CSV file, in gas-bounded batches.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate the input and print the batches that would be submitted, as JSON.
    Plan(DistributionArgs),
    /// Run the full distribution against an in-process simulated ledger and print the report.
    Rehearse {
        #[command(flatten)]
        args: DistributionArgs,
        /// Token amount the simulated contract reports as available, enables the balance check.
        #[arg(long, value_name = "AMOUNT")]
        available_balance: Option<String>,
    },
}

#[derive(Debug, Args)]
struct DistributionArgs {
    /// CSV file with a header row and `account,amount` columns.
    #[arg(value_name = "FILE")]
    input: PathBuf,
    /// The airdrop contract.
    #[arg(long, value_name = "ACCOUNT_ID", env = "AIRDROP_CONTRACT")]
    contract: AccountId,
    /// The contract's batch distribution method.
    #[arg(long, value_name = "METHOD", default_value = DEFAULT_METHOD)]
    method: String,
    /// The network the contract is deployed on. Only recorded in the logs, both commands run
    /// without a network connection.
    #[arg(long, value_enum, env = "NETWORK", default_value_t = Network::Testnet)]
    network: Network,
    /// Maximum number of participants per transaction.
    #[arg(long, value_name = "NUM", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
    /// Token precision. Defaults to the native token's 24 decimals.
    #[arg(long, value_name = "NUM", default_value_t = amount::NEAR_DECIMALS)]
    decimals: u32,
    /// Gas attached to every batch call regardless of its size.
    #[arg(long, value_name = "GAS", default_value_t = DEFAULT_GAS_BASE)]
    gas_base: Gas,
    /// Gas attached per participant in a batch.
    #[arg(long, value_name = "GAS", default_value_t = DEFAULT_GAS_PER_PARTICIPANT)]
    gas_per_participant: Gas,
    /// Protocol limit on gas per transaction.
    #[arg(long, value_name = "GAS", default_value_t = DEFAULT_GAS_CEILING)]
    gas_ceiling: Gas,
    /// Retries of a batch after a transient failure. Zero disables retries.
    #[arg(long, value_name = "NUM", default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: u32,
    /// Delay before the first retry.
    #[arg(long, value_name = "MILLIS", value_parser = parse_duration_millis, default_value = "500")]
    retry_delay: Duration,
    /// Factor applied to the delay after every retry.
    #[arg(long, value_name = "NUM", default_value_t = DEFAULT_RETRY_MULTIPLIER)]
    retry_multiplier: u32,
    /// Upper bound for the delay between retries.
    #[arg(long, value_name = "SECONDS", value_parser = parse_duration_secs, default_value = "30")]
    retry_max_delay: Duration,
    /// Check the contract's available balance before submitting anything.
    #[arg(long)]
    check_balance: bool,
}

impl DistributionArgs {
    fn config(&self) -> DistributionConfig {
        DistributionConfig {
            chunk_size: self.chunk_size,
            decimals: self.decimals,
            gas: GasBudget {
                base: self.gas_base,
                per_participant: self.gas_per_participant,
                ceiling: self.gas_ceiling,
            },
            retry: RetryPolicy {
                max_retries: self.max_retries,
                base_delay: self.retry_delay,
                multiplier: self.retry_multiplier,
                max_delay: self.retry_max_delay,
            },
            check_balance: self.check_balance,
        }
    }

    fn runner<L: Ledger>(&self, ledger: L) -> DistributionRunner<L> {
        let endpoint = ContractEndpoint::new(self.contract.clone()).with_method(&self.method);
        DistributionRunner::new(ledger, endpoint, self.config())
    }

    fn load(&self, config: &DistributionConfig) -> eyre::Result<Vec<ValidatedParticipant>> {
        let records = read_participants_from_path(&self.input)
            .wrap_err_with(|| format!("failed to read {}", self.input.display()))?;
        info!(
            records = records.len(),
            input = %self.input.display(),
            network = ?self.network,
            rpc_url = self.network.rpc_url(),
            "Loaded participants"
        );
        Ok(engine::prepare(records, config)?)
    }
}

async fn run(cli: Cli) -> eyre::Result<()> {
    match cli.command {
        Command::Plan(args) => {
            let config = args.config();
            let participants = args.load(&config)?;
            let plan = engine::plan(&participants, &config)?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Command::Rehearse { mut args, available_balance } => {
            let mut ledger = SimulatedLedger::new();
            if let Some(balance) = available_balance {
                let balance = amount::convert(&balance, args.decimals)
                    .wrap_err("invalid --available-balance")?;
                ledger = ledger.with_available_balance(balance);
                args.check_balance = true;
            }

            let cancel = CancellationToken::new();
            tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("Interrupt received, stopping after the current batch");
                        cancel.cancel();
                    }
                }
            });

            let runner = args.runner(ledger).with_cancellation(cancel);
            let participants = args.load(runner.config())?;
            let report = runner.run(&participants).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if !report.completed() {
                eyre::bail!(
                    "distribution incomplete: {} of {} batches confirmed",
                    report.succeeded().count(),
                    report.total_batches()
                );
            }
        }
    }
    Ok(())
}

fn parse_duration_millis(arg: &str) -> Result<Duration, std::num::ParseIntError> {
    arg.parse().map(Duration::from_millis)
}

fn parse_duration_secs(arg: &str) -> Result<Duration, std::num::ParseIntError> {
    arg.parse().map(Duration::from_secs)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    if let Err(err) = run(Cli::parse()).await {
        eprintln!("Error: {err:?}");
        process::exit(1);
    }
}
