// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use alloy::signers::local::PrivateKeySigner;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use deployer::artifacts::ArtifactStore;
use deployer::chain::AlloyChainClient;
use deployer::deployment::{DeploymentSequencer, deploy_package};
use deployer::error_chain;
use deployer::network::{ExplorerConfig, NetworkConfig, NetworkRegistry};
use deployer::packages;
use deployer::plan::DeploymentPlan;
use deployer::store::ManifestStore;
use deployer::verification::{
    EtherscanVerifier, VerificationReport, VerificationSequencer, verify_package,
};

const DEFAULT_PROJECTS_ROOT: &str = "projects";
const DEFAULT_VERIFY_DELAY_MS: u64 = 10_000;
const ARTIFACTS_DIR: &str = "artifacts";

#[derive(Debug, Parser)]
#[command(
    name = "deployer",
    about = "Deploy and verify the protocol's contract packages"
)]
struct Cli {
    /// Directory holding one sub-directory per package.
    #[arg(long, env = "DEPLOYER_PROJECTS_ROOT", default_value = DEFAULT_PROJECTS_ROOT)]
    projects_root: PathBuf,
    /// Network name, e.g. bscTestnet.
    #[arg(long, env = "NETWORK", global = true)]
    network: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Deploy one package and write its manifest.
    Deploy {
        package: String,
        #[arg(long, env = "DEPLOYER_RPC_URL")]
        rpc_url: String,
        #[arg(long, env = "DEPLOYER_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
    },
    /// Verify the deployed contracts of one package.
    Verify {
        package: String,
        #[command(flatten)]
        explorer: ExplorerArgs,
    },
    /// Verify every package, dependencies first.
    VerifyAll {
        #[command(flatten)]
        explorer: ExplorerArgs,
    },
    /// List configured networks.
    Networks,
}

#[derive(Debug, Args)]
struct ExplorerArgs {
    #[arg(long, env = "DEPLOYER_EXPLORER_API_KEY", hide_env_values = true)]
    api_key: String,
    /// Explorer API endpoint replacing the network's configured one.
    #[arg(long, env = "DEPLOYER_EXPLORER_API_URL")]
    explorer_api_url: Option<String>,
    /// Pause after every verification submission.
    #[arg(long, env = "DEPLOYER_VERIFY_DELAY_MS", default_value_t = DEFAULT_VERIFY_DELAY_MS)]
    verify_delay_ms: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %error_chain(err.as_ref()), "aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let registry = NetworkRegistry::builtin();
    let store = ManifestStore::new(&cli.projects_root);

    let network = match cli.command {
        Command::Networks => {
            for name in registry.names() {
                let config = registry.resolve(name)?;
                println!("{name}\t{}", config.chain_id);
            }
            return Ok(());
        }
        _ => cli
            .network
            .as_deref()
            .ok_or("no network given (use --network or NETWORK)")?,
    };
    let config = registry.resolve(network)?;

    match cli.command {
        Command::Deploy {
            package,
            rpc_url,
            private_key,
        } => {
            let plan = package_plan(&package)?;
            let signer: PrivateKeySigner = private_key.trim().parse()?;
            let artifacts = open_artifacts(&store, &plan)?;
            let client =
                AlloyChainClient::connect(&rpc_url, signer, &config.name, artifacts).await?;
            tracing::info!(deployer = %client.deployer(), package = %plan.package, "connected");

            let sequencer = DeploymentSequencer::new(client);
            let manifest = deploy_package(&sequencer, &store, &plan, &config).await?;
            for (name, address) in manifest.iter() {
                tracing::info!(name, %address, "recorded");
            }
        }
        Command::Verify { package, explorer } => {
            let plan = package_plan(&package)?;
            verify(&store, &plan, &config, &explorer).await?;
        }
        Command::VerifyAll { explorer } => {
            for package in packages::VERIFY_ALL_ORDER {
                let plan = package_plan(package)?;
                verify(&store, &plan, &config, &explorer).await?;
            }
        }
        Command::Networks => {}
    }
    Ok(())
}

async fn verify(
    store: &ManifestStore,
    plan: &DeploymentPlan,
    config: &NetworkConfig,
    explorer: &ExplorerArgs,
) -> Result<Vec<VerificationReport>, Box<dyn Error>> {
    let artifacts = open_artifacts(store, plan)?;
    let api_key = explorer.api_key.clone();
    let verifier = match &explorer.explorer_api_url {
        Some(api_url) => {
            let browser_url = config
                .explorer
                .as_ref()
                .map_or_else(|| api_url.clone(), |e| e.browser_url.clone());
            let endpoint = ExplorerConfig {
                api_url: api_url.clone(),
                browser_url,
            };
            EtherscanVerifier::new(&endpoint, api_key, artifacts)?
        }
        None => EtherscanVerifier::for_network(config, api_key, artifacts)?,
    };
    let sequencer = VerificationSequencer::new(verifier)
        .with_delay(Duration::from_millis(explorer.verify_delay_ms));

    let reports = verify_package(&sequencer, store, plan, config).await?;
    for report in &reports {
        if report.outcome.is_success() {
            tracing::info!(name = %report.name, address = %report.address, outcome = %report.outcome, "verification");
        } else {
            tracing::warn!(name = %report.name, address = %report.address, outcome = %report.outcome, "verification");
        }
    }
    Ok(reports)
}

fn package_plan(package: &str) -> Result<DeploymentPlan, String> {
    packages::plan(package).ok_or_else(|| format!("unknown package {package}"))
}

fn open_artifacts(
    store: &ManifestStore,
    plan: &DeploymentPlan,
) -> Result<ArtifactStore, Box<dyn Error>> {
    let root = store.package_dir(&plan.package).join(ARTIFACTS_DIR);
    Ok(ArtifactStore::open(root)?)
}
