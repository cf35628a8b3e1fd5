//! zonal-vm-demo: provisions a two-VM zonal lab in Azure, then deletes it
//!
//! The run builds a resource group, network, two public IPs (one regional,
//! one zonal), two interfaces, a zonal data disk, and two zone-pinned VMs in
//! a fixed order, then tears the whole group down again.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use zonal_vm_demo::arm::{chain_is_not_found, ArmClient};
use zonal_vm_demo::naming::ResourceNames;
use zonal_vm_demo::provision::{self, ProvisionEngine, ProvisionPlan};
use zonal_vm_demo::{config, wait};

#[derive(Parser, Debug)]
#[command(name = "zonal-vm-demo")]
#[command(about = "Azure zonal VM provisioning walkthrough")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Arguments for the run command
#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Azure region to provision in
    #[arg(long, default_value = config::DEFAULT_REGION)]
    region: String,

    /// Service principal application id
    #[arg(long, env = "AZURE_CLIENT_ID", hide_env_values = true)]
    client_id: Option<String>,

    /// Service principal secret
    #[arg(long, env = "AZURE_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// AAD tenant the service principal lives in
    #[arg(long, env = "AZURE_TENANT_ID", hide_env_values = true)]
    tenant_id: Option<String>,

    /// Subscription to create the resource group under
    #[arg(long, env = "AZURE_SUBSCRIPTION_ID", hide_env_values = true)]
    subscription_id: Option<String>,

    /// Overall timeout in seconds for any single resource to settle
    #[arg(long, default_value_t = wait::DEFAULT_OPERATION_TIMEOUT_SECS)]
    operation_timeout: u64,

    /// Print the plan without issuing remote calls
    #[arg(long)]
    dry_run: bool,
}

impl From<RunArgs> for config::RunConfig {
    fn from(args: RunArgs) -> Self {
        Self {
            region: args.region,
            subscription_id: args.subscription_id,
            credentials: config::AzureCredentials {
                client_id: args.client_id,
                client_secret: args.client_secret,
                tenant_id: args.tenant_id,
            },
            dry_run: args.dry_run,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Provision the full resource set, then tear it down
    Run(RunArgs),

    /// Delete a leftover resource group by name
    Teardown {
        /// Name of the resource group to delete
        group: String,

        /// Service principal application id
        #[arg(long, env = "AZURE_CLIENT_ID", hide_env_values = true)]
        client_id: Option<String>,

        /// Service principal secret
        #[arg(long, env = "AZURE_CLIENT_SECRET", hide_env_values = true)]
        client_secret: Option<String>,

        /// AAD tenant the service principal lives in
        #[arg(long, env = "AZURE_TENANT_ID", hide_env_values = true)]
        tenant_id: Option<String>,

        /// Subscription the resource group lives under
        #[arg(long, env = "AZURE_SUBSCRIPTION_ID", hide_env_values = true)]
        subscription_id: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Run(run_args) => {
            let operation_timeout = run_args.operation_timeout;
            let run_config: config::RunConfig = run_args.into();
            handle_run(run_config, operation_timeout).await?;
        }

        Command::Teardown {
            group,
            client_id,
            client_secret,
            tenant_id,
            subscription_id,
        } => {
            let credentials = config::AzureCredentials {
                client_id,
                client_secret,
                tenant_id,
            };
            handle_teardown(group, credentials, subscription_id).await?;
        }
    }

    Ok(())
}

/// Handle the run command
async fn handle_run(run_config: config::RunConfig, operation_timeout: u64) -> Result<()> {
    let subscription_id = run_config.require_subscription()?;
    let names = ResourceNames::generate();

    info!(
        group = %names.resource_group,
        region = %run_config.region,
        dry_run = run_config.dry_run,
        "Planning provisioning run"
    );

    let plan = ProvisionPlan::build(subscription_id, &run_config.region, names)?;

    if run_config.dry_run {
        print_plan(&plan);
        return Ok(());
    }

    let wait = wait::WaitConfig {
        timeout: std::time::Duration::from_secs(operation_timeout),
        ..wait::WaitConfig::default()
    };
    let client = ArmClient::new(run_config.credentials.clone())?.with_wait_config(wait);

    let report = ProvisionEngine::new(&client).run(&plan).await;
    report.log_summary();
    report.into_result()
}

/// Print the planned steps without touching the API
fn print_plan(plan: &ProvisionPlan) {
    println!(
        "Plan for group '{}' in {} ({} steps):\n",
        plan.names.resource_group,
        plan.region,
        plan.steps.len()
    );
    println!("{:<5} {:<18} {:<28} API VERSION", "STEP", "KIND", "NAME");
    println!("{}", "-".repeat(70));
    for (index, step) in plan.steps.iter().enumerate() {
        println!(
            "{:<5} {:<18} {:<28} {}",
            index + 1,
            step.kind.label(),
            step.name,
            step.api_version,
        );
    }
    println!("\nNo remote calls were made.");
}

/// Handle the teardown command
async fn handle_teardown(
    group: String,
    credentials: config::AzureCredentials,
    subscription_id: Option<String>,
) -> Result<()> {
    let subscription_id = subscription_id.ok_or_else(|| {
        anyhow::anyhow!("AZURE_SUBSCRIPTION_ID must be set to locate the resource group")
    })?;

    let group_id = provision::resource_group_id(&subscription_id, &group);
    info!(group = %group_id, "Deleting resource group");

    let client = ArmClient::new(credentials)?;
    match client.delete_resource_group(&group_id).await {
        Ok(()) => {
            println!("Resource group '{group}' deleted.");
            Ok(())
        }
        Err(error) if chain_is_not_found(&error) => {
            println!("Resource group '{group}' does not exist, nothing to delete.");
            Ok(())
        }
        Err(error) => Err(error),
    }
}
