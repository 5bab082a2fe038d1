//! # whisk-deploy
//!
//! Command line entry point. Runs against the in-process
//! [`LocalPlatform`], so a whole deploy or remove can be rehearsed without
//! a network:
//!
//! ```bash
//! RUST_LOG=info whisk-deploy deploy --config serverless.yml
//! whisk-deploy package --config serverless.yml > resources.json
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};
use whisk_deploy::compile::{compile, compile_function};
use whisk_deploy::deploy::{CliBindingTool, Deployer};
use whisk_deploy::info::info;
use whisk_deploy::manifest::Manifest;
use whisk_deploy::remove::{RemovalPlan, Remover};
use whisk_platform::tracing::setup_tracing;
use whisk_platform::LocalPlatform;

const LOCAL_NAMESPACE: &str = "guest";

#[derive(Parser)]
#[command(name = "whisk-deploy")]
#[command(about = "Deploy serverless functions, triggers, rules and routes", long_about = None)]
#[command(version)]
struct Cli {
    /// Service manifest
    #[arg(short, long, global = true, default_value = "serverless.yml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile and create every resource of the service
    Deploy,
    /// Delete every resource of the service
    Remove,
    /// Compile only and print the resources as JSON
    Package,
    /// Show what is deployed
    Info,
    /// Compile and create a single function
    DeployFunction {
        #[arg(short, long)]
        function: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();
    let cli = Cli::parse();

    let mut manifest = Manifest::from_path(&cli.config).map_err(|e| e.to_string())?;
    manifest.fill_provider_defaults(|key| std::env::var(key).ok());

    let namespace = manifest
        .provider
        .namespace
        .clone()
        .unwrap_or_else(|| LOCAL_NAMESPACE.to_string());
    let platform = LocalPlatform::new(namespace);
    info!(
        namespace = platform.namespace(),
        service = %manifest.service,
        "Using local platform"
    );

    let result = run(cli.command, &manifest, &platform).await;
    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }

    platform.shutdown().await?;
    result
}

async fn run(command: Command, manifest: &Manifest, platform: &LocalPlatform) -> Result<(), String> {
    match command {
        Command::Deploy => {
            let resources = compile(manifest).map_err(|e| e.to_string())?;
            let binder = CliBindingTool::new();
            Deployer::new(platform, &binder)
                .deploy(&resources)
                .await
                .map_err(|e| e.to_string())
        }
        Command::Remove => {
            let plan = RemovalPlan::from_manifest(manifest).map_err(|e| e.to_string())?;
            let report = Remover::new(platform).remove(&plan).await;
            if !report.is_clean() {
                warn!(failures = report.failures.len(), "Some resources could not be removed");
            }
            Ok(())
        }
        Command::Package => {
            let resources = compile(manifest).map_err(|e| e.to_string())?;
            println!("{}", resources.to_pretty_json().map_err(|e| e.to_string())?);
            Ok(())
        }
        Command::Info => {
            let report = info(platform, manifest).await.map_err(|e| e.to_string())?;
            println!("{}", report);
            Ok(())
        }
        Command::DeployFunction { function } => {
            let action = compile_function(manifest, &function).map_err(|e| e.to_string())?;
            let binder = CliBindingTool::new();
            Deployer::new(platform, &binder)
                .deploy_function(&action)
                .await
                .map_err(|e| e.to_string())?;
            info!(function = %function, "Function deployed");
            Ok(())
        }
    }
}
