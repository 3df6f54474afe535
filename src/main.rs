use anyhow::Result;
use clap::{Parser, Subcommand};
use kube::{api::Api, Client, CustomResourceExt};
use kustomize_operator::{
    config::OperatorConfig, dispatcher::Dispatcher, kubectl::Kubectl,
    kustomization_types::Kustomization, kustomize::Kustomize, ownership::OwnershipMerger,
    patch_pipeline::PatchPipeline, status::KubeStatusClient, status::StatusReporter,
    watch::run_watch,
};
use std::sync::Arc;
use tracing::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "kustomize-operator", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the Kustomization custom resource definition
    Export,
    /// Watch Kustomization objects and reconcile them
    Run(OperatorConfig),
}

fn init_tracing(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!("cannot listen for SIGTERM: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn run(config: OperatorConfig) -> Result<()> {
    let client = Client::try_default().await?;

    let pipeline = PatchPipeline::new(
        Arc::new(Kubectl::new(&config.kubectl_bin)),
        Arc::new(Kustomize::new(&config.kustomize_bin)),
        OwnershipMerger::new(config.controller_owner),
        config.workdir_root(),
    );
    let reporter = StatusReporter::new(Arc::new(KubeStatusClient::new(client.clone())));
    let dispatcher = Arc::new(Dispatcher::new(pipeline, reporter, &config));
    let kustomizations = Api::<Kustomization>::all(client);

    info!(
        "watching kustomizations (modify policy: {:?})",
        config.modify_policy
    );
    tokio::select! {
        _ = run_watch(kustomizations, dispatcher) => {}
        _ = shutdown_signal() => info!("received shutdown signal"),
    }
    info!("controller terminated");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Export => {
            init_tracing(false);
            info!("exporting custom resource definition");
            println!("{}", serde_yaml::to_string(&Kustomization::crd())?);
        }
        Command::Run(config) => {
            init_tracing(config.debug);
            info!("running kustomize-operator");
            run(config).await?;
        }
    }
    Ok(())
}
