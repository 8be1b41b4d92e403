//! kiln operator binary
//!
//! Connects to the cluster, installs the App CRD via server-side
//! apply, then runs the poll loop until killed.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, Config, CustomResourceExt};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use kiln_common::crd::App;
use kiln_common::events::KubeEventPublisher;
use kiln_operator::reconciler::Reconciler;
use kiln_operator::runner;
use kiln_operator::store::KubeStore;

const CONTROLLER_NAME: &str = "kiln-operator";

#[derive(Parser, Debug)]
#[command(name = "kiln", about = "Reconciles App sources into workloads")]
struct Cli {
    /// API server URL; when unset, in-cluster or kubeconfig settings
    /// are inferred.
    #[arg(long)]
    server: Option<String>,

    /// Seconds between reconcile cycles. Must be at least 1; a zero
    /// interval would spin the ticker.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    interval_secs: u64,

    /// Timeout applied to every individual API call. Must be at
    /// least 1.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    call_timeout_secs: u64,

    /// Print the App CRD manifest as YAML and exit.
    #[arg(long)]
    crd: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.crd {
        println!("{}", serde_yaml::to_string(&App::crd())?);
        return Ok(());
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match &cli.server {
        Some(server) => {
            let url = server
                .parse::<http::Uri>()
                .with_context(|| format!("invalid server url: {server}"))?;
            Config::new(url)
        }
        None => Config::infer()
            .await
            .context("failed to infer cluster configuration")?,
    };
    let client = Client::try_from(config).context("failed to build client")?;

    ensure_crd_installed(client.clone()).await?;

    let store = Arc::new(KubeStore::new(
        client.clone(),
        Duration::from_secs(cli.call_timeout_secs),
    ));
    let events = Arc::new(KubeEventPublisher::new(client, CONTROLLER_NAME));
    let reconciler = Arc::new(Reconciler::new(
        store.clone(),
        store.clone(),
        store.clone(),
        events,
    ));

    runner::run(reconciler, store, Duration::from_secs(cli.interval_secs)).await;
    Ok(())
}

/// Install or update the App CRD via server-side apply. Safe to run on
/// every startup; an unchanged manifest is a no-op on the server side.
async fn ensure_crd_installed(client: Client) -> anyhow::Result<()> {
    let crds: Api<CustomResourceDefinition> = Api::all(client);
    let crd = App::crd();
    let name = crd
        .metadata
        .name
        .as_deref()
        .context("generated CRD has no name")?
        .to_string();
    crds.patch(
        &name,
        &PatchParams::apply(CONTROLLER_NAME).force(),
        &Patch::Apply(&crd),
    )
    .await
    .with_context(|| format!("failed to apply CRD {name}"))?;
    info!(crd = %name, "CRD installed");
    Ok(())
}
