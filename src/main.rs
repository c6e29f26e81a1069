mod apply;
mod cluster;
mod kubemodel;
mod manifest;

use anyhow::{anyhow, Context, Result};
use apply::{PlanConfig, ReconcileOptions, WaitConfig};
use clap::{ArgAction, CommandFactory, Parser};
use cluster::KubeCluster;
use std::{path::PathBuf, time::Duration};

/// Converge labeled Jobs and CronJobs in cluster to manifests
#[derive(Parser)]
#[command(version, author = "Lach")]
struct Opts {
    /// Label key, used to match manifests with deployed objects
    #[arg(long)]
    label: Option<String>,
    /// Apply changes, only print plan otherwise
    #[arg(long)]
    execute: bool,
    /// Delete deployed objects, which are no longer present in manifests
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    prune: bool,
    /// Path to kubeconfig, ~/.kube/config by default
    #[arg(long, env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,
    /// Kubeconfig context to use instead of current one
    #[arg(long)]
    context: Option<String>,
    /// Seconds between checks, whether deleted object is gone
    #[arg(long, default_value_t = 1)]
    poll_interval: u64,
    /// Seconds to wait for object deletion
    #[arg(long, default_value_t = 60)]
    deletion_timeout: u64,
    /// Manifest files, `-` to read from stdin
    files: Vec<PathBuf>,
}

fn default_kubeconfig() -> Result<PathBuf> {
    let mut path = home::home_dir().ok_or_else(|| anyhow!("failed to find home directory"))?;
    path.push(".kube");
    path.push("config");
    Ok(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts: Opts = Opts::parse();
    if opts.files.is_empty() {
        Opts::command().print_help()?;
        return Ok(());
    }
    let label = opts
        .label
        .ok_or_else(|| anyhow!("--label is required to find deployed objects"))?;

    let mut desired = manifest::load(&opts.files).context("failed to load manifests")?;
    log::info!("Loaded {} object(s) from manifests", desired.len());

    let kubeconfig = match opts.kubeconfig {
        Some(path) => path,
        None => default_kubeconfig()?,
    };
    let cluster = KubeCluster::from_kubeconfig(&kubeconfig, opts.context)
        .await
        .with_context(|| format!("failed to connect using {}", kubeconfig.display()))?;
    manifest::default_namespace(&mut desired, cluster.default_namespace());

    let config = PlanConfig {
        execute: opts.execute,
        cluster: &cluster,
        wait: WaitConfig {
            interval: Duration::from_secs(opts.poll_interval),
            timeout: Duration::from_secs(opts.deletion_timeout),
        },
    };
    let options = ReconcileOptions {
        label,
        prune: opts.prune,
    };
    apply::reconcile(desired, &options, &config).await?;
    Ok(())
}
