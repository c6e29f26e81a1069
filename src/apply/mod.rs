mod compare;
mod execute;
mod find;
mod pair;
mod plan;
mod wait;

pub use compare::compare;
pub use execute::{execute_plan, PlanConfig, Report};
pub use find::{filter_labeled, find_observed, namespaces};
pub use pair::{pair_objects, ObjectPair, PairCriteria};
pub use plan::{generate_plan, Step};
pub use wait::{wait_for_deletion, WaitConfig};

use crate::{
    cluster::{self, Cluster},
    kubemodel::{ObjectId, ObjectKind, WorkloadKind, WorkloadObject},
};
use std::{
    fmt::{self, Display},
    time::Duration,
};
use thiserror::Error;

/// Cluster call, which may fail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

fn format_candidates(candidates: &[ObjectId]) -> String {
    candidates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("unsupported object kind: {0}")]
    UnsupportedKind(ObjectKind),
    #[error("{desired} can't be paired unambiguously, conflicts with: {}", format_candidates(.candidates))]
    AmbiguousPairing {
        desired: ObjectId,
        candidates: Vec<ObjectId>,
    },
    #[error("failed to {operation} {target}: {source}")]
    ClusterOperationFailed {
        operation: Operation,
        target: String,
        #[source]
        source: cluster::Error,
    },
    #[error("{object} was not deleted in {timeout:?}")]
    DeletionTimeout { object: ObjectId, timeout: Duration },
}
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    fn cluster(operation: Operation, target: impl Display, source: cluster::Error) -> Self {
        Self::ClusterOperationFailed {
            operation,
            target: target.to_string(),
            source,
        }
    }
}

/// Check manifest kind against accepted kinds table
pub fn validate_kind(kind: &ObjectKind) -> Result<WorkloadKind> {
    kind.workload_kind()
        .ok_or_else(|| Error::UnsupportedKind(kind.clone()))
}

pub struct ReconcileOptions {
    /// Label key, used for pairing desired objects with observed
    pub label: String,
    /// Delete observed objects without desired counterpart
    pub prune: bool,
}

/// Converge objects labeled with `options.label` to `desired` state
pub async fn reconcile<C: Cluster + ?Sized>(
    desired: Vec<WorkloadObject>,
    options: &ReconcileOptions,
    config: &PlanConfig<'_, C>,
) -> Result<Report> {
    let desired = filter_labeled(desired, &options.label);
    if desired.iter().any(|d| d.namespace().is_empty()) {
        log::warn!("Some objects have no namespace, they will be looked up in empty namespace");
    }
    let namespaces = namespaces(&desired);
    log::info!(
        "Looking for deployed objects in {} namespace(s)",
        namespaces.len()
    );

    let observed = find_observed(config.cluster, &namespaces, &options.label).await?;
    log::info!(
        "Found {} desired and {} deployed objects",
        desired.len(),
        observed.len()
    );

    let pairs = pair_objects(
        &desired,
        &observed,
        &PairCriteria {
            label: &options.label,
            prune: options.prune,
        },
    )?;
    let plan = generate_plan(&pairs);
    execute_plan(&plan, config).await
}
