mod client;
#[cfg(test)]
pub mod fake;

pub use client::KubeCluster;

use crate::kubemodel::{WorkloadKind, WorkloadObject};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("object not found")]
    NotFound,
    #[error("api error {code}: {message}")]
    Api { code: u16, message: String },
    #[error("kube error: {0}")]
    Kube(kube::Error),
    #[error("kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),
}

impl From<kube::Error> for Error {
    fn from(e: kube::Error) -> Self {
        match e {
            kube::Error::Api(response) if response.code == 404 => Self::NotFound,
            kube::Error::Api(response) => Self::Api {
                code: response.code,
                message: response.message,
            },
            e => Self::Kube(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// How dependents are handled on delete
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Propagation {
    /// Dependents are removed before owner disappears
    Foreground,
}

/// Cluster operations used by reconciler, dispatched by workload kind
#[async_trait]
pub trait Cluster: Send + Sync {
    /// Objects of `kind`, which have `label` set to any value
    async fn list(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        label: &str,
    ) -> Result<Vec<WorkloadObject>>;
    /// Returns [`Error::NotFound`] if object doesn't exists
    async fn get(&self, kind: WorkloadKind, namespace: &str, name: &str) -> Result<WorkloadObject>;
    async fn create(&self, namespace: &str, object: &WorkloadObject) -> Result<()>;
    /// Replace whole object
    async fn update(&self, namespace: &str, object: &WorkloadObject) -> Result<()>;
    async fn delete(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
        propagation: Propagation,
    ) -> Result<()>;
}
