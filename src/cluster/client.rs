use super::{Cluster, Propagation, Result};
use crate::kubemodel::{WorkloadKind, WorkloadObject};
use async_trait::async_trait;
use k8s_openapi::{
    api::batch::v1::{CronJob, Job},
    NamespaceResourceScope,
};
use kube::{
    api::{Api, DeleteParams, ListParams, PostParams, PropagationPolicy},
    config::{KubeConfigOptions, Kubeconfig},
    Client, Config, Resource,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt::Debug, path::Path};

/// [`Cluster`] implementation backed by kube client
pub struct KubeCluster {
    client: Client,
    default_namespace: String,
}

impl KubeCluster {
    /// Connect using kubeconfig at `path`, with current or given context
    pub async fn from_kubeconfig(path: &Path, context: Option<String>) -> Result<Self> {
        log::debug!("Loading kubeconfig from {}", path.display());
        let kubeconfig = Kubeconfig::read_from(path)?;
        let options = KubeConfigOptions {
            context,
            ..KubeConfigOptions::default()
        };
        let config = Config::from_custom_kubeconfig(kubeconfig, &options).await?;
        let default_namespace = config.default_namespace.clone();
        let client = Client::try_from(config)?;
        Ok(Self {
            client,
            default_namespace,
        })
    }

    /// Namespace of selected context, used for objects without one
    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn delete_params(propagation: Propagation) -> DeleteParams {
    DeleteParams {
        propagation_policy: Some(match propagation {
            Propagation::Foreground => PropagationPolicy::Foreground,
        }),
        ..DeleteParams::default()
    }
}

/// Bare key selector matches every value of label
fn list_params(label: &str) -> ListParams {
    ListParams::default().labels(label)
}

async fn create_in<K>(api: Api<K>, object: &K) -> Result<()>
where
    K: Resource + Clone + Debug + Serialize + DeserializeOwned,
{
    let _created: K = api.create(&PostParams::default(), object).await?;
    Ok(())
}

async fn replace_in<K>(api: Api<K>, name: &str, object: &K) -> Result<()>
where
    K: Resource + Clone + Debug + Serialize + DeserializeOwned,
{
    let _replaced: K = api.replace(name, &PostParams::default(), object).await?;
    Ok(())
}

#[async_trait]
impl Cluster for KubeCluster {
    async fn list(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        label: &str,
    ) -> Result<Vec<WorkloadObject>> {
        log::trace!("Listing {} labeled with {} in {}", kind, label, namespace);
        let params = list_params(label);
        Ok(match kind {
            WorkloadKind::Job => self
                .api::<Job>(namespace)
                .list(&params)
                .await?
                .items
                .into_iter()
                .map(WorkloadObject::Job)
                .collect(),
            WorkloadKind::CronJob => self
                .api::<CronJob>(namespace)
                .list(&params)
                .await?
                .items
                .into_iter()
                .map(WorkloadObject::CronJob)
                .collect(),
        })
    }

    async fn get(&self, kind: WorkloadKind, namespace: &str, name: &str) -> Result<WorkloadObject> {
        Ok(match kind {
            WorkloadKind::Job => WorkloadObject::Job(self.api::<Job>(namespace).get(name).await?),
            WorkloadKind::CronJob => {
                WorkloadObject::CronJob(self.api::<CronJob>(namespace).get(name).await?)
            }
        })
    }

    async fn create(&self, namespace: &str, object: &WorkloadObject) -> Result<()> {
        match object {
            WorkloadObject::Job(job) => create_in(self.api::<Job>(namespace), job).await,
            WorkloadObject::CronJob(cron_job) => {
                create_in(self.api::<CronJob>(namespace), cron_job).await
            }
        }
    }

    async fn update(&self, namespace: &str, object: &WorkloadObject) -> Result<()> {
        let name = object.name();
        match object {
            WorkloadObject::Job(job) => replace_in(self.api::<Job>(namespace), name, job).await,
            WorkloadObject::CronJob(cron_job) => {
                replace_in(self.api::<CronJob>(namespace), name, cron_job).await
            }
        }
    }

    async fn delete(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
        propagation: Propagation,
    ) -> Result<()> {
        let params = delete_params(propagation);
        // Either object in deletion or deletion status, both are fine
        match kind {
            WorkloadKind::Job => {
                self.api::<Job>(namespace).delete(name, &params).await?;
            }
            WorkloadKind::CronJob => {
                self.api::<CronJob>(namespace).delete(name, &params).await?;
            }
        }
        Ok(())
    }
}
