use super::{Error, Operation, Result};
use crate::{
    cluster::{self, Cluster},
    kubemodel::WorkloadObject,
};
use std::time::Duration;

#[derive(Clone, Copy, Debug)]
pub struct WaitConfig {
    /// Delay between checks
    pub interval: Duration,
    /// Give up after
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Block until deleted object disappears from cluster
///
/// First check is done immediately
pub async fn wait_for_deletion<C: Cluster + ?Sized>(
    cluster: &C,
    object: &WorkloadObject,
    config: WaitConfig,
) -> Result<()> {
    let poll = async {
        loop {
            match cluster
                .get(object.kind(), object.namespace(), object.name())
                .await
            {
                Ok(_) => {
                    log::trace!("{} still exists", object);
                    tokio::time::sleep(config.interval).await;
                }
                Err(cluster::Error::NotFound) => return Ok(()),
                Err(e) => return Err(Error::cluster(Operation::Get, object, e)),
            }
        }
    };
    match tokio::time::timeout(config.timeout, poll).await {
        Ok(result) => result,
        Err(_elapsed) => Err(Error::DeletionTimeout {
            object: object.id(),
            timeout: config.timeout,
        }),
    }
}
