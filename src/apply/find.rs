use super::{Error, Operation, Result};
use crate::{
    cluster::Cluster,
    kubemodel::{WorkloadKind, WorkloadObject},
};
use std::collections::BTreeSet;

/// Drop objects without pairing label, they can't be matched with anything
pub fn filter_labeled(objects: Vec<WorkloadObject>, label: &str) -> Vec<WorkloadObject> {
    objects
        .into_iter()
        .filter(|object| {
            let labeled = object.label(label).is_some();
            if !labeled {
                log::warn!("{} has no {} label, skipping", object, label);
            }
            labeled
        })
        .collect()
}

/// Namespaces touched by objects, sorted and deduplicated
pub fn namespaces(objects: &[WorkloadObject]) -> Vec<String> {
    objects
        .iter()
        .map(|o| o.namespace().to_owned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Find all deployed workloads in given namespaces, which have pairing label.
///
/// Jobs spawned by CronJobs are skipped, they are managed by their parents
pub async fn find_observed<C: Cluster + ?Sized>(
    cluster: &C,
    namespaces: &[String],
    label: &str,
) -> Result<Vec<WorkloadObject>> {
    let mut out = vec![];
    for namespace in namespaces {
        for kind in WorkloadKind::ALL {
            let found = cluster.list(kind, namespace, label).await.map_err(|e| {
                Error::cluster(Operation::List, format!("{} in {:?}", kind, namespace), e)
            })?;
            log::trace!("Found {} {}(s) in {}", found.len(), kind, namespace);
            out.extend(found.into_iter().filter(|o| !o.is_owned_by_cron_job()));
        }
    }
    Ok(out)
}
