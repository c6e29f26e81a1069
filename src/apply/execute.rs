use super::{wait_for_deletion, Error, Operation, Result, Step, WaitConfig};
use crate::{
    cluster::{Cluster, Propagation},
    kubemodel::WorkloadObject,
};

pub struct PlanConfig<'c, C: ?Sized> {
    /// Only describe plan if false
    pub execute: bool,
    pub cluster: &'c C,
    pub wait: WaitConfig,
}

/// Number of performed (or planned, in preview mode) changes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub created: usize,
    /// Updated in place
    pub updated: usize,
    /// Deleted and created again
    pub replaced: usize,
    pub deleted: usize,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Jobs are immutable, CronJob with other name can't be updated in place
fn can_update_in_place(desired: &WorkloadObject, observed: &WorkloadObject) -> bool {
    matches!(
        (desired, observed),
        (WorkloadObject::CronJob(_), WorkloadObject::CronJob(_))
    ) && desired.name() == observed.name()
}

fn describe(step: &Step<'_>) -> String {
    match step {
        Step::Create(desired) => format!(
            "Creating {} {:?} in {:?}",
            desired.kind(),
            desired.name(),
            desired.namespace()
        ),
        Step::Update { desired, observed } if can_update_in_place(desired, observed) => format!(
            "Updating {} {:?} in {:?}",
            desired.kind(),
            desired.name(),
            desired.namespace()
        ),
        Step::Update { desired, observed } => format!(
            "Replacing {} {:?} with {} {:?} in {:?}",
            observed.kind(),
            observed.name(),
            desired.kind(),
            desired.name(),
            desired.namespace()
        ),
        Step::Delete(observed) => format!(
            "Deleting {} {:?} in {:?}",
            observed.kind(),
            observed.name(),
            observed.namespace()
        ),
    }
}

async fn create<C: Cluster + ?Sized>(cluster: &C, desired: &WorkloadObject) -> Result<()> {
    cluster
        .create(desired.namespace(), &desired.without_server_fields())
        .await
        .map_err(|e| Error::cluster(Operation::Create, desired, e))
}

/// Foreground delete, blocks until object is gone
async fn delete<C: Cluster + ?Sized>(
    cluster: &C,
    observed: &WorkloadObject,
    wait: WaitConfig,
) -> Result<()> {
    cluster
        .delete(
            observed.kind(),
            observed.namespace(),
            observed.name(),
            Propagation::Foreground,
        )
        .await
        .map_err(|e| Error::cluster(Operation::Delete, observed, e))?;
    log::debug!("Waiting for {} to be deleted", observed);
    wait_for_deletion(cluster, observed, wait).await
}

async fn update<C: Cluster + ?Sized>(
    cluster: &C,
    desired: &WorkloadObject,
    observed: &WorkloadObject,
) -> Result<()> {
    let mut replacement = desired.without_server_fields();
    replacement.meta_mut().resource_version = observed.meta().resource_version.clone();
    cluster
        .update(desired.namespace(), &replacement)
        .await
        .map_err(|e| Error::cluster(Operation::Update, desired, e))
}

/// Apply plan steps one by one, stopping at first error.
///
/// Already applied steps are not reverted on error.
pub async fn execute_plan<C: Cluster + ?Sized>(
    plan: &[Step<'_>],
    config: &PlanConfig<'_, C>,
) -> Result<Report> {
    let mut report = Report::default();
    if !config.execute && !plan.is_empty() {
        log::info!("Preview mode, no changes will be made");
    }

    for step in plan {
        let pair = step.pair();
        log::trace!(
            "{} step, desired: {:?}, observed: {:?}",
            step.action(),
            pair.desired().map(WorkloadObject::id),
            pair.observed().map(WorkloadObject::id)
        );
        log::info!("{}", describe(step));
        match *step {
            Step::Create(desired) => {
                if config.execute {
                    create(config.cluster, desired).await?;
                }
                report.created += 1;
            }
            Step::Update { desired, observed } if can_update_in_place(desired, observed) => {
                if config.execute {
                    update(config.cluster, desired, observed).await?;
                }
                report.updated += 1;
            }
            Step::Update { desired, observed } => {
                if config.execute {
                    delete(config.cluster, observed, config.wait).await?;
                    create(config.cluster, desired).await?;
                }
                report.replaced += 1;
            }
            Step::Delete(observed) => {
                log::warn!("pruning {}", observed);
                if config.execute {
                    delete(config.cluster, observed, config.wait).await?;
                }
                report.deleted += 1;
            }
        }
    }

    if plan.is_empty() {
        log::info!("Nothing to do");
    } else {
        log::info!("Finished");
    }
    Ok(report)
}
