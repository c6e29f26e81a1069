//! Structural comparison of batch workloads.
//!
//! Only fields, which are set by manifests, are compared, so everything filled by
//! apiserver (status, defaults for fields we don't look at) is ignored.

use crate::kubemodel::WorkloadObject;
use k8s_openapi::api::{
    batch::v1::{CronJobSpec, JobSpec},
    core::v1::{Container, PodSpec, PodTemplateSpec},
};
use std::collections::{BTreeMap, BTreeSet};

/// Names of differing fields
pub type FieldSet = BTreeSet<&'static str>;

/// Returned when objects can't be compared, only replace is possible in this case
pub const KIND: &str = "kind";

/// Compare desired (`src`) object with deployed (`dst`)
pub fn compare(src: &WorkloadObject, dst: &WorkloadObject) -> FieldSet {
    let mut fields = FieldSet::new();
    match (src, dst) {
        (WorkloadObject::Job(src), WorkloadObject::Job(dst)) => compare_job_spec(
            &mut fields,
            src.spec.as_ref().unwrap_or(&JobSpec::default()),
            dst.spec.as_ref().unwrap_or(&JobSpec::default()),
        ),
        (WorkloadObject::CronJob(src), WorkloadObject::CronJob(dst)) => compare_cron_job_spec(
            &mut fields,
            src.spec.as_ref().unwrap_or(&CronJobSpec::default()),
            dst.spec.as_ref().unwrap_or(&CronJobSpec::default()),
        ),
        _ => {
            fields.insert(KIND);
        }
    }
    fields
}

/// Unset values are only equal to unset
fn compare_optional<T: PartialEq>(
    fields: &mut FieldSet,
    name: &'static str,
    src: &Option<T>,
    dst: &Option<T>,
) {
    if src != dst {
        fields.insert(name);
    }
}

fn compare_cron_job_spec(fields: &mut FieldSet, src: &CronJobSpec, dst: &CronJobSpec) {
    if src.schedule != dst.schedule {
        fields.insert("schedule");
    }
    if src.concurrency_policy.as_deref().unwrap_or_default()
        != dst.concurrency_policy.as_deref().unwrap_or_default()
    {
        fields.insert("concurrencyPolicy");
    }
    compare_optional(fields, "suspend", &src.suspend, &dst.suspend);
    compare_optional(
        fields,
        "successfulJobsHistoryLimit",
        &src.successful_jobs_history_limit,
        &dst.successful_jobs_history_limit,
    );
    compare_optional(
        fields,
        "failedJobsHistoryLimit",
        &src.failed_jobs_history_limit,
        &dst.failed_jobs_history_limit,
    );

    compare_job_spec(
        fields,
        src.job_template.spec.as_ref().unwrap_or(&JobSpec::default()),
        dst.job_template.spec.as_ref().unwrap_or(&JobSpec::default()),
    );
}

fn compare_job_spec(fields: &mut FieldSet, src: &JobSpec, dst: &JobSpec) {
    compare_optional(
        fields,
        "activeDeadlineSeconds",
        &src.active_deadline_seconds,
        &dst.active_deadline_seconds,
    );
    compare_pod_template(fields, &src.template, &dst.template);
}

fn compare_pod_template(fields: &mut FieldSet, src: &PodTemplateSpec, dst: &PodTemplateSpec) {
    compare_pod_spec(
        fields,
        src.spec.as_ref().unwrap_or(&PodSpec::default()),
        dst.spec.as_ref().unwrap_or(&PodSpec::default()),
    )
}

fn compare_pod_spec(fields: &mut FieldSet, src: &PodSpec, dst: &PodSpec) {
    if src.restart_policy.as_deref().unwrap_or_default()
        != dst.restart_policy.as_deref().unwrap_or_default()
    {
        fields.insert("restartPolicy");
    }
    compare_optional(
        fields,
        "terminationGracePeriodSeconds",
        &src.termination_grace_period_seconds,
        &dst.termination_grace_period_seconds,
    );
    compare_optional(
        fields,
        "activeDeadlineSeconds",
        &src.active_deadline_seconds,
        &dst.active_deadline_seconds,
    );

    let no_selector = BTreeMap::new();
    if !compare_node_selector(
        src.node_selector.as_ref().unwrap_or(&no_selector),
        dst.node_selector.as_ref().unwrap_or(&no_selector),
    )
    .is_empty()
    {
        fields.insert("nodeSelector");
    }

    if containers_differ(&src.containers, &dst.containers) {
        fields.insert("containers");
    }
}

/// Keys of `src` selector, which are missing or have other value in `dst`.
///
/// Keys only present in `dst` are not reported.
fn compare_node_selector<'s>(
    src: &'s BTreeMap<String, String>,
    dst: &BTreeMap<String, String>,
) -> Vec<&'s str> {
    src.iter()
        .filter(|(key, value)| dst.get(*key) != Some(*value))
        .map(|(key, _)| key.as_str())
        .collect()
}

fn joined(args: &Option<Vec<String>>) -> String {
    args.as_deref().unwrap_or_default().join(" ")
}

fn serialized_env(container: &Container) -> Option<String> {
    serde_json::to_string(container.env.as_deref().unwrap_or_default()).ok()
}

fn container_differs(src: &Container, dst: &Container) -> bool {
    src.image != dst.image
        || src.working_dir != dst.working_dir
        || joined(&src.command) != joined(&dst.command)
        || joined(&src.args) != joined(&dst.args)
        || serialized_env(src) != serialized_env(dst)
}

/// Containers are matched by name, any difference marks whole list as changed
fn containers_differ(src: &[Container], dst: &[Container]) -> bool {
    if src.len() != dst.len() {
        return true;
    }
    src.iter().any(|src| {
        match dst.iter().find(|dst| dst.name == src.name) {
            Some(dst) => container_differs(src, dst),
            None => true,
        }
    })
}
