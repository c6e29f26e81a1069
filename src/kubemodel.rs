use k8s_openapi::{
    api::batch::v1::{CronJob, Job},
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};

static NO_LABELS: BTreeMap<String, String> = BTreeMap::new();

/// Identifies object type, as written in manifest
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
pub struct ObjectKind {
    // batch/v1
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    // CronJob
    pub kind: String,
}

impl ObjectKind {
    /// Lookup in accepted kinds table
    pub fn workload_kind(&self) -> Option<WorkloadKind> {
        ACCEPTED_KINDS
            .iter()
            .find(|(api_version, kind, _)| *api_version == self.api_version && *kind == self.kind)
            .map(|(_, _, workload)| *workload)
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.api_version, self.kind)
    }
}

/// Kinds reconciler is able to manage
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WorkloadKind {
    Job,
    CronJob,
}

impl WorkloadKind {
    pub const ALL: [WorkloadKind; 2] = [WorkloadKind::Job, WorkloadKind::CronJob];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Job => "Job",
            Self::CronJob => "CronJob",
        }
    }
}

impl Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted (apiVersion, kind) pairs.
///
/// `batch/v1beta1` CronJobs are decoded into `batch/v1` ones, fields we care about
/// are the same in both versions.
pub static ACCEPTED_KINDS: &[(&str, &str, WorkloadKind)] = &[
    ("batch/v1", "Job", WorkloadKind::Job),
    ("batch/v1", "CronJob", WorkloadKind::CronJob),
    ("batch/v1beta1", "CronJob", WorkloadKind::CronJob),
];

/// Identifies object in cluster
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId {
    pub kind: WorkloadKind,
    pub namespace: String,
    pub name: String,
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.kind, self.name)?;
        if !self.namespace.is_empty() {
            write!(f, " in {}", self.namespace)?;
        }
        Ok(())
    }
}

/// Common metadata projection of workload
#[derive(Debug, PartialEq)]
pub struct ObjectMetadata<'a> {
    pub namespace: &'a str,
    pub name: &'a str,
    pub labels: &'a BTreeMap<String, String>,
}

/// Batch workload, either desired (from manifests) or observed (from cluster)
#[derive(Clone, Debug, PartialEq)]
pub enum WorkloadObject {
    Job(Job),
    CronJob(CronJob),
}

impl WorkloadObject {
    pub fn kind(&self) -> WorkloadKind {
        match self {
            Self::Job(_) => WorkloadKind::Job,
            Self::CronJob(_) => WorkloadKind::CronJob,
        }
    }

    pub fn meta(&self) -> &ObjectMeta {
        match self {
            Self::Job(job) => &job.metadata,
            Self::CronJob(cron_job) => &cron_job.metadata,
        }
    }

    pub fn meta_mut(&mut self) -> &mut ObjectMeta {
        match self {
            Self::Job(job) => &mut job.metadata,
            Self::CronJob(cron_job) => &mut cron_job.metadata,
        }
    }

    /// Namespace, empty if not set
    pub fn namespace(&self) -> &str {
        self.meta().namespace.as_deref().unwrap_or("")
    }

    pub fn name(&self) -> &str {
        self.meta().name.as_deref().unwrap_or("")
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        self.meta().labels.as_ref().unwrap_or(&NO_LABELS)
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels().get(key).map(String::as_str)
    }

    pub fn metadata(&self) -> ObjectMetadata<'_> {
        ObjectMetadata {
            namespace: self.namespace(),
            name: self.name(),
            labels: self.labels(),
        }
    }

    pub fn id(&self) -> ObjectId {
        ObjectId {
            kind: self.kind(),
            namespace: self.namespace().to_owned(),
            name: self.name().to_owned(),
        }
    }

    /// Is this object created by some CronJob
    pub fn is_owned_by_cron_job(&self) -> bool {
        self.meta()
            .owner_references
            .iter()
            .flatten()
            .any(|owner| owner.kind == "CronJob")
    }

    /// Copy without fields populated by apiserver, suitable for create call
    pub fn without_server_fields(&self) -> Self {
        let mut out = self.clone();
        let meta = out.meta_mut();
        meta.uid = None;
        meta.resource_version = None;
        meta.creation_timestamp = None;
        meta.deletion_timestamp = None;
        meta.generation = None;
        meta.managed_fields = None;
        match &mut out {
            Self::Job(job) => job.status = None,
            Self::CronJob(cron_job) => cron_job.status = None,
        }
        out
    }
}

impl Display for WorkloadObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}
