//! In-memory cluster, records every call made to it

use super::{Cluster, Error, Propagation, Result};
use crate::kubemodel::{ObjectId, WorkloadKind, WorkloadObject};
use async_trait::async_trait;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Mutex,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    List(WorkloadKind, String),
    Get(ObjectId),
    Create(ObjectId),
    Update(ObjectId),
    Delete(ObjectId, Propagation),
}

#[derive(Default)]
struct State {
    objects: BTreeMap<ObjectId, WorkloadObject>,
    /// Deleted objects, which are still visible for given number of gets
    terminating: BTreeMap<ObjectId, usize>,
    calls: Vec<Call>,
}

#[derive(Default)]
pub struct FakeCluster {
    state: Mutex<State>,
    /// How many gets deleted object stays visible for
    deletion_lag: usize,
    /// Objects, which never disappear after delete
    stuck: BTreeSet<ObjectId>,
    /// Names, create of which fails
    reject_create: BTreeSet<String>,
    /// Get returns server error instead of object
    broken_get: bool,
}

impl FakeCluster {
    pub fn new(objects: impl IntoIterator<Item = WorkloadObject>) -> Self {
        let out = Self::default();
        {
            let mut state = out.state.lock().unwrap();
            for object in objects {
                state.objects.insert(object.id(), object);
            }
        }
        out
    }

    pub fn with_deletion_lag(mut self, gets: usize) -> Self {
        self.deletion_lag = gets;
        self
    }

    pub fn with_stuck(mut self, id: ObjectId) -> Self {
        self.stuck.insert(id);
        self
    }

    pub fn with_rejected_create(mut self, name: &str) -> Self {
        self.reject_create.insert(name.to_owned());
        self
    }

    pub fn with_broken_get(mut self) -> Self {
        self.broken_get = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls, which change cluster state
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::List(..) | Call::Get(_)))
            .collect()
    }

    pub fn object(&self, id: &ObjectId) -> Option<WorkloadObject> {
        self.state.lock().unwrap().objects.get(id).cloned()
    }
}

fn id(kind: WorkloadKind, namespace: &str, name: &str) -> ObjectId {
    ObjectId {
        kind,
        namespace: namespace.to_owned(),
        name: name.to_owned(),
    }
}

#[async_trait]
impl Cluster for FakeCluster {
    async fn list(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        label: &str,
    ) -> Result<Vec<WorkloadObject>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::List(kind, namespace.to_owned()));
        Ok(state
            .objects
            .iter()
            .filter(|(id, _)| id.kind == kind && id.namespace == namespace)
            .filter(|(_, object)| object.label(label).is_some())
            .map(|(_, object)| object.clone())
            .collect())
    }

    async fn get(&self, kind: WorkloadKind, namespace: &str, name: &str) -> Result<WorkloadObject> {
        let id = id(kind, namespace, name);
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        state.calls.push(Call::Get(id.clone()));
        if self.broken_get {
            return Err(Error::Api {
                code: 500,
                message: "etcdserver: request timed out".to_owned(),
            });
        }
        if !self.stuck.contains(&id) {
            match state.terminating.get(&id).copied() {
                Some(0) => {
                    state.terminating.remove(&id);
                    state.objects.remove(&id);
                }
                Some(left) => {
                    state.terminating.insert(id.clone(), left - 1);
                }
                None => {}
            }
        }
        state.objects.get(&id).cloned().ok_or(Error::NotFound)
    }

    async fn create(&self, namespace: &str, object: &WorkloadObject) -> Result<()> {
        let id = id(object.kind(), namespace, object.name());
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create(id.clone()));
        if self.reject_create.contains(object.name()) {
            return Err(Error::Api {
                code: 422,
                message: "admission webhook denied the request".to_owned(),
            });
        }
        if state.objects.contains_key(&id) {
            return Err(Error::Api {
                code: 409,
                message: format!("{} already exists", id),
            });
        }
        state.objects.insert(id, object.clone());
        Ok(())
    }

    async fn update(&self, namespace: &str, object: &WorkloadObject) -> Result<()> {
        let id = id(object.kind(), namespace, object.name());
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Update(id.clone()));
        match state.objects.get_mut(&id) {
            Some(current) => {
                *current = object.clone();
                Ok(())
            }
            None => Err(Error::NotFound),
        }
    }

    async fn delete(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
        propagation: Propagation,
    ) -> Result<()> {
        let id = id(kind, namespace, name);
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete(id.clone(), propagation));
        if !state.objects.contains_key(&id) {
            return Err(Error::NotFound);
        }
        if self.deletion_lag == 0 && !self.stuck.contains(&id) {
            state.objects.remove(&id);
        } else {
            state.terminating.insert(id, self.deletion_lag);
        }
        Ok(())
    }
}
