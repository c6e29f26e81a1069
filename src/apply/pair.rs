use super::{Error, Result};
use crate::kubemodel::WorkloadObject;
use std::collections::BTreeMap;

pub struct PairCriteria<'l> {
    /// Objects match if values of this label are equal
    pub label: &'l str,
    /// Emit pairs for observed objects, which have no desired counterpart
    pub prune: bool,
}

impl PairCriteria<'_> {
    fn matches(&self, desired: &WorkloadObject, observed: &WorkloadObject) -> bool {
        let desired = desired.metadata();
        let observed = observed.metadata();
        desired.labels.get(self.label) == observed.labels.get(self.label)
            && desired.namespace == observed.namespace
    }
}

/// Desired object with its deployed counterpart, at least one side is always present
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ObjectPair<'a> {
    Matched {
        desired: &'a WorkloadObject,
        observed: &'a WorkloadObject,
    },
    /// Not deployed yet
    Desired(&'a WorkloadObject),
    /// Deployed, but no longer desired
    Observed(&'a WorkloadObject),
}

impl<'a> ObjectPair<'a> {
    pub fn desired(&self) -> Option<&'a WorkloadObject> {
        match *self {
            Self::Matched { desired, .. } | Self::Desired(desired) => Some(desired),
            Self::Observed(_) => None,
        }
    }
    pub fn observed(&self) -> Option<&'a WorkloadObject> {
        match *self {
            Self::Matched { observed, .. } | Self::Observed(observed) => Some(observed),
            Self::Desired(_) => None,
        }
    }
}

/// Two desired objects with the same label value in one namespace would claim
/// the same observed object
fn check_desired_unique(desired: &[WorkloadObject], label: &str) -> Result<()> {
    let mut seen = BTreeMap::new();
    for d in desired {
        if let Some(first) = seen.insert((d.namespace(), d.label(label)), d) {
            return Err(Error::AmbiguousPairing {
                desired: d.id(),
                candidates: vec![first.id()],
            });
        }
    }
    Ok(())
}

/// Pair desired objects with observed ones.
///
/// Both inputs should only contain objects having `criteria.label`.
/// Desired objects go first in input order, then unmatched observed.
pub fn pair_objects<'a>(
    desired: &'a [WorkloadObject],
    observed: &'a [WorkloadObject],
    criteria: &PairCriteria<'_>,
) -> Result<Vec<ObjectPair<'a>>> {
    check_desired_unique(desired, criteria.label)?;

    let mut pairs = Vec::with_capacity(desired.len());
    let mut claimed = vec![false; observed.len()];

    for d in desired {
        let mut found = observed
            .iter()
            .enumerate()
            .filter(|(_, o)| criteria.matches(d, o));
        let pair = match (found.next(), found.next()) {
            (None, _) => ObjectPair::Desired(d),
            (Some((idx, o)), None) => {
                claimed[idx] = true;
                ObjectPair::Matched {
                    desired: d,
                    observed: o,
                }
            }
            (Some(first), Some(second)) => {
                let candidates = [first, second]
                    .into_iter()
                    .chain(found)
                    .map(|(_, o)| o.id())
                    .collect();
                return Err(Error::AmbiguousPairing {
                    desired: d.id(),
                    candidates,
                });
            }
        };
        pairs.push(pair);
    }

    if criteria.prune {
        pairs.extend(
            observed
                .iter()
                .zip(claimed)
                .filter(|(_, claimed)| !claimed)
                .map(|(o, _)| ObjectPair::Observed(o)),
        );
    }

    Ok(pairs)
}
