use super::{compare, ObjectPair};
use crate::kubemodel::WorkloadObject;
use std::fmt::{self, Display};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// Single plan entry, pair plus action to perform on it
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step<'a> {
    Create(&'a WorkloadObject),
    Update {
        desired: &'a WorkloadObject,
        observed: &'a WorkloadObject,
    },
    Delete(&'a WorkloadObject),
}

impl<'a> Step<'a> {
    pub fn action(&self) -> Action {
        match self {
            Self::Create(_) => Action::Create,
            Self::Update { .. } => Action::Update,
            Self::Delete(_) => Action::Delete,
        }
    }

    pub fn pair(&self) -> ObjectPair<'a> {
        match *self {
            Self::Create(desired) => ObjectPair::Desired(desired),
            Self::Update { desired, observed } => ObjectPair::Matched { desired, observed },
            Self::Delete(observed) => ObjectPair::Observed(observed),
        }
    }
}

/// Step needed to converge pair, if any
pub fn plan_pair(pair: ObjectPair<'_>) -> Option<Step<'_>> {
    match pair {
        ObjectPair::Desired(desired) => Some(Step::Create(desired)),
        ObjectPair::Observed(observed) => Some(Step::Delete(observed)),
        ObjectPair::Matched { desired, observed } => {
            let fields = compare(desired, observed);
            if fields.is_empty() {
                log::debug!("{} is up to date", desired);
                None
            } else {
                log::debug!(
                    "{} differs from deployed {} in {:?}",
                    desired,
                    observed,
                    fields
                );
                Some(Step::Update { desired, observed })
            }
        }
    }
}

pub fn generate_plan<'a>(pairs: &[ObjectPair<'a>]) -> Vec<Step<'a>> {
    pairs.iter().copied().filter_map(plan_pair).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        apply::{pair_objects, PairCriteria},
        kubemodel::tests::{cron_job, job, pod_template},
    };
    use serde_json::json;

    const LABEL: &str = "kronjob/job";

    fn image_job(name: &str, image: &str) -> WorkloadObject {
        job(
            name,
            "default",
            json!({LABEL: name}),
            json!({"template": pod_template(image)}),
        )
    }

    fn schedule_cron_job(name: &str, schedule: &str) -> WorkloadObject {
        cron_job(
            name,
            "default",
            json!({LABEL: name}),
            json!({
                "schedule": schedule,
                "jobTemplate": {"spec": {"template": pod_template("x")}},
            }),
        )
    }

    fn plan_for<'a>(
        desired: &'a [WorkloadObject],
        observed: &'a [WorkloadObject],
    ) -> Vec<Step<'a>> {
        let pairs = pair_objects(
            desired,
            observed,
            &PairCriteria {
                label: LABEL,
                prune: true,
            },
        )
        .unwrap();
        generate_plan(&pairs)
    }

    #[test]
    fn changed_job_is_updated() {
        let desired = [image_job("a", "x")];
        let observed = [image_job("a", "y")];
        let plan = plan_for(&desired, &observed);
        assert_eq!(
            plan,
            vec![Step::Update {
                desired: &desired[0],
                observed: &observed[0],
            }]
        );
        assert_eq!(plan[0].action(), Action::Update);
    }

    #[test]
    fn new_cron_job_is_created() {
        let desired = [schedule_cron_job("b", "0 * * * *")];
        let plan = plan_for(&desired, &[]);
        assert_eq!(plan, vec![Step::Create(&desired[0])]);
    }

    #[test]
    fn orphan_is_deleted() {
        let observed = [image_job("c", "x")];
        let plan = plan_for(&[], &observed);
        assert_eq!(plan, vec![Step::Delete(&observed[0])]);
        assert_eq!(plan[0].pair(), ObjectPair::Observed(&observed[0]));
    }

    #[test]
    fn kind_change_is_update() {
        let desired = [schedule_cron_job("d", "0 * * * *")];
        let observed = [image_job("d", "x")];
        let plan = plan_for(&desired, &observed);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].action(), Action::Update);
    }

    #[test]
    fn identical_is_skipped() {
        let desired = [schedule_cron_job("e", "0 * * * *")];
        let observed = desired.clone();
        assert!(plan_for(&desired, &observed).is_empty());
    }

    #[test]
    fn idempotent() {
        let desired = [
            image_job("a", "x"),
            schedule_cron_job("b", "0 * * * *"),
            image_job("c", "z"),
        ];
        let observed = [image_job("a", "y"), image_job("gone", "x")];
        assert_eq!(plan_for(&desired, &observed).len(), 4);

        // Converged state is just desired state
        let converged = desired.clone();
        assert!(plan_for(&desired, &converged).is_empty());
    }

    #[test]
    fn keeps_pair_order() {
        let desired = [image_job("b", "x"), image_job("a", "x")];
        let observed = [image_job("z", "x"), image_job("b", "y")];
        let actions: Vec<_> = plan_for(&desired, &observed)
            .iter()
            .map(|s| (s.action(), s.pair().desired().or(s.pair().observed()).unwrap().name()))
            .collect();
        assert_eq!(
            actions,
            vec![
                (Action::Update, "b"),
                (Action::Create, "a"),
                (Action::Delete, "z"),
            ]
        );
    }
}
