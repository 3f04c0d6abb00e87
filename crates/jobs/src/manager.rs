//! Insertion-ordered job graph with structural validation

use crate::node::JobNode;
use crate::validation::check_emitted_values;
use awc_core::{Error, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// The compiled job graph.
///
/// Jobs keep the order in which they were added, which is also the order they
/// are emitted in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct JobManager {
    jobs: IndexMap<String, JobNode>,
}

impl JobManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a job, rejecting an identifier that is already present
    pub fn add_job(&mut self, job: JobNode) -> Result<()> {
        if self.jobs.contains_key(&job.id) {
            return Err(Error::duplicate_job(job.id));
        }
        debug!(job = %job.id, needs = ?job.needs, "added job");
        self.jobs.insert(job.id.clone(), job);
        Ok(())
    }

    pub fn get_job(&self, id: &str) -> Option<&JobNode> {
        self.jobs.get(id)
    }

    /// Mutable access for late dependency and output appends
    pub fn get_job_mut(&mut self, id: &str) -> Option<&mut JobNode> {
        self.jobs.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.jobs.contains_key(id)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &JobNode> {
        self.jobs.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.jobs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Check the graph before anything is emitted.
    ///
    /// Every dependency must name a job in the graph, no job may depend on
    /// itself or reach itself through other jobs, and every emitted value must
    /// fit the platform ceiling.
    pub fn validate(&self) -> Result<()> {
        for job in self.jobs.values() {
            for dependency in &job.needs {
                if dependency == &job.id {
                    return Err(Error::configuration(format!(
                        "job '{}' depends on itself",
                        job.id
                    )));
                }
                if !self.jobs.contains_key(dependency) {
                    return Err(Error::unknown_dependency(&job.id, dependency));
                }
            }
        }

        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        for id in self.jobs.keys() {
            if !visited.contains(id.as_str()) {
                self.detect_cycle(id, &mut visited, &mut rec_stack)?;
            }
        }

        for job in self.jobs.values() {
            check_emitted_values(job)?;
        }

        debug!(jobs = self.jobs.len(), "job graph validated");
        Ok(())
    }

    fn detect_cycle<'a>(
        &'a self,
        id: &'a str,
        visited: &mut HashSet<&'a str>,
        rec_stack: &mut HashSet<&'a str>,
    ) -> Result<()> {
        visited.insert(id);
        rec_stack.insert(id);

        if let Some(job) = self.jobs.get(id) {
            for dependency in &job.needs {
                if !visited.contains(dependency.as_str()) {
                    self.detect_cycle(dependency, visited, rec_stack)?;
                } else if rec_stack.contains(dependency.as_str()) {
                    return Err(Error::configuration(format!(
                        "circular dependency detected: job '{id}' depends on '{dependency}' which creates a cycle"
                    )));
                }
            }
        }

        rec_stack.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use awc_config::Step;
    use awc_core::ErrorKind;
    use proptest::prelude::*;

    fn graph(edges: &[(&str, &[&str])]) -> JobManager {
        let mut manager = JobManager::new();
        for (id, needs) in edges {
            let mut node = JobNode::new(*id);
            for dependency in *needs {
                node = node.needs(*dependency);
            }
            manager.add_job(node).unwrap();
        }
        manager
    }

    #[test]
    fn test_duplicate_job_rejected() {
        let mut manager = JobManager::new();
        manager.add_job(JobNode::new("agent")).unwrap();
        let err = manager.add_job(JobNode::new("agent")).unwrap_err();
        assert!(matches!(err, Error::DuplicateJob { ref job } if job == "agent"));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_get_job() {
        let manager = graph(&[("activation", &[]), ("agent", &["activation"])]);
        assert!(manager.get_job("agent").unwrap().depends_on("activation"));
        assert!(manager.get_job("missing").is_none());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let manager = graph(&[("zeta", &[]), ("alpha", &["zeta"]), ("mid", &[])]);
        assert_eq!(manager.ids().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_unknown_dependency_names_both() {
        let manager = graph(&[("agent", &["activation"])]);
        match manager.validate().unwrap_err() {
            Error::UnknownDependency { job, dependency } => {
                assert_eq!(job, "agent");
                assert_eq!(dependency, "activation");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_forward_reference_validates() {
        let manager = graph(&[("safe_outputs", &["agent", "detection"]), ("agent", &[]), ("detection", &["agent"])]);
        assert!(manager.validate().is_ok());
    }

    #[test]
    fn test_self_dependency() {
        let err = graph(&[("build", &["build"])]).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("depends on itself"));
    }

    #[test]
    fn test_cycle_detected() {
        let err = graph(&[("a", &["c"]), ("b", &["a"]), ("c", &["b"])])
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("circular dependency"));
    }

    #[test]
    fn test_oversized_step_value_rejected() {
        let mut manager = JobManager::new();
        let step = Step::run("Big", "echo").with_env("PAYLOAD", "x".repeat(21_505));
        manager
            .add_job(JobNode::new("agent").with_steps(vec![step]))
            .unwrap();
        let err = manager.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SizeLimit);
        assert!(err.to_string().contains("PAYLOAD"));
    }

    #[test]
    fn test_serializes_as_map() {
        let manager = graph(&[("activation", &[]), ("agent", &["activation"])]);
        let value = serde_json::to_value(&manager).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["activation", "agent"]);
    }

    proptest! {
        // Edges only point at earlier jobs, so the graph is acyclic and valid
        #[test]
        fn prop_backward_edges_validate(edges in proptest::collection::vec(proptest::collection::vec(any::<prop::sample::Index>(), 0..4), 1..12)) {
            let mut manager = JobManager::new();
            for (i, targets) in edges.iter().enumerate() {
                let mut node = JobNode::new(format!("job{i}"));
                if i > 0 {
                    for target in targets {
                        node = node.needs(format!("job{}", target.index(i)));
                    }
                }
                manager.add_job(node).unwrap();
            }
            prop_assert!(manager.validate().is_ok());
            prop_assert_eq!(manager.len(), edges.len());
        }

        #[test]
        fn prop_dangling_edge_rejected(count in 1usize..10, target in 10usize..20) {
            let mut manager = JobManager::new();
            for i in 0..count {
                manager.add_job(JobNode::new(format!("job{i}"))).unwrap();
            }
            manager.get_job_mut("job0").unwrap().needs.insert(format!("job{target}"));
            let is_unknown = matches!(manager.validate(), Err(Error::UnknownDependency { .. }));
            prop_assert!(is_unknown);
        }
    }
}
