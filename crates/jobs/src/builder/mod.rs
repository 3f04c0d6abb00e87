//! Job graph builder
//!
//! Turns a parsed [`WorkflowSpec`] into a validated [`JobManager`]. Jobs are
//! built in a fixed order: pre-activation, activation, agent, safe-output
//! dispatcher, threat detection, conclusion, memory persistence, and finally
//! the user's custom jobs. Every external action a step uses is pinned
//! through the [`ActionResolver`] as the step is built.

use crate::manager::JobManager;
use crate::validation::{validate_cache_memory, validate_custom_job, validate_repo_memory};
use awc_actions::ActionResolver;
use awc_config::{Step, WorkflowSpec};
use awc_core::{Result, ResultExt};
use awc_safe_outputs::{DispatchConfig, DispatchConfigBuilder};
use tracing::{debug, info};

pub mod actions;
pub mod activation;
pub mod agent;
pub mod conclusion;
pub mod custom;
pub mod inference;
pub mod memory;
pub mod pre_activation;
pub mod safe_outputs;

pub use inference::{is_referenced, plan_custom_dependencies, DependencyPlan};

/// State threaded through the build phases
#[derive(Debug)]
pub struct BuildContext<'a> {
    pub spec: &'a WorkflowSpec,
    pub jobs: JobManager,
    /// Present only when at least one safe-output kind is enabled
    pub dispatch: Option<DispatchConfig>,
    pub plan: DependencyPlan,
}

impl BuildContext<'_> {
    pub fn has_job(&self, id: &str) -> bool {
        self.jobs.contains(id)
    }

    /// Whether any enabled kind pushes commits and so needs the agent's patch
    pub fn needs_patch(&self) -> bool {
        self.dispatch
            .as_ref()
            .is_some_and(|dispatch| dispatch.kinds().iter().any(|kind| kind.needs_checkout()))
    }
}

/// The graph and dispatch configuration produced for one specification
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltGraph {
    pub jobs: JobManager,
    pub dispatch: Option<DispatchConfig>,
}

/// Builds the job graph for a workflow specification
pub struct JobGraphBuilder {
    dispatch_builder: DispatchConfigBuilder,
}

impl Default for JobGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl JobGraphBuilder {
    pub fn new() -> Self {
        Self {
            dispatch_builder: DispatchConfigBuilder::new(),
        }
    }

    pub fn with_dispatch_builder(dispatch_builder: DispatchConfigBuilder) -> Self {
        Self { dispatch_builder }
    }

    /// Build and validate the graph.
    ///
    /// Any error aborts the whole build; nothing partial is returned.
    pub async fn build(
        &self,
        spec: &WorkflowSpec,
        resolver: &mut ActionResolver,
    ) -> Result<BuiltGraph> {
        // Step 1: Validate declarations that do not depend on the graph
        for (id, config) in &spec.jobs {
            validate_custom_job(id, config)?;
        }
        if let Some(repo_memory) = &spec.tools.repo_memory {
            validate_repo_memory(repo_memory)?;
        }
        if let Some(cache_memory) = &spec.tools.cache_memory {
            validate_cache_memory(cache_memory)?;
        }

        // Step 2: Collapse the safe-output kinds into one dispatch config
        let dispatch = match &spec.safe_outputs {
            Some(config) => Some(self.dispatch_builder.build(config)?),
            None => None,
        }
        .filter(|dispatch| !dispatch.is_empty());

        // Step 3: Decide custom job dependencies
        let plan = plan_custom_dependencies(spec);
        debug!(
            before_activation = ?plan.before_activation,
            "planned custom job dependencies"
        );

        let mut context = BuildContext {
            spec,
            jobs: JobManager::new(),
            dispatch,
            plan,
        };

        // Step 4: Build the jobs in their fixed order
        pre_activation::build(&mut context, resolver).await?;
        activation::build(&mut context, resolver).await?;
        agent::build(&mut context, resolver).await?;
        safe_outputs::build_dispatcher(&mut context, resolver).await?;
        safe_outputs::build_detection(&mut context, resolver).await?;
        conclusion::build(&mut context, resolver).await?;
        memory::build(&mut context, resolver).await?;
        custom::build(&mut context, resolver).await?;

        // Step 5: Validate the finished graph
        context.jobs.validate()?;

        info!(
            workflow = spec.display_name(),
            jobs = context.jobs.len(),
            safe_output_kinds = context.dispatch.as_ref().map_or(0, |d| d.kinds().len()),
            "built job graph"
        );

        Ok(BuiltGraph {
            jobs: context.jobs,
            dispatch: context.dispatch,
        })
    }
}

/// Pin every `uses:` in a list of user-supplied steps
pub async fn pin_steps(
    resolver: &mut ActionResolver,
    steps: &[Step],
    job: &str,
) -> Result<Vec<Step>> {
    let mut pinned = Vec::with_capacity(steps.len());
    for step in steps {
        let mut step = step.clone();
        if let Some(uses) = &step.uses {
            let resolved = resolver
                .pin(uses)
                .await
                .with_context(|| format!("in job '{job}', step '{}'", step.label()))?;
            step.uses = Some(resolved);
        }
        pinned.push(step);
    }
    Ok(pinned)
}
