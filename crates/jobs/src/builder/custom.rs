//! User-declared custom jobs

use super::{pin_steps, BuildContext};
use crate::node::{JobNode, ReusableWorkflow};
use awc_actions::ActionResolver;
use awc_config::{CustomJobConfig, JobSecrets};
use awc_core::{Result, DEFAULT_RUNS_ON};

fn secrets_value(secrets: &JobSecrets) -> serde_json::Value {
    match secrets {
        JobSecrets::Keyword(keyword) => serde_json::Value::String(keyword.clone()),
        JobSecrets::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        ),
    }
}

async fn custom_job(
    id: &str,
    config: &CustomJobConfig,
    context: &BuildContext<'_>,
    resolver: &mut ActionResolver,
) -> Result<JobNode> {
    let mut job = JobNode::new(id);
    job.name = config.name.clone();
    job.needs = context.plan.needs.get(id).cloned().unwrap_or_default();
    job.condition = config.condition.clone();
    job.permissions = config.permissions.clone();
    job.outputs = config.outputs.clone();
    job.env = config.env.clone();
    job.timeout_minutes = config.timeout_minutes;
    job.environment = config.environment.clone();
    job.concurrency = config.concurrency.clone();

    match &config.uses {
        Some(uses) => {
            job.reusable = Some(ReusableWorkflow {
                uses: uses.clone(),
                with: config.with.clone(),
                secrets: config.secrets.as_ref().map(secrets_value),
            });
        }
        None => {
            job.runs_on = Some(
                config
                    .runs_on
                    .clone()
                    .unwrap_or_else(|| DEFAULT_RUNS_ON.into()),
            );
            if let Some(steps) = &config.steps {
                job.steps = pin_steps(resolver, steps, id).await?;
            }
        }
    }

    Ok(job)
}

/// Add every custom job in declaration order
pub async fn build(context: &mut BuildContext<'_>, resolver: &mut ActionResolver) -> Result<()> {
    let spec = context.spec;
    for (id, config) in &spec.jobs {
        let job = custom_job(id, config, context, resolver).await?;
        context.jobs.add_job(job)?;
    }
    Ok(())
}
