//! External actions the generated jobs depend on, and the step shapes built
//! from them

use awc_config::Step;
use serde_json::Value;

pub const CHECKOUT: &str = "actions/checkout@v5";
pub const GITHUB_SCRIPT: &str = "actions/github-script@v8";
pub const UPLOAD_ARTIFACT: &str = "actions/upload-artifact@v4";
pub const DOWNLOAD_ARTIFACT: &str = "actions/download-artifact@v5";
pub const CACHE_RESTORE: &str = "actions/cache/restore@v4";
pub const CACHE_SAVE: &str = "actions/cache/save@v4";
pub const SETUP_NODE: &str = "actions/setup-node@v4";

/// Every `(repository, version)` the builders may pin, subpaths collapsed to
/// their root repository
pub const STANDARD_ACTIONS: &[(&str, &str)] = &[
    ("actions/checkout", "v5"),
    ("actions/github-script", "v8"),
    ("actions/upload-artifact", "v4"),
    ("actions/download-artifact", "v5"),
    ("actions/cache", "v4"),
    ("actions/setup-node", "v4"),
];

/// Directory the runtime handlers are installed into on the runner
pub const HANDLER_DIR: &str = "/opt/gh-aw/actions";
/// Scratch directory shared by the agent steps
pub const SCRATCH_DIR: &str = "/tmp/gh-aw";

/// A `github-script` step running one of the bundled handlers
pub fn script_step(name: &str, id: &str, uses: &str, handler: &str) -> Step {
    Step::uses(name, uses).with_id(id).with_input(
        "script",
        format!(
            "const {{ main }} = require('{HANDLER_DIR}/{handler}.cjs');\nawait main();"
        ),
    )
}

pub fn upload_artifact(name: &str, uses: &str, artifact: &str, path: &str) -> Step {
    Step::uses(name, uses)
        .with_input("name", artifact)
        .with_input("path", path)
        .with_input("if-no-files-found", "ignore")
}

pub fn download_artifact(name: &str, uses: &str, artifact: &str, path: &str) -> Step {
    let mut step = Step::uses(name, uses)
        .with_input("name", artifact)
        .with_input("path", path);
    step.extra
        .insert("continue-on-error".to_string(), Value::Bool(true));
    step
}

/// Expression reading a step output
pub fn step_output(step: &str, output: &str) -> String {
    format!("${{{{ steps.{step}.outputs.{output} }}}}")
}

/// Expression reading a job output
pub fn job_output(job: &str, output: &str) -> String {
    format!("${{{{ needs.{job}.outputs.{output} }}}}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expressions() {
        assert_eq!(
            step_output("collect_output", "output"),
            "${{ steps.collect_output.outputs.output }}"
        );
        assert_eq!(
            job_output("activation", "text"),
            "${{ needs.activation.outputs.text }}"
        );
    }

    #[test]
    fn test_script_step_requires_handler() {
        let step = script_step("Check", "check", "actions/github-script@abc", "check_membership");
        assert_eq!(step.id.as_deref(), Some("check"));
        assert!(step.with["script"]
            .as_str()
            .unwrap()
            .contains("/opt/gh-aw/actions/check_membership.cjs"));
    }
}
