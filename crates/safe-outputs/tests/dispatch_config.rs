use awc_config::SafeOutputsConfig;
use awc_safe_outputs::{DispatchConfigBuilder, SafeOutputKind};
use serde_json::{json, Value};

fn build(yaml: &str) -> awc_safe_outputs::DispatchConfig {
    let config: SafeOutputsConfig = serde_yaml::from_str(yaml).unwrap();
    DispatchConfigBuilder::new().build(&config).unwrap()
}

#[test]
fn test_issue_and_comment_config() {
    let dispatch = build("create-issue: {}\nadd-comment:\n  max: 3\n");

    let parsed: Value = serde_json::from_str(dispatch.as_json()).unwrap();
    assert_eq!(
        parsed,
        json!({
            "create_issue": {},
            "add_comment": {"max": 3}
        })
    );
    assert!(dispatch.get(SafeOutputKind::CreateDiscussion).is_none());
}

#[test]
fn test_add_labels_without_options_is_present_and_empty() {
    let dispatch = build("add-labels:\n");
    let options = dispatch.get(SafeOutputKind::AddLabels).unwrap();
    assert!(options.is_empty());
    assert_eq!(dispatch.as_json(), r#"{"add_labels":{}}"#);
}

#[test]
fn test_unconfigured_kinds_are_absent() {
    let dispatch = build("noop:\n");
    for kind in DispatchConfigBuilder::new().kinds() {
        if kind != SafeOutputKind::Noop {
            assert!(dispatch.get(kind).is_none(), "{kind} should be absent");
        }
    }
}

#[test]
fn test_same_input_serializes_identically() {
    let yaml = r#"
footer: false
create-pull-request:
  title-prefix: "[bot] "
  labels: [automation]
  draft: true
update-issue:
  title:
  status:
add-labels:
  allowed: [bug, triage]
missing-tool:
"#;
    let first = build(yaml);
    let second = build(yaml);
    assert_eq!(first.as_json(), second.as_json());
    assert_eq!(first, second);

    let parsed: Value = serde_json::from_str(first.as_json()).unwrap();
    assert_eq!(
        parsed["create_pull_request"],
        json!({
            "title_prefix": "[bot] ",
            "labels": ["automation"],
            "draft": true,
            "base_branch": "${{ github.ref_name }}",
            "max_patch_size": 1024,
            "footer": false
        })
    );
    assert_eq!(
        parsed["update_issue"],
        json!({"allow_status": true, "allow_title": true, "footer": false})
    );
}
