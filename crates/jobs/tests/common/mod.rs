use awc_actions::{ActionCache, ActionResolver, InMemoryLookup, ResolverOptions};
use awc_config::WorkflowSpec;
use awc_jobs::builder::actions::STANDARD_ACTIONS;
use std::sync::Arc;

/// A deterministic fake commit hash for `repository@version`
pub fn fake_sha(repository: &str, version: &str) -> String {
    let seed = format!("{repository}@{version}");
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in seed.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    format!("{hash:016x}").repeat(3)[..40].to_string()
}

/// Lookup that knows every action the builders pin
pub fn standard_lookup() -> Arc<InMemoryLookup> {
    let lookup = InMemoryLookup::new();
    for (repository, version) in STANDARD_ACTIONS {
        lookup.set(repository, version, &fake_sha(repository, version));
    }
    Arc::new(lookup)
}

pub fn resolver_with(lookup: Arc<InMemoryLookup>) -> ActionResolver {
    ActionResolver::new(
        ActionCache::in_memory(),
        Box::new(lookup),
        ResolverOptions::default(),
    )
}

pub fn spec(yaml: &str) -> WorkflowSpec {
    serde_yaml::from_str(yaml).expect("test specification parses")
}
