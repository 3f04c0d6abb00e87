//! Enforcement of the platform ceiling on emitted expression/environment values

use awc_core::{Error, Result, MAX_EMITTED_VALUE_BYTES};

/// Fail with a size limit error naming `name` when `value` is larger than the
/// platform allows. The limit is inclusive: a value of exactly
/// [`MAX_EMITTED_VALUE_BYTES`] bytes is accepted.
pub fn check_value_size(name: &str, value: &str) -> Result<()> {
    check_value_size_with_limit(name, value, MAX_EMITTED_VALUE_BYTES)
}

/// Same as [`check_value_size`] with an explicit limit
pub fn check_value_size_with_limit(name: &str, value: &str, limit: usize) -> Result<()> {
    let size = value.len();
    if size > limit {
        return Err(Error::size_limit(name, size, limit));
    }
    Ok(())
}

/// Check every line of a multi-line script individually
pub fn check_lines_size(name: &str, script: &str) -> Result<()> {
    for (index, line) in script.lines().enumerate() {
        check_value_size(&format!("{name} (line {})", index + 1), line)?;
    }
    Ok(())
}
