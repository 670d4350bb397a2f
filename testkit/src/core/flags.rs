//! Boolean flag parsing for CI environment variables.

const TRUTHY: [&str; 6] = ["y", "yes", "t", "true", "1", "on"];

/// True when `value` spells an enabled flag (`y`, `yes`, `t`, `true`, `1`, `on`).
///
/// Matching ignores case and surrounding whitespace. Anything else, including the
/// empty string, is disabled.
pub fn is_enabled(value: &str) -> bool {
    let value = value.trim();
    TRUTHY.iter().any(|truthy| value.eq_ignore_ascii_case(truthy))
}
