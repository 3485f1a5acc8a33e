//! Environment variable parsing with warn-level logging for invalid values.

/// Parse an environment variable with a default fallback.
///
/// - If the variable is not set: returns `default` silently (expected case).
/// - If the variable is set but cannot be parsed: logs a warning and returns `default`.
pub fn env_parse_with_default<T: std::str::FromStr + std::fmt::Display>(
    var: &str,
    default: T,
) -> T {
    match std::env::var(var) {
        Ok(v) => match v.trim().parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    var,
                    value = %v,
                    default = %default,
                    "invalid env var value, using default"
                );
                default
            },
        },
        Err(_) => default,
    }
}

/// Read a non-empty string environment variable.
///
/// Blank values are treated the same as an unset variable.
pub fn env_non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test owns a distinct variable name, so parallel test threads never
    // touch the same entry.
    fn set(var: &str, value: &str) {
        unsafe { std::env::set_var(var, value) };
    }

    fn unset(var: &str) {
        unsafe { std::env::remove_var(var) };
    }

    #[test]
    fn parses_valid_value() {
        let var_name = "PRICETRAIL_TEST_ENV_VALID_11801";
        set(var_name, "42");
        let result: u32 = env_parse_with_default(var_name, 10);
        assert_eq!(result, 42);
        unset(var_name);
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let var_name = "PRICETRAIL_TEST_ENV_WS_11802";
        set(var_name, " 7 ");
        let result: usize = env_parse_with_default(var_name, 1);
        assert_eq!(result, 7);
        unset(var_name);
    }

    #[test]
    fn invalid_value_falls_back() {
        let var_name = "PRICETRAIL_TEST_ENV_INVALID_11803";
        set(var_name, "banana");
        let result: u64 = env_parse_with_default(var_name, 30);
        assert_eq!(result, 30);
        unset(var_name);
    }

    #[test]
    fn missing_var_falls_back() {
        let var_name = "PRICETRAIL_TEST_ENV_MISSING_11804";
        unset(var_name);
        let result: u32 = env_parse_with_default(var_name, 10);
        assert_eq!(result, 10);
    }

    #[test]
    fn blank_string_is_none() {
        let var_name = "PRICETRAIL_TEST_ENV_BLANK_11805";
        set(var_name, "   ");
        assert_eq!(env_non_empty(var_name), None);
        set(var_name, "postgres://localhost/db");
        assert_eq!(env_non_empty(var_name).as_deref(), Some("postgres://localhost/db"));
        unset(var_name);
    }
}
