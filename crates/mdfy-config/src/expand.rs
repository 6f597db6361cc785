//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in a config value.
///
/// `field` is the dotted config path used in error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains('$') {
        return Ok(value.to_owned());
    }

    shellexpand::env(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_value_unchanged() {
        assert_eq!(expand_env("plain", "x").unwrap(), "plain");
    }

    #[test]
    fn test_default_value_used_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MDFY_EXPAND_UNSET");
        }
        assert_eq!(
            expand_env("${MDFY_EXPAND_UNSET:-fallback}", "x").unwrap(),
            "fallback"
        );
    }

    #[test]
    fn test_set_variable_expanded() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MDFY_EXPAND_SET", "value");
        }
        assert_eq!(
            expand_env("pre-${MDFY_EXPAND_SET}", "x").unwrap(),
            "pre-value"
        );
        unsafe {
            std::env::remove_var("MDFY_EXPAND_SET");
        }
    }

    #[test]
    fn test_missing_variable_reports_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MDFY_EXPAND_MISSING");
        }
        let err = expand_env("${MDFY_EXPAND_MISSING}", "imgur.client_id").unwrap_err();
        assert!(err.to_string().contains("MDFY_EXPAND_MISSING"));
        assert!(err.to_string().contains("imgur.client_id"));
    }
}
