//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` names the configuration key for error reporting.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
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
    fn test_literal_passthrough() {
        assert_eq!(expand_env("localhost", "server.host").unwrap(), "localhost");
    }

    #[test]
    fn test_default_used_when_unset() {
        let value = expand_env("${DEVSERVE_EXPAND_UNSET:-fallback}", "server.host").unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_missing_var_reports_name() {
        let err = expand_env("${DEVSERVE_EXPAND_MISSING}", "server.host").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Environment variable error in server.host: ${DEVSERVE_EXPAND_MISSING} not set"
        );
    }
}
