//! `${VAR}` expansion for string values in `quire.toml`.

use crate::ConfigError;

/// Expand environment variable references in a configuration value.
///
/// `${VAR}` must be set; `${VAR:-default}` falls back to `default`. Bare
/// `$VAR` is left as written so paths containing `$` survive untouched.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, UnsetVar> {
        std::env::var(var).map(Some).map_err(|_| UnsetVar {
            name: var.to_owned(),
        })
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{0}}} not set", e.cause.name),
    })
}

/// Variable referenced without a default and missing from the environment.
struct UnsetVar {
    name: String,
}
