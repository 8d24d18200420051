use thiserror::Error;

pub const ENV_PREFIX: &str = "DOCCHAT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Invalid search url {url}: {source}")]
    InvalidSearchUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Map a dotted settings path to the environment variable that sets it,
/// e.g. `search.api_key` -> `DOCCHAT_SEARCH__API_KEY`.
pub fn to_env_var(field_path: &str) -> String {
    format!(
        "{}_{}",
        ENV_PREFIX,
        field_path.to_uppercase().replace('.', "__")
    )
}

/// Pull the settings path out of a serde "missing field" message.
///
/// Handles both "missing field `x`" and "missing field `x` for key `a.b`".
pub fn missing_field_path(message: &str) -> Option<String> {
    let rest = message.strip_prefix("missing field `")?;
    let (field, rest) = rest.split_once('`')?;
    match rest.split_once("for key `") {
        Some((_, key)) => Some(format!("{}.{}", key.trim_end_matches('`'), field)),
        None => Some(field.to_string()),
    }
}
