//! Environment variable naming for slotwise.
//!
//! Configuration values use `SLOTWISE__SECTION__KEY`, process-wide secrets use
//! `SLOTWISE_SECRET_SECTION_KEY` with a legacy `SECTION_KEY` fallback.

use std::env;
use thiserror::Error;

/// The default prefix for configuration environment variables
pub const DEFAULT_PREFIX: &str = "SLOTWISE";

/// The prefix for secret environment variables
pub const SECRET_PREFIX: &str = "SLOTWISE_SECRET";

/// The separator for configuration environment variables
pub const CONFIG_SEPARATOR: &str = "__";

/// The separator for secret environment variables
pub const SECRET_SEPARATOR: &str = "_";

/// Path of the credential vault secret.
pub const VAULT_SECRET_PATH: &str = "vault.secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SecretLookupError {
    #[error("secret {path} is not set (expected {env_var})")]
    Missing { path: String, env_var: String },
    #[error("secret {0} is empty")]
    Empty(String),
}

/// Get the prefix for configuration environment variables
pub fn get_config_prefix() -> String {
    env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string())
}

/// Convert a secret path to an environment variable name
///
/// `vault.secret` becomes `SLOTWISE_SECRET_VAULT_SECRET`.
pub fn secret_path_to_env_var(path: &str) -> String {
    let path = path.replace('.', SECRET_SEPARATOR);
    format!("{}{}{}", SECRET_PREFIX, SECRET_SEPARATOR, path).to_uppercase()
}

/// Legacy secret naming without the prefix, `vault.secret` becomes `VAULT_SECRET`.
pub fn legacy_secret_path_to_env_var(path: &str) -> String {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.len() < 2 {
        return path.to_uppercase();
    }

    let service = parts[0];
    let key = parts[1..].join(SECRET_SEPARATOR);
    format!("{}_{}", service, key).to_uppercase()
}

/// Get an environment variable for a secret path, trying the prefixed name first.
pub fn get_secret_env_var(path: &str) -> Option<String> {
    let env_var = secret_path_to_env_var(path);
    if let Ok(value) = env::var(&env_var) {
        return Some(value);
    }

    let legacy_env_var = legacy_secret_path_to_env_var(path);
    env::var(&legacy_env_var).ok()
}

/// Reads a required secret from the environment on every call.
pub fn read_secret(path: &str) -> Result<String, SecretLookupError> {
    match get_secret_env_var(path) {
        Some(value) if value.trim().is_empty() => Err(SecretLookupError::Empty(path.to_string())),
        Some(value) => Ok(value),
        None => Err(SecretLookupError::Missing {
            path: path.to_string(),
            env_var: secret_path_to_env_var(path),
        }),
    }
}
