//! Configuration constants and utilities for suiteql
//!
//! File locations for the profile store and the query history, each of which
//! can be redirected with an environment variable.

/// Default profile file path for suiteql
pub const DEFAULT_PROFILE_PATH: &str = "~/.suiteql/profile";

/// Environment variable name for overriding the profile path
pub const PROFILE_PATH_ENV_VAR: &str = "SUITEQL_PROFILE_PATH";

/// Default history file path for suiteql
pub const DEFAULT_HISTORY_PATH: &str = "~/.suiteql/history";

/// Environment variable name for overriding the history path
pub const HISTORY_PATH_ENV_VAR: &str = "SUITEQL_HISTORY_PATH";

/// Environment variable holding the tracing filter directives
pub const LOG_LEVEL_ENV_VAR: &str = "SUITEQL_LOG_LEVEL";

/// Seconds to wait for the query service before giving up
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Get the profile file path, checking environment variable first, then falling back to default
pub fn get_profile_path() -> String {
    path_from_env(PROFILE_PATH_ENV_VAR, DEFAULT_PROFILE_PATH)
}

/// Get the history file path, checking environment variable first, then falling back to default
pub fn get_history_path() -> String {
    path_from_env(HISTORY_PATH_ENV_VAR, DEFAULT_HISTORY_PATH)
}

fn path_from_env(var: &str, default: &str) -> String {
    let raw = std::env::var_os(var)
        .and_then(|val| val.into_string().ok())
        .unwrap_or_else(|| default.to_string());
    shellexpand::tilde(&raw).into_owned()
}
