use std::env;

/// Environment variable holding the base URL of the export server
pub const SERVER_ENV_VAR: &str = "CHAT_VIEWER_SERVER";
/// Server used when neither `--server` nor the environment names one
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Base URL of the export server from the environment, falling back to the default
pub fn server_url_from_env() -> String {
    server_url_from(env::var(SERVER_ENV_VAR).ok())
}

fn server_url_from(value: Option<String>) -> String {
    value
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
}
