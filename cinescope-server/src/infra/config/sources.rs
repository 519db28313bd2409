use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub tmdb: FileTmdbConfig,
    #[serde(default)]
    pub cors: FileCorsConfig,
    #[serde(default)]
    pub cache: FileCacheConfig,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileTmdbConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Human readable duration, e.g. `10s`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCorsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_methods: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_headers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_credentials: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCacheConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep_interval: Option<String>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub database_url: Option<String>,
    pub database_max_connections: Option<u32>,
    pub tmdb_api_key: Option<String>,
    pub tmdb_base_url: Option<String>,
    pub tmdb_language: Option<String>,
    pub tmdb_timeout: Option<String>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub cors_allowed_methods: Option<Vec<String>>,
    pub cors_allowed_headers: Option<Vec<String>>,
    pub cors_allow_credentials: Option<bool>,
    pub cache_retention: Option<String>,
    pub cache_sweep_interval: Option<String>,
    pub dev_mode: Option<bool>,
    /// Numeric variables that were set but could not be parsed.
    pub invalid_vars: Vec<&'static str>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        let mut env_config = Self::default();

        env_config.config_path = non_empty_var("CINESCOPE_CONFIG").map(PathBuf::from);

        env_config.server_host = non_empty_var("SERVER_HOST");
        // PORT is what most hosting platforms inject; SERVER_PORT wins when both are set.
        env_config.server_port = first_number(
            [
                ("SERVER_PORT", non_empty_var("SERVER_PORT")),
                ("PORT", non_empty_var("PORT")),
            ],
            &mut env_config.invalid_vars,
        );

        env_config.database_url = non_empty_var("DATABASE_URL");
        env_config.database_max_connections = first_number(
            [(
                "DATABASE_MAX_CONNECTIONS",
                non_empty_var("DATABASE_MAX_CONNECTIONS"),
            )],
            &mut env_config.invalid_vars,
        );

        env_config.tmdb_api_key = non_empty_var("TMDB_API_KEY");
        env_config.tmdb_base_url = non_empty_var("TMDB_BASE_URL");
        env_config.tmdb_language = non_empty_var("TMDB_LANG");
        env_config.tmdb_timeout = non_empty_var("TMDB_TIMEOUT");

        env_config.cors_allowed_origins = parse_csv_var("CORS_ALLOWED_ORIGINS");
        env_config.cors_allowed_methods = parse_csv_var("CORS_ALLOWED_METHODS");
        env_config.cors_allowed_headers = parse_csv_var("CORS_ALLOWED_HEADERS");
        env_config.cors_allow_credentials = parse_bool_var("CORS_ALLOW_CREDENTIALS");

        env_config.cache_retention = non_empty_var("CACHE_RETENTION");
        env_config.cache_sweep_interval = non_empty_var("CACHE_SWEEP_INTERVAL");

        env_config.dev_mode = parse_bool_var("DEV_MODE");

        env_config
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// First candidate that parses as a number. Set but unparseable candidates
/// are recorded in `invalid` and skipped.
pub(crate) fn first_number<T, const N: usize>(
    candidates: [(&'static str, Option<String>); N],
    invalid: &mut Vec<&'static str>,
) -> Option<T>
where
    T: std::str::FromStr,
{
    for (name, raw) in candidates {
        let Some(raw) = raw else { continue };
        match raw.parse() {
            Ok(value) => return Some(value),
            Err(_) => invalid.push(name),
        }
    }
    None
}

fn parse_csv_var(name: &str) -> Option<Vec<String>> {
    std::env::var(name).ok().map(|raw| parse_csv(&raw))
}

pub(crate) fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|part| {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

fn parse_bool_var(name: &str) -> Option<bool> {
    std::env::var(name).ok().and_then(|raw| parse_bool(&raw))
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
