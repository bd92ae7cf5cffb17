//! Configuration management for the APIM CLI
//!
//! This module handles loading and saving the main configuration file and
//! environment variable expansion:
//! - Main configuration (`main_config.yaml`) with the target environments
//! - Lenient `${VAR}` expansion for configuration and parameter files
//! - Strict `${VAR}` substitution for artifact files
//!
//! ## Main Configuration
//! Stored in `<config_dir>/apim/main_config.yaml` or at the path given by
//! `APIM_CONFIG_PATH`.
//!
//! ## Environment Variable Expansion
//!
//! Supported syntax:
//! - `${VAR}` - Simple substitution
//! - `${VAR:-default}` - Use default if VAR is unset or empty
//! - `${VAR-default}` - Use default if VAR is unset
//! - `${VAR:+alt}` - Use alt if VAR is set and non-empty
//! - `${VAR+alt}` - Use alt if VAR is set

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use std::{env, fs, path::PathBuf};

use crate::constants::{
    DEFAULT_EXPORT_DIR, DEFAULT_HTTP_TIMEOUT_SECS, MAIN_CONFIG_FILE, MAIN_CONFIG_PATH_ENV,
};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?:(:?[-+])([^}]*))?\}")
        .expect("placeholder pattern is valid")
});

/// Main configuration loaded from `main_config.yaml`
///
/// # Example
///
/// ```yaml
/// exportDirectory: ${HOME}/.apim/exported
/// httpRequestTimeout: 120
/// environments:
///   - name: dev
///     adminEndpoint: https://localhost:9443/api/am/admin/v0.17
///     publisherEndpoint: https://localhost:9443/api/am/publisher/v1
///     devportalEndpoint: https://localhost:9443/api/am/store/v1
///     auth:
///       type: bearer
///       tokenEnv: APIM_DEV_TOKEN
/// ```
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct MainConfig {
    /// Directory searched when an import path does not exist as given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_directory: Option<String>,
    /// HTTP request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_request_timeout: Option<u64>,
    /// Target environments
    #[serde(default)]
    pub environments: Vec<EnvironmentConfig>,
}

/// Endpoints and credentials of one API management environment
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    /// Unique environment name (`dev`, `prod`, ...)
    pub name: String,
    /// Admin REST API base URL (import/export)
    pub admin_endpoint: String,
    /// Publisher REST API base URL (API and API Product catalog)
    pub publisher_endpoint: String,
    /// Developer portal REST API base URL (application catalog)
    pub devportal_endpoint: String,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// How a bearer token is obtained for an environment
///
/// Credentials are always sourced from environment variables.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
#[serde(tag = "type")]
pub enum AuthConfig {
    /// Anonymous access
    #[default]
    None,
    /// Bearer token read from an environment variable
    Bearer {
        /// Environment variable containing the bearer token
        #[serde(rename = "tokenEnv", alias = "token_env")]
        token_env: String,
    },
}

impl MainConfig {
    /// Look up an environment by name
    pub fn environment(&self, name: &str) -> anyhow::Result<&EnvironmentConfig> {
        self.environments
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "environment '{}' is not configured. Available environments: {}",
                    name,
                    self.environments
                        .iter()
                        .map(|e| e.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }

    /// Resolved export directory, defaulting to `~/.apim/exported`
    pub fn export_directory(&self) -> PathBuf {
        match &self.export_directory {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(DEFAULT_EXPORT_DIR),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(
            self.http_request_timeout
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        )
    }
}

/// Path of the main configuration file
pub fn main_config_path() -> PathBuf {
    env::var(MAIN_CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
            p.push("apim");
            p.push(MAIN_CONFIG_FILE);
            p
        })
}

/// Load the main configuration; a missing file yields an empty configuration
pub fn load_main_config() -> anyhow::Result<MainConfig> {
    load_main_config_from(&main_config_path())
}

pub fn load_main_config_from(path: &Path) -> anyhow::Result<MainConfig> {
    if !path.exists() {
        return Ok(MainConfig::default());
    }
    let data = preprocess_config(path)
        .with_context(|| format!("reading main config {}", path.display()))?;
    let cfg: MainConfig = serde_yaml::from_str(&data)
        .with_context(|| format!("parsing main config {}", path.display()))?;
    Ok(cfg)
}

pub fn save_main_config(cfg: &MainConfig) -> anyhow::Result<PathBuf> {
    let path = main_config_path();
    save_main_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_main_config_to(cfg: &MainConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_yaml::to_string(cfg)?;
    fs::write(path, data).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Expand `${VAR}` placeholders; unset variables without a default expand to an empty string
pub fn expand_env_placeholders(input: &str) -> String {
    PLACEHOLDER
        .replace_all(input, |caps: &Captures| {
            expand_one(caps).unwrap_or_default()
        })
        .to_string()
}

/// Expand `${VAR}` placeholders, failing on the first `${VAR}` whose variable is unset
///
/// Returns the name of the missing variable as the error.
pub fn substitute_env_strict(input: &str) -> Result<String, String> {
    let mut missing: Option<String> = None;
    let out = PLACEHOLDER.replace_all(input, |caps: &Captures| match expand_one(caps) {
        Some(v) => v,
        None => {
            if missing.is_none() {
                missing = Some(caps[1].to_string());
            }
            String::new()
        }
    });
    match missing {
        Some(var) => Err(var),
        None => Ok(out.into_owned()),
    }
}

/// `None` means a bare `${VAR}` whose variable is unset
fn expand_one(caps: &Captures) -> Option<String> {
    let var_name = &caps[1];
    let op = caps.get(2).map_or("", |m| m.as_str());
    let val = caps.get(3).map_or("", |m| m.as_str());
    let var = env::var(var_name).ok();

    let expanded = match (var.as_deref(), op) {
        (Some(v), "") => v.to_string(), // ${VAR}
        (None, "") => return None,
        (Some(v), ":-") if !v.is_empty() => v.to_string(), // ${VAR:-default}
        (_, ":-") => val.to_string(),
        (Some(v), "-") => v.to_string(), // ${VAR-default}
        (None, "-") => val.to_string(),
        (Some(v), ":+") if !v.is_empty() => val.to_string(), // ${VAR:+alt}
        (Some(_), "+") => val.to_string(),                   // ${VAR+alt}
        _ => String::new(),
    };
    Some(expanded)
}

pub fn preprocess_config(path: &Path) -> anyhow::Result<String> {
    let raw_data = fs::read_to_string(path)?;
    Ok(expand_env_placeholders(&raw_data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_expansion_handles_defaults() {
        env::set_var("APIM_CFG_TEST_SET", "value");
        env::set_var("APIM_CFG_TEST_EMPTY", "");
        env::remove_var("APIM_CFG_TEST_UNSET");

        assert_eq!(expand_env_placeholders("${APIM_CFG_TEST_SET}"), "value");
        assert_eq!(expand_env_placeholders("${APIM_CFG_TEST_UNSET}"), "");
        assert_eq!(expand_env_placeholders("${APIM_CFG_TEST_EMPTY:-d}"), "d");
        assert_eq!(expand_env_placeholders("${APIM_CFG_TEST_EMPTY-d}"), "");
        assert_eq!(expand_env_placeholders("${APIM_CFG_TEST_UNSET-d}"), "d");
        assert_eq!(expand_env_placeholders("${APIM_CFG_TEST_SET:+alt}"), "alt");
        assert_eq!(expand_env_placeholders("${APIM_CFG_TEST_UNSET+alt}"), "");
    }

    #[test]
    fn strict_substitution_reports_missing_variable() {
        env::set_var("APIM_CFG_STRICT_HOST", "backend.local");
        env::remove_var("APIM_CFG_STRICT_MISSING");

        assert_eq!(
            substitute_env_strict("url: http://${APIM_CFG_STRICT_HOST}/v1").unwrap(),
            "url: http://backend.local/v1"
        );
        assert_eq!(
            substitute_env_strict("port: ${APIM_CFG_STRICT_MISSING:-8080}").unwrap(),
            "port: 8080"
        );
        assert_eq!(
            substitute_env_strict("a: ${APIM_CFG_STRICT_MISSING}").unwrap_err(),
            "APIM_CFG_STRICT_MISSING"
        );
    }

    #[test]
    fn export_directory_defaults_under_home() {
        let cfg = MainConfig::default();
        assert!(cfg.export_directory().ends_with(DEFAULT_EXPORT_DIR));

        let cfg = MainConfig {
            export_directory: Some("/srv/exports".into()),
            ..Default::default()
        };
        assert_eq!(cfg.export_directory(), PathBuf::from("/srv/exports"));
    }
}
