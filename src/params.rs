//! Override parameters (`api_params.yaml`)
//!
//! The file carries per-environment overrides. Environments may be given
//! either as a list of entries with a `name`, or as a mapping keyed by name:
//!
//! ```yaml
//! environments:
//!   - name: dev
//!     endpoints:
//!       production:
//!         url: https://dev.backend/pizza
//!     security:
//!       enabled: true
//!       type: digest
//!       username: admin
//!       password: ${PIZZA_BACKEND_PASSWORD}
//!     gatewayEnvironments:
//!       - Production and Sandbox
//!     certs:
//!       - hostName: https://dev.backend
//!         alias: dev-backend
//!         path: certs/dev.pem
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::expand_env_placeholders;
use crate::constants::PARAMS_FILE;
use crate::error::{ImportError, Result};

/// Parsed override-parameters file
#[derive(Debug, Clone, Default)]
pub struct ApiParams {
    pub environments: Vec<EnvironmentParams>,
}

/// Overrides for one target environment
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentParams {
    #[serde(default)]
    pub name: String,
    /// Endpoint block merged over the definition's endpoint configuration
    #[serde(default)]
    pub endpoints: Option<Value>,
    #[serde(default)]
    pub security: Option<SecurityParams>,
    /// Replaces the definition's gateway environment list
    #[serde(default, alias = "environments")]
    pub gateway_environments: Option<Vec<String>>,
    #[serde(default)]
    pub certs: Vec<CertParams>,
}

/// Endpoint security override
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityParams {
    /// `None` when the field is absent, which leaves existing security untouched
    #[serde(default, deserialize_with = "presence_bool")]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// Certificate reference: a PEM file and the label it is registered under
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub path: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEnvironments {
    List(Vec<EnvironmentParams>),
    Keyed(BTreeMap<String, EnvironmentParams>),
}

#[derive(Deserialize)]
struct RawParams {
    #[serde(default)]
    environments: Option<RawEnvironments>,
}

impl ApiParams {
    /// Load a params file, expanding `${VAR}` placeholders first
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| ImportError::io(path, e))?;
        Self::parse(path, &expand_env_placeholders(&raw))
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let raw: RawParams =
            serde_yaml::from_str(text).map_err(|e| ImportError::InvalidParams {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let environments = match raw.environments {
            None => Vec::new(),
            Some(RawEnvironments::List(list)) => list,
            Some(RawEnvironments::Keyed(map)) => map
                .into_iter()
                .map(|(name, mut env)| {
                    env.name = name;
                    env
                })
                .collect(),
        };
        Ok(Self { environments })
    }

    /// Overrides for the environment called `name`
    pub fn environment(&self, name: &str) -> Option<&EnvironmentParams> {
        self.environments.iter().find(|e| e.name == name)
    }
}

/// Locate the params file for an import
///
/// With an explicit path, that path must exist. Otherwise the lookup order is
/// `<import_root>/api_params.yaml` (directories only), the parent directory of
/// `import_root`, then `cwd`. `Ok(None)` means no file was found.
pub fn resolve_params_path(
    import_root: &Path,
    explicit: Option<&Path>,
    cwd: &Path,
) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(Some(path.to_path_buf()));
        }
        return Err(ImportError::NotFound {
            what: "parameters file",
            path: path.to_path_buf(),
        });
    }

    let mut candidates = Vec::with_capacity(3);
    if import_root.is_dir() {
        candidates.push(import_root.join(PARAMS_FILE));
    }
    if let Some(parent) = import_root.parent() {
        candidates.push(parent.join(PARAMS_FILE));
    }
    candidates.push(cwd.join(PARAMS_FILE));

    for candidate in candidates {
        tracing::debug!(path = %candidate.display(), "scanning for parameters file");
        if candidate.is_file() {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

fn presence_bool<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<bool>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }

    match Option::<Raw>::deserialize(d)? {
        None => Ok(None),
        Some(Raw::Bool(b)) => Ok(Some(b)),
        Some(Raw::Text(s)) => match s.trim() {
            "" => Ok(None),
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(Some(true)),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(Some(false)),
            other => Err(D::Error::custom(format!(
                "invalid value '{other}' for security.enabled"
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ApiParams {
        ApiParams::parse(Path::new("api_params.yaml"), text).unwrap()
    }

    #[test]
    fn enabled_presence_is_tracked() {
        let params = parse(
            r#"
environments:
  - name: absent
    security:
      username: admin
  - name: off
    security:
      enabled: false
  - name: quoted
    security:
      enabled: "true"
  - name: blank
    security:
      enabled: ""
"#,
        );
        let enabled = |env: &str| {
            params
                .environment(env)
                .and_then(|e| e.security.as_ref())
                .and_then(|s| s.enabled)
        };
        assert_eq!(enabled("absent"), None);
        assert_eq!(enabled("off"), Some(false));
        assert_eq!(enabled("quoted"), Some(true));
        assert_eq!(enabled("blank"), None);
    }

    #[test]
    fn keyed_environments_take_their_name_from_the_key() {
        let params = parse(
            r#"
environments:
  prod:
    gatewayEnvironments: ["Production and Sandbox"]
"#,
        );
        let prod = params.environment("prod").unwrap();
        assert_eq!(
            prod.gateway_environments.as_deref(),
            Some(&["Production and Sandbox".to_string()][..])
        );
    }

    #[test]
    fn invalid_enabled_value_is_rejected() {
        let err = ApiParams::parse(
            Path::new("api_params.yaml"),
            "environments:\n  - name: dev\n    security:\n      enabled: maybe\n",
        )
        .unwrap_err();
        assert!(matches!(err, ImportError::InvalidParams { .. }));
    }
}
