//! Injection of environment-scoped override parameters into a definition
//!
//! All mutations happen on a copy of the definition tree; the definition and
//! the certificates file are only written once every step has succeeded.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEPENDENT_APIS_DIR, ENDPOINT_CERTIFICATES_FILE, META_INFORMATION_DIR, PARAMS_FILE,
};
use crate::definition::{Definition, DefinitionKind};
use crate::envsubst::substitute_env_in_artifact;
use crate::error::{ImportError, Result};
use crate::merge::merge;
use crate::params::{ApiParams, CertParams, EnvironmentParams, SecurityParams};

const ENDPOINT_CONFIG: &str = "endpointConfig";

/// Entry of `endpoint_certificates.yaml`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointCertificate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub path: String,
    /// Base64 of the DER bytes
    pub certificate: String,
}

/// Inject the overrides for `environment` from `params_path` into `definition`
///
/// Returns `false` when the params file has no entry for the environment.
pub fn inject_params(
    definition: &mut Definition,
    artifact_dir: &Path,
    params_path: &Path,
    environment: &str,
) -> Result<bool> {
    tracing::info!(path = %params_path.display(), "loading parameters");
    let params = ApiParams::load(params_path)?;
    let Some(env) = params.environment(environment) else {
        tracing::info!(environment, "environment not present in parameters file, using default values");
        return Ok(false);
    };

    let mut staged = definition.clone();
    apply_environment(&mut staged, env)?;
    let certificates = generate_certificates(artifact_dir, &env.certs)?;

    // definition goes last: a failed certificates write leaves it untouched
    let definition_yaml = staged.to_yaml()?;
    if !certificates.is_empty() {
        write_certificates(artifact_dir, &certificates)?;
    }
    let path = staged.kind().definition_path(artifact_dir);
    tracing::debug!(path = %path.display(), "writing definition");
    fs::write(&path, definition_yaml).map_err(|e| ImportError::io(&path, e))?;
    *definition = staged;
    Ok(true)
}

/// Apply endpoint, gateway environment and security overrides in memory
pub fn apply_environment(definition: &mut Definition, env: &EnvironmentParams) -> Result<()> {
    let source = definition.source().to_path_buf();
    let mut tree = definition.tree().clone();
    let fields = tree
        .as_object_mut()
        .ok_or_else(|| ImportError::malformed(&source, "top level must be a mapping"))?;

    if let Some(endpoints) = &env.endpoints {
        tracing::debug!("merging endpoint overrides");
        merge_endpoints(fields, endpoints, &source)?;
    }
    if let Some(gateways) = &env.gateway_environments {
        fields.insert("environments".to_string(), json!(gateways));
    }
    if let Some(security) = &env.security {
        apply_security(fields, security)?;
    }

    *definition.tree_mut() = tree;
    Ok(())
}

/// Override keys `production`/`sandbox` name the `*_endpoints` blocks of the endpoint config
fn endpoint_patch(overrides: &Value) -> Value {
    let Some(map) = overrides.as_object() else {
        return overrides.clone();
    };
    let patch: Map<String, Value> = map
        .iter()
        .map(|(k, v)| {
            let key = match k.as_str() {
                "production" => "production_endpoints".to_string(),
                "sandbox" => "sandbox_endpoints".to_string(),
                _ => k.clone(),
            };
            (key, v.clone())
        })
        .collect();
    Value::Object(patch)
}

fn merge_endpoints(fields: &mut Map<String, Value>, overrides: &Value, source: &Path) -> Result<()> {
    let patch = endpoint_patch(overrides);
    let current = fields.get(ENDPOINT_CONFIG).cloned().unwrap_or(Value::Null);
    let updated = match current {
        // endpoint config stored as an embedded JSON document stays a string
        Value::String(encoded) => {
            let mut config: Value = serde_json::from_str(&encoded)
                .map_err(|e| ImportError::malformed(source, format!("endpointConfig: {e}")))?;
            merge(&mut config, &patch);
            Value::String(config.to_string())
        }
        mut config @ Value::Object(_) => {
            merge(&mut config, &patch);
            config
        }
        Value::Null => {
            let mut config = json!({ "endpoint_type": "http" });
            merge(&mut config, &patch);
            config
        }
        _ => {
            return Err(ImportError::malformed(
                source,
                "endpointConfig must be a mapping or a JSON string",
            ))
        }
    };
    fields.insert(ENDPOINT_CONFIG.to_string(), updated);
    Ok(())
}

fn apply_security(fields: &mut Map<String, Value>, security: &SecurityParams) -> Result<()> {
    let Some(enabled) = security.enabled else {
        return Ok(());
    };
    fields.insert("endpointSecured".to_string(), Value::Bool(enabled));

    if !enabled {
        // leftover credentials would re-enable security on import
        fields.insert("endpointUTUsername".to_string(), json!(""));
        fields.insert("endpointUTPassword".to_string(), json!(""));
        return Ok(());
    }

    let required = [
        ("username", &security.username),
        ("password", &security.password),
        ("type", &security.kind),
    ];
    if let Some(&(missing, _)) = required.iter().find(|(_, v)| v.is_empty()) {
        return Err(ImportError::IncompleteSecurityConfig { missing });
    }

    let digest = match security.kind.as_str() {
        "digest" => true,
        "basic" => false,
        other => return Err(ImportError::InvalidSecurityType(other.to_string())),
    };
    fields.insert("endpointUTUsername".to_string(), json!(security.username));
    fields.insert("endpointUTPassword".to_string(), json!(security.password));
    fields.insert("endpointAuthDigest".to_string(), Value::Bool(digest));
    Ok(())
}

/// Resolve a certificate path: first inside the artifact, then as an absolute or `~/` path
pub fn resolve_cert_path(import_root: &Path, cert_path: &str) -> Result<PathBuf> {
    let in_project = import_root.join(cert_path);
    tracing::debug!(path = %in_project.display(), "looking for certificate in project directory");
    if in_project.is_file() {
        return Ok(in_project);
    }

    let expanded = match cert_path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(cert_path)),
        None => PathBuf::from(cert_path),
    };
    if expanded.is_file() {
        return Ok(expanded);
    }
    Err(ImportError::NotFound {
        what: "certificate",
        path: expanded,
    })
}

/// Read, PEM-decode and base64-encode each certificate override
pub fn generate_certificates(
    import_root: &Path,
    certs: &[CertParams],
) -> Result<Vec<EndpointCertificate>> {
    certs
        .iter()
        .map(|cert| {
            let path = resolve_cert_path(import_root, &cert.path)?;
            let data = fs::read(&path).map_err(|e| ImportError::io(&path, e))?;
            let block = pem::parse(&data).map_err(|e| ImportError::InvalidCertificate {
                path: path.clone(),
                message: e.to_string(),
            })?;
            Ok(EndpointCertificate {
                host_name: cert.host_name.clone(),
                alias: cert.alias.clone(),
                path: cert.path.clone(),
                certificate: base64::encode(block.contents()),
            })
        })
        .collect()
}

pub fn write_certificates(artifact_dir: &Path, certs: &[EndpointCertificate]) -> Result<PathBuf> {
    let path = artifact_dir
        .join(META_INFORMATION_DIR)
        .join(ENDPOINT_CERTIFICATES_FILE);
    let content = serde_yaml::to_string(certs).map_err(|e| ImportError::Encode {
        path: path.clone(),
        message: e.to_string(),
    })?;
    tracing::debug!(path = %path.display(), "writing endpoint certificates");
    fs::write(&path, content).map_err(|e| ImportError::io(&path, e))?;
    Ok(path)
}

/// Prepare the APIs bundled in an API Product artifact
///
/// Each directory under `APIs/` gets env substitution and, when it carries its
/// own `api_params.yaml`, the overrides for `environment`.
pub fn inject_dependent_apis(product_root: &Path, environment: &str) -> Result<()> {
    let apis_dir = product_root.join(DEPENDENT_APIS_DIR);
    if !apis_dir.is_dir() {
        tracing::debug!("APIs directory does not exist, ignoring dependent APIs");
        return Ok(());
    }

    let mut api_dirs = Vec::new();
    for entry in fs::read_dir(&apis_dir).map_err(|e| ImportError::io(&apis_dir, e))? {
        let entry = entry.map_err(|e| ImportError::io(&apis_dir, e))?;
        if entry.path().is_dir() {
            api_dirs.push(entry.path());
        }
    }
    api_dirs.sort();

    for api_dir in api_dirs {
        tracing::info!(api = %api_dir.display(), "pre-processing dependent API");
        substitute_env_in_artifact(&api_dir)?;
        let params_path = api_dir.join(PARAMS_FILE);
        if params_path.is_file() {
            let mut definition = Definition::load(&api_dir, DefinitionKind::Api)?;
            inject_params(&mut definition, &api_dir, &params_path, environment)?;
        }
    }
    Ok(())
}
