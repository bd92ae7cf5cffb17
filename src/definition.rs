//! Definition documents: loading, typed views and writing
//!
//! A definition is held as a single insertion-ordered [`serde_json::Value`]
//! tree so fields the pipeline does not know about survive untouched. Typed
//! views ([`ApiView`], [`ApplicationView`]) are projected from the tree on
//! demand and written back by merging their serialized form over it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{API_DEFINITION_BASE, APPLICATION_DEFINITION_BASE, META_INFORMATION_DIR};
use crate::error::{ImportError, Result};
use crate::merge::merge;

/// Kind of entity an artifact describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    Api,
    ApiProduct,
    Application,
}

impl DefinitionKind {
    fn base_name(self) -> &'static str {
        match self {
            DefinitionKind::Api | DefinitionKind::ApiProduct => API_DEFINITION_BASE,
            DefinitionKind::Application => APPLICATION_DEFINITION_BASE,
        }
    }

    /// Human readable label used in messages
    pub fn label(self) -> &'static str {
        match self {
            DefinitionKind::Api => "API",
            DefinitionKind::ApiProduct => "API Product",
            DefinitionKind::Application => "Application",
        }
    }

    /// `<dir>/Meta-information/<base>` without extension
    pub fn definition_base(self, dir: &Path) -> PathBuf {
        dir.join(META_INFORMATION_DIR).join(self.base_name())
    }

    /// Canonical YAML location of the definition
    pub fn definition_path(self, dir: &Path) -> PathBuf {
        dir.join(META_INFORMATION_DIR)
            .join(format!("{}.yaml", self.base_name()))
    }
}

/// Resolve `<base>.yaml`, falling back to `<base>.json`
pub fn resolve_yaml_or_json(base: &Path) -> Result<PathBuf> {
    for ext in ["yaml", "json"] {
        let candidate = base.with_extension(ext);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    Err(ImportError::DefinitionNotFound(base.to_path_buf()))
}

/// Identity key of an entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub version: String,
    pub provider: String,
}

/// Loaded definition document
#[derive(Debug, Clone)]
pub struct Definition {
    kind: DefinitionKind,
    source: PathBuf,
    tree: Value,
}

impl Definition {
    /// Load the definition of `kind` from an artifact directory
    pub fn load(dir: &Path, kind: DefinitionKind) -> Result<Self> {
        let source = resolve_yaml_or_json(&kind.definition_base(dir))?;
        tracing::debug!(path = %source.display(), "loading definition");
        let text = fs::read_to_string(&source).map_err(|e| ImportError::io(&source, e))?;
        let tree = parse_tree(&source, &text)?;
        Ok(Self { kind, source, tree })
    }

    /// Wrap an already parsed tree
    pub fn from_tree(kind: DefinitionKind, source: impl Into<PathBuf>, tree: Value) -> Self {
        Self {
            kind,
            source: source.into(),
            tree,
        }
    }

    pub fn kind(&self) -> DefinitionKind {
        self.kind
    }

    /// File the definition was read from
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn tree(&self) -> &Value {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Value {
        &mut self.tree
    }

    pub fn into_tree(self) -> Value {
        self.tree
    }

    /// Project a typed view from the current tree
    pub fn view<V: DeserializeOwned>(&self) -> Result<V> {
        serde_json::from_value(self.tree.clone())
            .map_err(|e| ImportError::malformed(&self.source, e))
    }

    /// Merge the serialized form of `view` back over the tree
    pub fn apply_view<V: Serialize>(&mut self, view: &V) -> Result<()> {
        let patch =
            serde_json::to_value(view).map_err(|e| ImportError::malformed(&self.source, e))?;
        merge(&mut self.tree, &patch);
        Ok(())
    }

    /// Identity key projected from the tree
    pub fn identity(&self) -> Result<Identity> {
        match self.kind {
            DefinitionKind::Api | DefinitionKind::ApiProduct => {
                let view: ApiView = self.view()?;
                Ok(view.identity(self.kind))
            }
            DefinitionKind::Application => {
                let view: ApplicationView = self.view()?;
                Ok(Identity {
                    name: view.name.unwrap_or_default(),
                    version: String::new(),
                    provider: view.owner.unwrap_or_default(),
                })
            }
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.tree).map_err(|e| ImportError::Encode {
            path: self.source.clone(),
            message: e.to_string(),
        })
    }

    /// Write the tree as YAML to the canonical location under `dir`
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = self.kind.definition_path(dir);
        let content = self.to_yaml()?;
        tracing::debug!(path = %path.display(), "writing definition");
        fs::write(&path, content).map_err(|e| ImportError::io(&path, e))?;
        Ok(path)
    }
}

fn parse_tree(source: &Path, text: &str) -> Result<Value> {
    let is_json = source.extension().is_some_and(|e| e == "json");
    let tree: Value = if is_json {
        serde_json::from_str(text).map_err(|e| ImportError::malformed(source, e))?
    } else {
        serde_yaml::from_str(text).map_err(|e| ImportError::malformed(source, e))?
    };
    if !tree.is_object() {
        return Err(ImportError::malformed(source, "top level must be a mapping"));
    }
    Ok(tree)
}

/// `id` block of an API or API Product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIdentifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_product_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,
}

/// Versions such as `2.0` parse as numbers in YAML; read any scalar as text
fn scalar_string<'de, D: serde::Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<String>, D::Error> {
    use serde::de::Error as _;
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a version string, found {other}"
        ))),
    }
}

impl ApiIdentifier {
    fn is_empty(&self) -> bool {
        *self == ApiIdentifier::default()
    }
}

/// Typed view of the fields of an API / API Product definition the pipeline reasons about
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiView {
    #[serde(default, skip_serializing_if = "ApiIdentifier::is_empty")]
    pub id: ApiIdentifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri_templates: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_config: Option<Value>,
}

impl ApiView {
    /// Name of the entity; API Products carry it under `apiProductName`
    pub fn name(&self, kind: DefinitionKind) -> &str {
        let name = match kind {
            DefinitionKind::ApiProduct => self.id.api_product_name.as_deref(),
            _ => self.id.api_name.as_deref(),
        };
        name.unwrap_or_default()
    }

    pub fn version(&self) -> &str {
        self.id.version.as_deref().unwrap_or_default()
    }

    pub fn identity(&self, kind: DefinitionKind) -> Identity {
        Identity {
            name: self.name(kind).to_string(),
            version: self.version().to_string(),
            provider: self.id.provider_name.clone().unwrap_or_default(),
        }
    }

    pub fn has_endpoint_config(&self) -> bool {
        self.endpoint_config.as_ref().is_some_and(|v| !v.is_null())
    }
}

/// Typed view of an Application definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn product_identity_uses_product_name() {
        let def = Definition::from_tree(
            DefinitionKind::ApiProduct,
            "api.yaml",
            json!({ "id": { "apiProductName": "Leasing", "version": "1.0.0", "providerName": "admin" } }),
        );
        let id = def.identity().unwrap();
        assert_eq!(id.name, "Leasing");
        assert_eq!(id.version, "1.0.0");
        assert_eq!(id.provider, "admin");
    }

    #[test]
    fn numeric_version_is_read_as_text() {
        let def = Definition::from_tree(
            DefinitionKind::Api,
            "api.yaml",
            json!({ "id": { "apiName": "PizzaAPI", "version": 2 } }),
        );
        assert_eq!(def.identity().unwrap().version, "2");
    }

    #[test]
    fn applying_an_unchanged_view_keeps_the_tree() {
        let tree = json!({
            "id": { "apiName": "PizzaAPI", "version": "1.0.0" },
            "context": "/pizza",
            "vendorExtension": { "keep": true }
        });
        let mut def = Definition::from_tree(DefinitionKind::Api, "api.yaml", tree.clone());
        let view: ApiView = def.view().unwrap();
        def.apply_view(&view).unwrap();
        assert_eq!(def.tree(), &tree);
    }
}
