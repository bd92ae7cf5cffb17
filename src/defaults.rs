//! Structural defaults for API and API Product definitions
//!
//! Each default only fills a field that is unset, so applying them twice is
//! the same as applying them once.

use path_clean::clean;
use serde_json::{json, Value};
use std::path::MAIN_SEPARATOR;

use crate::constants::{DEFAULT_IMPLEMENTATION, VERSION_PLACEHOLDER};
use crate::definition::{ApiView, Definition, DefinitionKind};
use crate::error::{ImportError, Result};

/// Fill unset fields of `view`; returns whether anything changed
pub fn populate_defaults(view: &mut ApiView, kind: DefinitionKind) -> bool {
    let mut dirty = false;

    if view.context_template.as_deref().map_or(true, str::is_empty) {
        let context = view.context.clone().unwrap_or_default();
        let (context, template) = context_with_template(&context, view.version());
        view.context = Some(context);
        view.context_template = Some(template);
        dirty = true;
    }

    if view.tags.is_none() {
        view.tags = Some(Vec::new());
        dirty = true;
    }

    if kind == DefinitionKind::Api {
        if view.uri_templates.is_none() {
            view.uri_templates = Some(Vec::new());
            dirty = true;
        }
        if view.implementation.as_deref().map_or(true, str::is_empty) {
            view.implementation = Some(DEFAULT_IMPLEMENTATION.to_string());
            dirty = true;
        }
    }

    dirty
}

/// Derive `(context, contextTemplate)` from a context and version
///
/// A context already holding `{version}` becomes the template; otherwise
/// `/{version}` is appended. The template is lexically cleaned and the
/// context is the template with the version filled in.
pub fn context_with_template(context: &str, version: &str) -> (String, String) {
    let raw = if context.contains(VERSION_PLACEHOLDER) {
        context.to_string()
    } else {
        format!("{context}/{VERSION_PLACEHOLDER}")
    };
    let template = clean(&raw)
        .to_string_lossy()
        .replace(MAIN_SEPARATOR, "/");
    let context = template.replace(VERSION_PLACEHOLDER, version);
    (context, template)
}

/// Apply [`populate_defaults`] to a definition, merging the result back over its tree
pub fn apply_defaults(definition: &mut Definition) -> Result<bool> {
    let kind = definition.kind();
    if kind == DefinitionKind::Application {
        return Ok(false);
    }
    let mut view: ApiView = definition.view()?;
    if !populate_defaults(&mut view, kind) {
        return Ok(false);
    }
    tracing::info!("{} is populated with defaults", kind.label());
    definition.apply_view(&view)?;
    Ok(true)
}

/// Convert legacy `productionUrl`/`sandboxUrl` fields into a structured `endpointConfig`
///
/// Only runs when no endpoint config exists and at least one legacy field is
/// present. Returns whether the tree changed.
pub fn normalize_legacy_endpoints(definition: &mut Definition) -> Result<bool> {
    let view: ApiView = definition.view()?;
    if view.has_endpoint_config() {
        return Ok(false);
    }

    let source = definition.source().to_path_buf();
    let fields = definition
        .tree_mut()
        .as_object_mut()
        .ok_or_else(|| ImportError::malformed(&source, "top level must be a mapping"))?;
    if !fields.contains_key("productionUrl") && !fields.contains_key("sandboxUrl") {
        return Ok(false);
    }

    let mut config = json!({ "endpoint_type": "http" });
    for (legacy, block) in [
        ("productionUrl", "production_endpoints"),
        ("sandboxUrl", "sandbox_endpoints"),
    ] {
        if let Some(url) = fields.shift_remove(legacy) {
            config[block] = json!({ "url": url, "config": Value::Null });
        }
    }
    fields.insert("endpointConfig".to_string(), config);
    tracing::info!("converted legacy endpoint URLs to endpointConfig");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_without_placeholder_gets_version_suffix() {
        let (context, template) = context_with_template("/pizza", "1.0.0");
        assert_eq!(template, "/pizza/{version}");
        assert_eq!(context, "/pizza/1.0.0");
    }

    #[test]
    fn context_with_placeholder_becomes_template() {
        let (context, template) = context_with_template("/{version}/pizza/", "2.1");
        assert_eq!(template, "/{version}/pizza");
        assert_eq!(context, "/2.1/pizza");
    }

    #[test]
    fn missing_context_defaults_to_the_version() {
        let (context, template) = context_with_template("", "1.0.0");
        assert_eq!(template, "/{version}");
        assert_eq!(context, "/1.0.0");
    }

    #[test]
    fn product_defaults_skip_api_only_fields() {
        let mut view = ApiView {
            context: Some("/leasing".into()),
            ..Default::default()
        };
        assert!(populate_defaults(&mut view, DefinitionKind::ApiProduct));
        assert_eq!(view.tags, Some(vec![]));
        assert_eq!(view.uri_templates, None);
        assert_eq!(view.implementation, None);
    }
}
