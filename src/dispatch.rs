//! Create-vs-update decision and upload of the packaged artifact

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::EnvironmentConfig;
use crate::constants::API_PRODUCT_TYPE;
use crate::definition::{DefinitionKind, Identity};
use crate::error::{ImportError, Result};
use crate::remote::{
    CatalogKind, CatalogQuery, TokenProvider, Transport, TransportResponse, UploadRequest,
};

/// Per-kind flags of an import run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOptions {
    Api {
        preserve_provider: bool,
        update: bool,
    },
    ApiProduct {
        preserve_provider: bool,
        import_apis: bool,
        update_apis: bool,
        update_api_product: bool,
    },
    Application {
        owner: Option<String>,
        preserve_owner: bool,
        skip_subscriptions: bool,
        skip_keys: bool,
        update: bool,
    },
}

impl ImportOptions {
    pub fn kind(&self) -> DefinitionKind {
        match self {
            ImportOptions::Api { .. } => DefinitionKind::Api,
            ImportOptions::ApiProduct { .. } => DefinitionKind::ApiProduct,
            ImportOptions::Application { .. } => DefinitionKind::Application,
        }
    }

    /// Whether an existing entity should be looked up and overwritten
    pub fn wants_update(&self) -> bool {
        match self {
            ImportOptions::Api { update, .. } | ImportOptions::Application { update, .. } => *update,
            ImportOptions::ApiProduct {
                update_apis,
                update_api_product,
                ..
            } => *update_apis || *update_api_product,
        }
    }
}

/// Successful result of an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// 200 or 201
    Imported { status: u16 },
    /// 207: imported, but parts of the artifact were skipped
    PartiallyImported { body: String },
}

/// External services an import talks to
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub tokens: &'a dyn TokenProvider,
    pub catalog: &'a dyn CatalogQuery,
    pub transport: &'a dyn Transport,
}

/// Result of [`dispatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub outcome: ImportOutcome,
    /// Identifier of the entity that was overwritten, if any
    pub existing_id: Option<String>,
}

/// Catalog and exact-match filter used to look up an existing entity
pub fn existence_query(kind: DefinitionKind, identity: &Identity) -> (CatalogKind, String) {
    match kind {
        DefinitionKind::Api => (
            CatalogKind::Apis,
            format!(r#"name:"{}" version:"{}""#, identity.name, identity.version),
        ),
        DefinitionKind::ApiProduct => (
            CatalogKind::ApiProducts,
            format!(
                r#"name:"{}" version:"{}" type:"{}""#,
                identity.name, identity.version, API_PRODUCT_TYPE
            ),
        ),
        DefinitionKind::Application => (CatalogKind::Applications, identity.name.clone()),
    }
}

/// Identifier of the first catalog match, `None` when the catalog has none
pub async fn find_existing(
    catalog: &dyn CatalogQuery,
    env: &EnvironmentConfig,
    kind: DefinitionKind,
    identity: &Identity,
    token: Option<&str>,
) -> Result<Option<String>> {
    let (catalog_kind, query) = existence_query(kind, identity);
    tracing::debug!(query = %query, "checking for an existing {}", kind.label());
    let page = catalog
        .search(env, catalog_kind, &query, token, None)
        .await?;
    if page.count == 0 {
        return Ok(None);
    }
    Ok(page.list.into_iter().next().map(|entry| entry.id))
}

/// Query parameters of the import request
pub fn query_params(options: &ImportOptions, updating: bool) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    let set = |params: &mut BTreeMap<String, String>, key: &str, value: bool| {
        params.insert(key.to_string(), value.to_string());
    };
    match options {
        ImportOptions::Api {
            preserve_provider, ..
        } => {
            if updating {
                set(&mut params, "overwrite", true);
            }
            set(&mut params, "preserveProvider", *preserve_provider);
        }
        ImportOptions::ApiProduct {
            preserve_provider,
            import_apis,
            update_apis,
            ..
        } => {
            set(&mut params, "preserveProvider", *preserve_provider);
            // updating dependent APIs is an import task as well
            if *import_apis || *update_apis {
                set(&mut params, "importAPIs", true);
            }
            if *update_apis {
                set(&mut params, "overwriteAPIs", true);
            }
            if updating {
                set(&mut params, "overwriteAPIProduct", true);
            }
        }
        ImportOptions::Application {
            owner,
            preserve_owner,
            skip_subscriptions,
            skip_keys,
            ..
        } => {
            set(&mut params, "preserveOwner", *preserve_owner);
            set(&mut params, "skipSubscriptions", *skip_subscriptions);
            set(&mut params, "skipApplicationKeys", *skip_keys);
            set(&mut params, "update", updating);
            if let Some(owner) = owner.as_deref().filter(|o| !o.is_empty()) {
                params.insert("appOwner".to_string(), owner.to_string());
            }
        }
    }
    params
}

/// Map the transport status to an outcome
pub fn map_status(response: TransportResponse) -> Result<ImportOutcome> {
    match response.status {
        200 | 201 => Ok(ImportOutcome::Imported {
            status: response.status,
        }),
        207 => Ok(ImportOutcome::PartiallyImported {
            body: response.body,
        }),
        status => Err(ImportError::RemoteFailure {
            status,
            body: response.body,
        }),
    }
}

/// Decide create vs update and upload `payload`
pub async fn dispatch(
    collaborators: Collaborators<'_>,
    env: &EnvironmentConfig,
    import_url: &str,
    payload: &Path,
    identity: &Identity,
    options: &ImportOptions,
) -> Result<Dispatched> {
    let kind = options.kind();
    let token = collaborators.tokens.token(env).await?;

    let mut existing_id = None;
    if options.wants_update() {
        existing_id = find_existing(
            collaborators.catalog,
            env,
            kind,
            identity,
            token.as_deref(),
        )
        .await?;
        match &existing_id {
            Some(id) => tracing::info!(id = %id, "existing {} found, attempting to update it", kind.label()),
            None => tracing::info!(
                "{} {} {} was not found, creating it",
                kind.label(),
                identity.name,
                identity.version
            ),
        }
    }

    let params = query_params(options, existing_id.is_some());
    tracing::info!(url = %import_url, ?params, "import request");
    let response = collaborators
        .transport
        .upload(&UploadRequest {
            url: import_url.to_string(),
            file: payload.to_path_buf(),
            token,
            params,
        })
        .await?;

    let outcome = map_status(response)?;
    Ok(Dispatched {
        outcome,
        existing_id,
    })
}
