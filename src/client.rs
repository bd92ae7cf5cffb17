use async_trait::async_trait;
use reqwest::{
    header::{HeaderValue, ACCEPT},
    multipart, Client, RequestBuilder, StatusCode, Url,
};
use std::env;
use std::time::Duration;

use crate::config::{AuthConfig, EnvironmentConfig, MainConfig};
use crate::definition::DefinitionKind;
use crate::error::{ImportError, Result};
use crate::remote::{
    CatalogKind, CatalogPage, CatalogQuery, TokenProvider, Transport, TransportResponse,
    UploadRequest,
};

/// HTTP client for the admin, publisher and developer portal REST APIs
pub struct ApimClient {
    pub client: Client,
}

impl ApimClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport_error)?;
        Ok(ApimClient { client })
    }

    pub fn from_config(cfg: &MainConfig) -> Result<Self> {
        Self::new(cfg.http_timeout())
    }

    /// Admin import endpoint for an entity kind
    pub fn import_url(env: &EnvironmentConfig, kind: DefinitionKind) -> String {
        let path = match kind {
            DefinitionKind::Api => "import/api",
            DefinitionKind::ApiProduct => "import/api-product",
            DefinitionKind::Application => "import/applications",
        };
        join_url(&env.admin_endpoint, path)
    }

    fn catalog_url(env: &EnvironmentConfig, kind: CatalogKind) -> String {
        match kind {
            CatalogKind::Apis => join_url(&env.publisher_endpoint, "apis"),
            CatalogKind::ApiProducts => join_url(&env.publisher_endpoint, "api-products"),
            CatalogKind::Applications => join_url(&env.devportal_endpoint, "applications"),
        }
    }

    /// Download an API Product archive from the admin export endpoint
    pub async fn export_api_product(
        &self,
        env: &EnvironmentConfig,
        token: Option<&str>,
        name: &str,
        version: &str,
        provider: &str,
        format: Option<&str>,
    ) -> Result<Vec<u8>> {
        let mut params = vec![
            ("name", name),
            ("version", version),
            ("providerName", provider),
        ];
        if let Some(format) = format {
            params.push(("format", format));
        }
        let endpoint = join_url(&env.admin_endpoint, "export/api-product");
        let url = Url::parse_with_params(&endpoint, &params).map_err(transport_error)?;
        tracing::debug!(url = %url, "exporting API Product");

        let req = self
            .client
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("application/zip"));
        let resp = authorized(req, token).send().await.map_err(transport_error)?;
        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(ImportError::RemoteFailure {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = resp.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }

    /// Delete an application by its identifier
    pub async fn delete_application(
        &self,
        env: &EnvironmentConfig,
        token: Option<&str>,
        id: &str,
    ) -> Result<TransportResponse> {
        let url = join_url(&env.devportal_endpoint, &format!("applications/{id}"));
        tracing::debug!(url = %url, "deleting application");
        let resp = authorized(self.client.delete(&url), token)
            .send()
            .await
            .map_err(transport_error)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(transport_error)?;
        Ok(TransportResponse { status, body })
    }
}

#[async_trait]
impl CatalogQuery for ApimClient {
    async fn search(
        &self,
        env: &EnvironmentConfig,
        kind: CatalogKind,
        query: &str,
        token: Option<&str>,
        cursor: Option<u64>,
    ) -> Result<CatalogPage> {
        let mut params = vec![("query", query.to_string())];
        if let Some(offset) = cursor {
            params.push(("offset", offset.to_string()));
        }
        let url = Url::parse_with_params(&Self::catalog_url(env, kind), &params)
            .map_err(transport_error)?;
        tracing::debug!(url = %url, "searching catalog");

        let resp = authorized(self.client.get(url), token)
            .send()
            .await
            .map_err(transport_error)?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ImportError::Auth(format!(
                "authorization failed while searching for '{query}'"
            )));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ImportError::RemoteFailure {
                status: status.as_u16(),
                body,
            });
        }
        resp.json::<CatalogPage>().await.map_err(transport_error)
    }
}

#[async_trait]
impl Transport for ApimClient {
    async fn upload(&self, request: &UploadRequest) -> Result<TransportResponse> {
        let url = Url::parse_with_params(&request.url, &request.params).map_err(transport_error)?;
        let data = tokio::fs::read(&request.file)
            .await
            .map_err(|e| ImportError::io(&request.file, e))?;
        let file_name = request
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact.zip".to_string());
        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(data).file_name(file_name));

        tracing::info!(url = %url, "uploading artifact");
        let resp = authorized(self.client.post(url), request.token.as_deref())
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(transport_error)?;
        Ok(TransportResponse { status, body })
    }
}

/// Reads bearer tokens from the environment variable named in each environment's auth block
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvTokenProvider;

#[async_trait]
impl TokenProvider for EnvTokenProvider {
    async fn token(&self, environment: &EnvironmentConfig) -> Result<Option<String>> {
        match &environment.auth {
            AuthConfig::None => Ok(None),
            AuthConfig::Bearer { token_env } => env::var(token_env).map(Some).map_err(|_| {
                ImportError::Auth(format!(
                    "environment variable '{token_env}' holding the token for '{}' is not set",
                    environment.name
                ))
            }),
        }
    }
}

fn authorized(req: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => req.bearer_auth(token),
        None => req,
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

fn transport_error(e: impl std::fmt::Display) -> ImportError {
    ImportError::Transport(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_env() -> EnvironmentConfig {
        EnvironmentConfig {
            name: "dev".into(),
            admin_endpoint: "https://apim.local/api/am/admin/v0.17/".into(),
            publisher_endpoint: "https://apim.local/api/am/publisher/v1".into(),
            devportal_endpoint: "https://apim.local/api/am/store/v1".into(),
            auth: AuthConfig::None,
        }
    }

    #[test]
    fn import_urls_per_kind() {
        assert_eq!(
            ApimClient::import_url(&dev_env(), DefinitionKind::Api),
            "https://apim.local/api/am/admin/v0.17/import/api"
        );
        assert_eq!(
            ApimClient::import_url(&dev_env(), DefinitionKind::ApiProduct),
            "https://apim.local/api/am/admin/v0.17/import/api-product"
        );
        assert_eq!(
            ApimClient::import_url(&dev_env(), DefinitionKind::Application),
            "https://apim.local/api/am/admin/v0.17/import/applications"
        );
    }

    #[test]
    fn application_catalog_lives_on_the_devportal() {
        assert_eq!(
            ApimClient::catalog_url(&dev_env(), CatalogKind::Applications),
            "https://apim.local/api/am/store/v1/applications"
        );
    }

    #[tokio::test]
    async fn bearer_token_comes_from_the_named_variable() {
        env::set_var("APIM_CLIENT_TEST_TOKEN", "t0k3n");
        let mut cfg = dev_env();
        cfg.auth = AuthConfig::Bearer {
            token_env: "APIM_CLIENT_TEST_TOKEN".into(),
        };
        let token = EnvTokenProvider.token(&cfg).await.unwrap();
        assert_eq!(token.as_deref(), Some("t0k3n"));

        cfg.auth = AuthConfig::Bearer {
            token_env: "APIM_CLIENT_TEST_TOKEN_UNSET".into(),
        };
        env::remove_var("APIM_CLIENT_TEST_TOKEN_UNSET");
        assert!(matches!(
            EnvTokenProvider.token(&cfg).await,
            Err(ImportError::Auth(_))
        ));
    }
}
