//! Narrow interfaces to the remote management service
//!
//! The pipeline only talks to the outside world through these traits:
//! [`TokenProvider`] for credentials, [`CatalogQuery`] for existence lookups
//! and [`Transport`] for the multipart upload. [`crate::client::ApimClient`]
//! is the HTTP implementation; tests supply in-memory fakes.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::EnvironmentConfig;
use crate::error::Result;

/// Catalog searched by an existence lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Apis,
    ApiProducts,
    Applications,
}

/// Summary of one catalog entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EntitySummary {
    #[serde(alias = "applicationId")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// One page of catalog results
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogPage {
    pub count: u64,
    #[serde(default)]
    pub list: Vec<EntitySummary>,
}

/// Multipart POST of a single file
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub url: String,
    pub file: PathBuf,
    pub token: Option<String>,
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Supplies a bearer token for an environment; `None` means anonymous
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self, env: &EnvironmentConfig) -> Result<Option<String>>;
}

#[async_trait]
pub trait CatalogQuery: Send + Sync {
    async fn search(
        &self,
        env: &EnvironmentConfig,
        kind: CatalogKind,
        query: &str,
        token: Option<&str>,
        cursor: Option<u64>,
    ) -> Result<CatalogPage>;
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn upload(&self, request: &UploadRequest) -> Result<TransportResponse>;
}
