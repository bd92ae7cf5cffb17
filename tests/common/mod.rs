#![allow(dead_code)]

use apim_cli::config::{AuthConfig, EnvironmentConfig};
use apim_cli::dispatch::{Collaborators, ImportOptions};
use apim_cli::error::Result;
use apim_cli::pipeline::ImportRequest;
use apim_cli::remote::{
    CatalogKind, CatalogPage, CatalogQuery, EntitySummary, TokenProvider, Transport,
    TransportResponse, UploadRequest,
};
use async_trait::async_trait;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const PIZZA_API: &str = r#"id:
  providerName: admin
  apiName: PizzaAPI
  version: 1.0.0
context: /pizza
type: HTTP
endpointConfig:
  endpoint_type: http
  production_endpoints:
    url: https://prod.backend/pizza
endpointSecured: false
vendorExtension:
  owner: platform-team
"#;

/// Create `<dir>/<name>/Meta-information/<file>` with `content`
pub fn write_artifact(dir: &Path, name: &str, file: &str, content: &str) -> PathBuf {
    let root = dir.join(name);
    let meta = root.join("Meta-information");
    fs::create_dir_all(&meta).unwrap();
    fs::write(meta.join(file), content).unwrap();
    root
}

pub fn write_api(dir: &Path, content: &str) -> PathBuf {
    write_artifact(dir, "PizzaAPI", "api.yaml", content)
}

/// Zip `entries` (path, content) into `path`
pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, content) in entries {
        zip.start_file(*name, zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

pub fn dev_env() -> EnvironmentConfig {
    EnvironmentConfig {
        name: "dev".into(),
        admin_endpoint: "https://apim.local/api/am/admin/v0.17".into(),
        publisher_endpoint: "https://apim.local/api/am/publisher/v1".into(),
        devportal_endpoint: "https://apim.local/api/am/store/v1".into(),
        auth: AuthConfig::None,
    }
}

pub fn api_options(update: bool) -> ImportOptions {
    ImportOptions::Api {
        preserve_provider: true,
        update,
    }
}

/// Request whose scratch files live under `scratch` and whose params lookup stops at `working`
pub fn request(source: &Path, scratch: &Path, working: &Path, options: ImportOptions) -> ImportRequest {
    ImportRequest {
        source: source.to_string_lossy().into_owned(),
        environment: dev_env(),
        export_dir: working.join("exported"),
        import_url: "https://apim.local/api/am/admin/v0.17/import/api".into(),
        params_path: None,
        working_dir: working.to_path_buf(),
        scratch_root: Some(scratch.to_path_buf()),
        keep_workspace: false,
        options,
    }
}

pub fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

pub struct StaticToken(pub Option<&'static str>);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self, _env: &EnvironmentConfig) -> Result<Option<String>> {
        Ok(self.0.map(str::to_string))
    }
}

/// Catalog returning the same entries for every query
#[derive(Default)]
pub struct FakeCatalog {
    pub entries: Vec<EntitySummary>,
    pub queries: Mutex<Vec<(CatalogKind, String)>>,
}

impl FakeCatalog {
    pub fn with_ids(ids: &[&str]) -> Self {
        Self {
            entries: ids
                .iter()
                .map(|id| EntitySummary {
                    id: id.to_string(),
                    name: "PizzaAPI".into(),
                    version: "1.0.0".into(),
                })
                .collect(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<(CatalogKind, String)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogQuery for FakeCatalog {
    async fn search(
        &self,
        _env: &EnvironmentConfig,
        kind: CatalogKind,
        query: &str,
        _token: Option<&str>,
        _cursor: Option<u64>,
    ) -> Result<CatalogPage> {
        self.queries.lock().unwrap().push((kind, query.to_string()));
        Ok(CatalogPage {
            count: self.entries.len() as u64,
            list: self.entries.clone(),
        })
    }
}

/// What the fake transport saw for one upload
#[derive(Debug, Clone)]
pub struct Upload {
    pub request: UploadRequest,
    /// Entry names of the uploaded zip
    pub entries: Vec<String>,
    /// Content of the uploaded definition, if any
    pub definition: Option<String>,
}

pub struct FakeTransport {
    pub status: u16,
    pub body: String,
    pub uploads: Mutex<Vec<Upload>>,
}

impl FakeTransport {
    pub fn answering(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn upload(&self, request: &UploadRequest) -> Result<TransportResponse> {
        let mut archive = zip::ZipArchive::new(File::open(&request.file).unwrap()).unwrap();
        let entries: Vec<String> = archive.file_names().map(str::to_string).collect();
        let definition = entries
            .iter()
            .find(|n| n.ends_with("Meta-information/api.yaml"))
            .cloned()
            .map(|name| {
                let mut out = String::new();
                std::io::Read::read_to_string(&mut archive.by_name(&name).unwrap(), &mut out)
                    .unwrap();
                out
            });
        self.uploads.lock().unwrap().push(Upload {
            request: request.clone(),
            entries,
            definition,
        });
        Ok(TransportResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

pub fn collaborators<'a>(
    tokens: &'a StaticToken,
    catalog: &'a FakeCatalog,
    transport: &'a FakeTransport,
) -> Collaborators<'a> {
    Collaborators {
        tokens,
        catalog,
        transport,
    }
}
