//! Export of API Products from an environment into the export directory

use std::fs;
use std::path::{Path, PathBuf};

use crate::client::ApimClient;
use crate::config::EnvironmentConfig;
use crate::constants::{DEFAULT_API_PRODUCT_VERSION, EXPORTED_API_PRODUCTS_DIR};
use crate::error::{ImportError, Result};
use crate::remote::TokenProvider;

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub name: String,
    /// Defaults to `1.0.0`
    pub version: Option<String>,
    pub provider: String,
    /// `json` or `yaml`; server default when `None`
    pub format: Option<String>,
    pub environment: EnvironmentConfig,
    pub export_dir: PathBuf,
    /// Print the location of the written archive
    pub announce: bool,
}

impl ExportRequest {
    pub fn version(&self) -> &str {
        self.version
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_API_PRODUCT_VERSION)
    }

    /// `<export>/api-products/<env>/<name>_<version>.zip`
    pub fn archive_path(&self) -> PathBuf {
        self.export_dir
            .join(EXPORTED_API_PRODUCTS_DIR)
            .join(&self.environment.name)
            .join(format!("{}_{}.zip", self.name, self.version()))
    }
}

/// Download the API Product and write it below the export directory
pub async fn export_api_product(
    client: &ApimClient,
    tokens: &dyn TokenProvider,
    request: &ExportRequest,
) -> Result<PathBuf> {
    let token = tokens.token(&request.environment).await?;
    let data = client
        .export_api_product(
            &request.environment,
            token.as_deref(),
            &request.name,
            request.version(),
            &request.provider,
            request.format.as_deref(),
        )
        .await?;

    let path = request.archive_path();
    write_archive(&path, &data)?;
    if request.announce {
        println!(
            "✅ Successfully exported API Product '{}' to {}",
            request.name,
            path.display()
        );
    }
    Ok(path)
}

pub fn write_archive(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ImportError::io(parent, e))?;
    }
    tracing::debug!(path = %path.display(), "writing exported archive");
    fs::write(path, data).map_err(|e| ImportError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_path_defaults_the_version() {
        let request = ExportRequest {
            name: "LeasingProduct".into(),
            version: None,
            provider: "admin".into(),
            format: None,
            environment: EnvironmentConfig {
                name: "prod".into(),
                ..Default::default()
            },
            export_dir: PathBuf::from("/exports"),
            announce: false,
        };
        assert_eq!(
            request.archive_path(),
            PathBuf::from("/exports/api-products/prod/LeasingProduct_1.0.0.zip")
        );
    }
}
