//! File names and fixed values shared across the import pipeline.

/// Name of the main configuration file
pub const MAIN_CONFIG_FILE: &str = "main_config.yaml";
/// Environment variable overriding the main configuration path
pub const MAIN_CONFIG_PATH_ENV: &str = "APIM_CONFIG_PATH";

/// Override-parameters file looked up next to the artifact or in the working directory
pub const PARAMS_FILE: &str = "api_params.yaml";

/// Directory holding the definition and generated metadata inside an artifact
pub const META_INFORMATION_DIR: &str = "Meta-information";
/// Base name of the API / API Product definition (without extension)
pub const API_DEFINITION_BASE: &str = "api";
/// Base name of the Application definition (without extension)
pub const APPLICATION_DEFINITION_BASE: &str = "application";
/// Generated endpoint certificates file
pub const ENDPOINT_CERTIFICATES_FILE: &str = "endpoint_certificates.yaml";

/// Artifact sub-paths whose files receive `${VAR}` substitution
pub const ENV_SUBSTITUTION_PATHS: &[&str] = &["Meta-information", "Sequences"];
/// Directory of an API Product artifact holding its dependent APIs
pub const DEPENDENT_APIS_DIR: &str = "APIs";

/// Default export directory below the user's home
pub const DEFAULT_EXPORT_DIR: &str = ".apim/exported";
pub const EXPORTED_APIS_DIR: &str = "apis";
pub const EXPORTED_API_PRODUCTS_DIR: &str = "api-products";
pub const EXPORTED_APPS_DIR: &str = "apps";

/// Catalog type filter used when looking up API Products
pub const API_PRODUCT_TYPE: &str = "APIProduct";
/// Version used when exporting an API Product without an explicit version
pub const DEFAULT_API_PRODUCT_VERSION: &str = "1.0.0";
/// Implementation type of an endpoint-backed API
pub const DEFAULT_IMPLEMENTATION: &str = "ENDPOINT";
/// Placeholder in context templates replaced by the API version
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Default HTTP request timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;
