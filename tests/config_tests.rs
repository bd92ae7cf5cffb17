use apim_cli::config::{self, AuthConfig, EnvironmentConfig, MainConfig};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_main_config_expands_placeholders() {
    std::env::set_var("APIM_CONFIG_TEST_HOST", "apim.internal");
    std::env::remove_var("APIM_CONFIG_TEST_TIMEOUT");
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("main_config.yaml");
    fs::write(
        &path,
        r#"
exportDirectory: /srv/apim/exported
httpRequestTimeout: ${APIM_CONFIG_TEST_TIMEOUT:-60}
environments:
  - name: dev
    adminEndpoint: https://${APIM_CONFIG_TEST_HOST}/api/am/admin/v0.17
    publisherEndpoint: https://${APIM_CONFIG_TEST_HOST}/api/am/publisher/v1
    devportalEndpoint: https://${APIM_CONFIG_TEST_HOST}/api/am/store/v1
    auth:
      type: bearer
      tokenEnv: APIM_DEV_TOKEN
"#,
    )
    .unwrap();

    let cfg = config::load_main_config_from(&path).unwrap();
    assert_eq!(cfg.http_timeout(), Duration::from_secs(60));
    let dev = cfg.environment("dev").unwrap();
    assert_eq!(dev.admin_endpoint, "https://apim.internal/api/am/admin/v0.17");
    assert!(matches!(&dev.auth, AuthConfig::Bearer { token_env } if token_env == "APIM_DEV_TOKEN"));

    let err = cfg.environment("prod").unwrap_err().to_string();
    assert!(err.contains("Available environments: dev"));
}

#[test]
fn test_missing_main_config_is_empty() {
    let dir = TempDir::new().unwrap();
    let cfg = config::load_main_config_from(&dir.path().join("absent.yaml")).unwrap();
    assert!(cfg.environments.is_empty());
    assert_eq!(cfg.http_timeout(), Duration::from_secs(300));
}

#[test]
fn test_saved_config_loads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/main_config.yaml");
    let cfg = MainConfig {
        environments: vec![EnvironmentConfig {
            name: "prod".into(),
            admin_endpoint: "https://apim.prod/admin".into(),
            publisher_endpoint: "https://apim.prod/publisher".into(),
            devportal_endpoint: "https://apim.prod/store".into(),
            auth: AuthConfig::Bearer {
                token_env: "APIM_PROD_TOKEN".into(),
            },
        }],
        ..Default::default()
    };

    config::save_main_config_to(&cfg, &path).unwrap();
    let saved = fs::read_to_string(&path).unwrap();
    assert!(saved.contains("type: bearer"));
    assert!(saved.contains("tokenEnv: APIM_PROD_TOKEN"));

    let loaded = config::load_main_config_from(&path).unwrap();
    assert_eq!(loaded.environments[0].devportal_endpoint, "https://apim.prod/store");
}
