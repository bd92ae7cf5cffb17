use std::process::Command;
use tempfile::TempDir;

fn apim(config_dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_apim"));
    cmd.env(
        "APIM_CONFIG_PATH",
        config_dir.path().join("main_config.yaml"),
    );
    cmd
}

#[test]
fn test_cli_help_command() {
    let temp_dir = TempDir::new().unwrap();
    let output = apim(&temp_dir)
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("apim"));
    assert!(stdout.contains("import-api"));
}

#[test]
fn test_cli_env_add_list_remove() {
    let temp_dir = TempDir::new().unwrap();

    let output = apim(&temp_dir)
        .args(["env", "list"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("no environments defined"));

    let output = apim(&temp_dir)
        .args([
            "env",
            "add",
            "dev",
            "--admin",
            "https://localhost:9443/api/am/admin/v0.17",
            "--publisher",
            "https://localhost:9443/api/am/publisher/v1",
            "--devportal",
            "https://localhost:9443/api/am/store/v1",
            "--token-env",
            "APIM_DEV_TOKEN",
        ])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    let saved = std::fs::read_to_string(temp_dir.path().join("main_config.yaml")).unwrap();
    assert!(saved.contains("tokenEnv: APIM_DEV_TOKEN"));

    let output = apim(&temp_dir)
        .args(["env", "list"])
        .output()
        .expect("Failed to execute command");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("dev → https://localhost:9443/api/am/admin/v0.17"));

    let output = apim(&temp_dir)
        .args(["env", "remove", "dev"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("removed 'dev'"));
}

#[test]
fn test_cli_import_unknown_environment_fails() {
    let temp_dir = TempDir::new().unwrap();
    let output = apim(&temp_dir)
        .args(["import-api", "-f", "./PizzaAPI", "-e", "missing"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("environment 'missing' is not configured"));
}
