use crate::config::{load_main_config, save_main_config, AuthConfig, EnvironmentConfig};
use anyhow::{anyhow, Result};
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum EnvCommands {
    /// List all configured environments
    List,
    /// Add a new environment
    Add {
        name: String,
        /// Admin REST API base URL (import/export)
        #[arg(long)]
        admin: String,
        /// Publisher REST API base URL
        #[arg(long)]
        publisher: String,
        /// Developer portal REST API base URL
        #[arg(long)]
        devportal: String,
        /// Environment variable holding the bearer token
        #[arg(long)]
        token_env: Option<String>,
    },
    /// Remove an environment by name
    Remove { name: String },
}

pub fn run(cmd: EnvCommands) -> Result<()> {
    let mut main_cfg = load_main_config()?;

    match cmd {
        EnvCommands::List => {
            if main_cfg.environments.is_empty() {
                println!("(no environments defined)");
            } else {
                for e in &main_cfg.environments {
                    println!(" - {} → {} (auth={:?})", e.name, e.admin_endpoint, e.auth);
                }
            }
        }
        EnvCommands::Add {
            name,
            admin,
            publisher,
            devportal,
            token_env,
        } => {
            if name.trim().is_empty() {
                return Err(anyhow!("environment name cannot be empty"));
            }
            if main_cfg.environments.iter().any(|e| e.name == name) {
                return Err(anyhow!("environment '{}' already exists", name));
            }
            let auth = match token_env {
                Some(token_env) => AuthConfig::Bearer { token_env },
                None => AuthConfig::None,
            };
            main_cfg.environments.push(EnvironmentConfig {
                name: name.clone(),
                admin_endpoint: admin,
                publisher_endpoint: publisher,
                devportal_endpoint: devportal,
                auth,
            });
            let path = save_main_config(&main_cfg)?;
            println!("✅ Added environment '{name}' to {}", path.display());
        }
        EnvCommands::Remove { name } => {
            let before = main_cfg.environments.len();
            main_cfg.environments.retain(|e| e.name != name);
            if main_cfg.environments.len() == before {
                println!("no such environment '{name}'");
            } else {
                save_main_config(&main_cfg)?;
                println!("removed '{name}'");
            }
        }
    }

    Ok(())
}
