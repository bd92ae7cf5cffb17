use anyhow::{anyhow, Context, Result};
use clap::Args;

use crate::client::{ApimClient, EnvTokenProvider};
use crate::config::load_main_config;
use crate::definition::{DefinitionKind, Identity};
use crate::dispatch::find_existing;
use crate::remote::TokenProvider;

#[derive(Args, Debug)]
pub struct DeleteAppArgs {
    /// Name of the application
    #[arg(short, long)]
    pub name: String,
    #[arg(short, long)]
    pub environment: String,
}

pub async fn run(args: DeleteAppArgs) -> Result<()> {
    let main_cfg = load_main_config()?;
    let env = main_cfg.environment(&args.environment)?;
    let client = ApimClient::from_config(&main_cfg)?;
    let token = EnvTokenProvider.token(env).await?;

    let identity = Identity {
        name: args.name.clone(),
        ..Default::default()
    };
    let id = find_existing(
        &client,
        env,
        DefinitionKind::Application,
        &identity,
        token.as_deref(),
    )
    .await
    .with_context(|| format!("looking up application '{}'", args.name))?
    .ok_or_else(|| anyhow!("application '{}' not found in '{}'", args.name, env.name))?;

    let resp = client
        .delete_application(env, token.as_deref(), &id)
        .await
        .with_context(|| format!("deleting application '{}'", args.name))?;
    match resp.status {
        200 | 204 => println!("🗑️  Deleted application '{}' ({id})", args.name),
        401 => return Err(anyhow!("invalid credentials or you may not have enough permission")),
        status => {
            return Err(anyhow!(
                "deleting application '{}' failed with status {status}: {}",
                args.name,
                resp.body
            ))
        }
    }
    Ok(())
}
