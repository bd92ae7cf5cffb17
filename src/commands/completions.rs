use clap::CommandFactory;
use clap_complete::{generate, shells::{Bash, Zsh, Fish}};
use std::io;
use anyhow::{anyhow, Result};
use crate::Cli;

pub fn run(shell: String) -> Result<()> {
    let mut cmd = Cli::command();
    match shell.as_str() {
        "bash" => generate(Bash, &mut cmd, "apim", &mut io::stdout()),
        "zsh"  => generate(Zsh, &mut cmd, "apim", &mut io::stdout()),
        "fish" => generate(Fish, &mut cmd, "apim", &mut io::stdout()),
        other => return Err(anyhow!("unsupported shell '{}', choose: bash, zsh, fish", other)),
    }
    Ok(())
}
