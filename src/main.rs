mod config;
mod constants;
mod core_auth;
mod core_cli;
mod core_error;
mod core_ftpcommand;
mod core_log;
mod core_network;
mod core_transfer;
mod helpers;
mod session;

use crate::config::{log_config, Config};
use crate::core_cli::{Cli, Shell};
use crate::core_log::logger::init_logger;
use crate::core_network::ControlChannel;
use crate::session::Session;
use anyhow::{Context, Result};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    init_logger(args.verbose);

    // Configuration file first, command line on top of it
    let mut config = Config::load(args.config_path())?;
    let password = args.apply_to(&mut config.client)?;
    let client = config.client;
    log_config(&client);

    let mut control = ControlChannel::connect(&client.host, client.port, client.max_reply_len)
        .await
        .with_context(|| format!("Could not connect to {}:{}", client.host, client.port))?;
    control
        .read_reply()
        .await
        .context("Server closed the connection before sending its banner")?;

    let mut shell = Shell::new();
    let credentials = shell
        .login(&mut control, client.username.clone(), password)
        .await?;

    let session = Session::new(control, credentials, &client);
    shell.run(session).await
}
