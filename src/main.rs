use anyhow::Result;
use clap::Parser;

use indexwatch::application::commands::{Cli, CommandExecutor, Commands};
use indexwatch::shared::config::ConfigLoader;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Cli::parse();

    let mut config = ConfigLoader::load(&args.config)?;

    // CLI overrides take priority over the config file.
    if let Commands::Run {
        interval_secs: Some(secs),
    } = &args.command
    {
        config.check_interval_secs = *secs;
    }

    let executor = CommandExecutor::new(config)?;
    executor.execute(args.command).await?;
    Ok(())
}
