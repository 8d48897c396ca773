use anyhow::Context;
use clap::Parser;
use isd_weather_stats::cli::{run, Cli};
use isd_weather_stats::logging::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref()).context("failed to initialise logging")?;

    run(cli).await.context("isd-stats failed")
}
