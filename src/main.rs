use clap::Parser;
use color_eyre::Result;
use instagram_exporter::{
    init_errors,
    init_logging,
    run,
    Args,
    Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_errors()?;
    let config = Config::new(Args::parse())?;
    init_logging(&config.log_level)?;
    config.log_sources();
    tracing::debug!(?config, "loaded config");
    config.validate()?;
    run(config).await
}
