use brrtbind::cli::run_cli;
use brrtbind::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    let mut config = LogConfig::from_env();
    if std::env::var("BRRTB_LOG_LEVEL").is_err() {
        config.log_level = "warn".to_string();
    }
    init_logging_with_config(&config)?;

    if !run_cli()? {
        std::process::exit(1);
    }
    Ok(())
}
