use color_eyre::eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global subscriber. Logs go to stderr so stdout stays free for
/// the power report and `--once` output. `RUST_LOG` wins over the config level.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(&config.level, std::env::var("RUST_LOG").ok().as_deref())?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| eyre!("failed to set tracing subscriber: {e}"))
}

/// Run `f` with a stderr subscriber scoped to the current thread. Preview mode
/// reports startup warnings this way before the terminal is taken over.
pub fn scoped<R>(config: &LoggingConfig, f: impl FnOnce() -> R) -> Result<R> {
    let filter = build_filter(&config.level, std::env::var("RUST_LOG").ok().as_deref())?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    Ok(if config.json {
        tracing::subscriber::with_default(builder.json().finish(), f)
    } else {
        tracing::subscriber::with_default(builder.finish(), f)
    })
}

fn build_filter(level: &str, env: Option<&str>) -> Result<EnvFilter> {
    let directives = env.filter(|s| !s.trim().is_empty()).unwrap_or(level);
    EnvFilter::try_new(directives).map_err(|e| eyre!("invalid log level `{directives}`: {e}"))
}
