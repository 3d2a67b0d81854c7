use anyhow::{Result, anyhow};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Default directive when `RUST_LOG` is unset.
fn default_level(verbose: bool) -> Level {
    if verbose { Level::DEBUG } else { Level::WARN }
}

fn build_filter(verbose: bool, env: Option<&str>) -> Result<EnvFilter> {
    match env.map(str::trim).filter(|value| !value.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .map_err(|err| anyhow!("invalid RUST_LOG directives {:?}: {}", directives, err)),
        None => Ok(EnvFilter::default().add_directive(default_level(verbose).into())),
    }
}

/// Logs to stderr so stdout stays pure JSON. `RUST_LOG` overrides the
/// level chosen by `--verbose`.
pub fn init(verbose: bool) -> Result<()> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(verbose, env.as_deref())?;
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
    Ok(())
}
