use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber. `RUST_LOG` is honoured on top of info
/// level for the smartcity crates.
pub fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("smartcity=info".parse()?)
        .add_directive("smartcity_mq=info".parse()?)
        .add_directive("smartcity_store=info".parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}
