use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tempo_uci::UciEngine;

fn main() -> Result<()> {
    // UCI talks on stdout; keep diagnostics on stderr so the protocol stream stays clean.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("tempo starting");
    UciEngine::new().run()?;
    Ok(())
}
