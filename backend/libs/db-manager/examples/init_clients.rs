//! Initializes every client type named on the command line
//!
//! Run with:
//! ```bash
//! DB_MANAGER_CONFIG_PATH=./conf RUST_LOG=debug \
//!     cargo run --example init_clients -- es.default redis.default
//! ```

use anyhow::Context;
use db_manager::{BackendKind, ClientSet};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut clients = ClientSet::from_env();
    println!("Config: {:?}", clients.config_location());

    for client_type in std::env::args().skip(1) {
        let kind = clients
            .initialize(&client_type)
            .await
            .with_context(|| format!("failed to initialize {}", client_type))?;
        println!("✓ {} ready ({})", client_type, kind);
    }

    for kind in BackendKind::ALL {
        println!("{:<7} initialized: {}", kind, clients.is_initialized(kind));
    }

    Ok(())
}
