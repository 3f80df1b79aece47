use std::path::Path;

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "credit-overlay",
    version,
    about = "Overlay styled credit labels onto remote images"
)]
struct Cli {
    /// Listen address (default: [server] addr from settings)
    #[arg(short = 'a', long = "addr")]
    addr: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    credit_overlay::logging::init(cli.verbose)?;
    let extra_settings = cli.read_settings.as_deref().map(Path::new);
    let settings = credit_overlay::settings::load_settings(extra_settings)?;
    let addr = cli.addr.unwrap_or_else(|| settings.server_addr.clone());
    credit_overlay::server::run_server(settings, addr).await
}
