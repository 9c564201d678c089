use std::path::PathBuf;

use apimock::config::{ConfigOverrides, ServerConfig, home_dir};
use apimock::server;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(version, about = "File based mock API server")]
struct Args {
    /// Mock directory (overrides .apimockrc, defaults to "mock")
    #[arg(short, long)]
    dir: Option<PathBuf>,
    /// Port number (overrides .apimockrc, defaults to 8080)
    #[arg(short, long)]
    port: Option<u16>,
    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = ConfigOverrides {
        dir: args.dir,
        port: args.port,
    };
    let cwd = std::env::current_dir()?;
    let config = ServerConfig::resolve(home_dir().as_deref(), &cwd, cli);

    config.validate()?;

    server::start_server(config).await
}
