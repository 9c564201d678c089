use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use tracing::info;

use crate::config::ServerConfig;
use crate::handler;

pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let routes = handler::routes(config.dir.clone());

    let (bound, server) = warp::serve(routes).try_bind_with_graceful_shutdown(addr, async {
        // Shut down on Ctrl+C; if the signal cannot be installed, run until killed.
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    })?;

    info!("[apimock] Starting -> http://localhost:{}", bound.port());
    info!("Mock directory: {}", config.dir.display());
    log_mock_dir(&config.dir);
    info!("Press Ctrl+C to stop");

    server.await;
    info!("Server stopped");
    Ok(())
}

/// Logs the top level of the mock directory: sub-directories and mock files.
fn log_mock_dir(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    let mut entries: Vec<_> = entries.filter_map(Result::ok).collect();
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            info!("  └─ 📁 {}/", name);
        } else if name.ends_with(".json") {
            info!("  ├─ 📄 {}", name);
        }
    }
}
