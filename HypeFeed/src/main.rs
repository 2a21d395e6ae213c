use hfconfig::get_config;
use hfhypem::{HypemConfigExt, HypemServerExt};
use hfserver::{ServerBuilder, init_logging, logs::LoggingOptions};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_state = init_logging(LoggingOptions::from_config());

    let config = get_config();
    info!("🔧 Configuration loaded from {}", config.config_dir());
    if config.get_hypem_session()?.is_none() {
        warn!("⚠️ No hypem session cookie configured, feeds will likely be empty or rejected");
    }

    let mut server = ServerBuilder::new_configured().build();
    server
        .add_route("/info", || async {
            serde_json::json!({
                "name": "HypeFeed",
                "version": env!("CARGO_PKG_VERSION"),
            })
        })
        .await;

    info!("🎵 Initializing hypem feed...");
    server.init_hypem_feed().await?;

    server.start().await?;
    let server_info = server.info();
    info!(
        "✅ {} listening on http://{}:{}",
        server_info.name, server_info.base_url, server_info.http_port
    );

    server.wait().await;
    Ok(())
}
