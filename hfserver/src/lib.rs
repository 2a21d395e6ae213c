//! # hfserver - Serveur web haut niveau basé sur Axum
//!
//! Cette crate fournit le serveur HTTP de HypeFeed et l'initialisation
//! des logs. Les fonctionnalités métier s'y greffent par des traits
//! d'extension (voir `hfhypem::HypemServerExt`), sans que hfserver ne
//! les connaisse.
//!
//! - [`server`] : serveur principal et builder
//! - [`logs`] : subscriber `tracing` configuré depuis hfconfig
//!
//! ## Exemple d'utilisation
//!
//! ```rust,no_run
//! use hfserver::{ServerBuilder, logs::{init_logging, LoggingOptions}};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     init_logging(LoggingOptions::from_config());
//!
//!     let mut server = ServerBuilder::new_configured().build();
//!     server.add_route("/info", || async {
//!         serde_json::json!({"status": "ok"})
//!     }).await;
//!
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

pub mod logs;
pub mod server;

pub use logs::{init_logging, LogState, LoggingOptions};
pub use server::{Server, ServerBuilder, ServerInfo};
