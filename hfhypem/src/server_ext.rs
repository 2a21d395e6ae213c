//! Extension hfserver pour hypem
//!
//! Ce module fournit un trait d'extension pour publier le flux hypem
//! sur un serveur hfserver.

use crate::config_ext::HypemSettings;
use anyhow::Result;
use std::sync::Arc;

/// État partagé pour les handlers hypem
#[derive(Clone)]
pub struct HypemState {
    pub settings: Arc<HypemSettings>,
}

impl HypemState {
    pub fn new(settings: HypemSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }
}

/// Trait pour étendre hfserver avec le flux hypem
///
/// Ce trait permet à `hfhypem` d'ajouter des méthodes d'extension sur
/// `hfserver::Server` sans que hfserver dépende de hfhypem.
///
/// # Exemple
///
/// ```rust,no_run
/// use hfhypem::HypemServerExt;
/// use hfserver::ServerBuilder;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut server = ServerBuilder::new_configured().build();
///     server.init_hypem_feed().await?;
///
///     server.start().await?;
///     server.wait().await;
///     Ok(())
/// }
/// ```
pub trait HypemServerExt {
    /// Lit les réglages depuis hfconfig et enregistre les routes HTTP
    ///
    /// # Routes enregistrées
    ///
    /// - `GET /api/hypem/feed` - Le flux JSON
    /// - `GET /<n'importe quel chemin>` - Le même flux, en route par défaut
    async fn init_hypem_feed(&mut self) -> Result<Arc<HypemState>>;

    /// Comme `init_hypem_feed()`, avec des réglages fournis
    async fn init_hypem_feed_with_settings(
        &mut self,
        settings: HypemSettings,
    ) -> Result<Arc<HypemState>>;
}

// L'implémentation du trait est dans server_impl.rs
