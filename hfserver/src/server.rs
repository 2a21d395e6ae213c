//! # Module Server - API de haut niveau pour Axum
//!
//! Ce module fournit une abstraction simple pour créer le serveur HTTP
//! de HypeFeed avec Axum, en cachant la configuration et le routage.
//!
//! ## Fonctionnalités
//!
//! - **Routes JSON simples** : endpoints API avec `add_route()`
//! - **Handlers avec état** : `add_handler_with_state()`
//! - **Route par défaut** : n'importe quel chemin avec `add_fallback_with_state()`
//! - **Gestion gracieuse** : arrêt propre sur Ctrl+C

use axum::handler::Handler;
use axum::routing::get;
use axum::{Json, Router};
use hfconfig::get_config;
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{signal, sync::RwLock, task::JoinHandle};
use tracing::{error, info};

/// Info serveur sérialisable
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub base_url: String,
    pub http_port: u16,
}

/// Serveur principal
pub struct Server {
    name: String,
    base_url: String,
    http_port: u16,
    router: Arc<RwLock<Router>>,
    join_handle: Option<JoinHandle<()>>,
}

impl Server {
    /// Crée une nouvelle instance de serveur
    ///
    /// # Arguments
    ///
    /// * `name` - Nom du serveur (pour les logs)
    /// * `base_url` - Nom d'hôte annoncé (ex: "localhost")
    /// * `http_port` - Port HTTP à écouter
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            http_port,
            router: Arc::new(RwLock::new(Router::new())),
            join_handle: None,
        }
    }

    pub fn new_configured() -> Self {
        let config = get_config();
        Self::new("HypeFeed", config.get_base_url(), config.get_http_port())
    }

    /// Ajoute une route JSON dynamique
    ///
    /// La closure fournie est appelée à chaque requête GET sur `path`.
    ///
    /// # Exemple
    ///
    /// ```rust,no_run
    /// # use hfserver::Server;
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let mut server = Server::new("Test", "localhost", 3000);
    /// server.add_route("/info", || async {
    ///     serde_json::json!({"version": "0.1.0"})
    /// }).await;
    /// # }
    /// ```
    pub async fn add_route<F, Fut, T>(&mut self, path: &str, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let f = Arc::new(f);
        let handler = move || {
            let f = f.clone();
            async move { Json(f().await) }
        };

        let route = Router::new().route("/", get(handler));
        self.mount(path, route).await;
    }

    /// Ajoute un handler GET avec état
    pub async fn add_handler_with_state<H, T, S>(&mut self, path: &str, handler: H, state: S)
    where
        H: Handler<T, S> + Clone + 'static,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        let route = Router::new().route("/", get(handler)).with_state(state);
        self.mount(path, route).await;
    }

    /// Installe un handler pour toutes les requêtes qu'aucune route ne prend
    pub async fn add_fallback_with_state<H, T, S>(&mut self, handler: H, state: S)
    where
        H: Handler<T, S> + Clone + 'static,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        let route = Router::new().fallback(handler).with_state(state);
        let mut r = self.router.write().await;
        *r = std::mem::take(&mut *r).merge(route);
    }

    /// Ajoute un sous-router au serveur
    ///
    /// - Si `path` est "/", merge directement au router principal
    /// - Sinon, nest le router sous le chemin donné
    pub async fn add_router(&mut self, path: &str, sub_router: Router) {
        let normalized = format!("/{}", path.trim_start_matches('/'));
        let mut r = self.router.write().await;
        *r = if normalized == "/" {
            std::mem::take(&mut *r).merge(sub_router)
        } else {
            std::mem::take(&mut *r).nest(&normalized, sub_router)
        };
    }

    async fn mount(&mut self, path: &str, route: Router) {
        let mut r = self.router.write().await;
        *r = if path == "/" {
            std::mem::take(&mut *r).merge(route)
        } else {
            std::mem::take(&mut *r).nest(path, route)
        };
    }

    /// Copie du router courant, pour servir les requêtes sans socket (tests)
    pub async fn router(&self) -> Router {
        self.router.read().await.clone()
    }

    /// Démarre le serveur HTTP
    ///
    /// Lance le serveur sur le port configuré et met en place la gestion
    /// de Ctrl+C pour un arrêt gracieux.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(
            "Server {} running at http://{}:{}",
            self.name, self.base_url, self.http_port
        );

        let router = self.router.read().await.clone();
        let server_task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router.into_make_service()).await {
                error!("HTTP server stopped: {}", e);
            }
        });

        let shutdown_task = tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => info!("Ctrl+C reçu, arrêt gracieux"),
                Err(e) => error!("failed to listen for ctrl_c: {}", e),
            }
        });

        self.join_handle = Some(tokio::spawn(async move {
            tokio::select! {
                _ = server_task => {},
                _ = shutdown_task => {},
            }
        }));
        Ok(())
    }

    /// Attend la fin du serveur
    pub async fn wait(&mut self) {
        if let Some(h) = self.join_handle.take() {
            let _ = h.await;
        }
    }

    /// Récupère les infos du serveur
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            name: self.name.clone(),
            base_url: self.base_url.clone(),
            http_port: self.http_port,
        }
    }
}

/// Builder pattern
pub struct ServerBuilder {
    name: String,
    base_url: String,
    http_port: u16,
}

impl ServerBuilder {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            http_port,
        }
    }

    pub fn new_configured() -> Self {
        let config = get_config();
        Self {
            name: "HypeFeed".to_string(),
            base_url: config.get_base_url(),
            http_port: config.get_http_port(),
        }
    }

    /// Construit le serveur
    pub fn build(self) -> Server {
        Server::new(self.name, self.base_url, self.http_port)
    }
}
