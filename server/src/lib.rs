use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{Router, routing::get};
use htmldisplay_core::{ActionId, ConnectionEvent, ContentKind, ContentRecord};
use htmldisplay_render::Buffer;
use tokio::{net::TcpListener, sync::OnceCell};
use tower_http::trace::TraceLayer;

mod handlers;
mod state;
mod websocket;

pub mod action;
pub mod args;
pub mod launcher;
pub mod safety;
pub mod tracker;

pub use crate::{
    action::{
        DisplayAction, IconSink, LogIconSink, MarkdownAction, PreviewAction, PreviewSettings,
        WindowState,
    },
    launcher::{SystemLauncher, WindowLauncher},
    tracker::{SubscriberId, Subscription},
};
use crate::{state::AppState, tracker::ConnectionTracker};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to listen on. The port is always picked by the OS.
    pub bind_ip: IpAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
        }
    }
}

/// Local server that serves registered preview content to browser windows
/// and tracks which of those windows are open.
///
/// Cloning yields another handle to the same server.
#[derive(Clone)]
pub struct PreviewServer(Arc<PreviewServerInner>);

struct PreviewServerInner {
    config: ServerConfig,
    state: AppState,
    port: OnceCell<u16>,
}

impl PreviewServer {
    pub fn new(config: ServerConfig) -> Self {
        Self(Arc::new(PreviewServerInner {
            config,
            state: AppState::default(),
            port: OnceCell::new(),
        }))
    }

    /// Bind the listener and start serving.
    ///
    /// Only the first call binds; later calls return the same port.
    pub async fn start(&self) -> anyhow::Result<u16> {
        let port = self.0.port.get_or_try_init(|| self.bind()).await?;
        Ok(*port)
    }

    async fn bind(&self) -> anyhow::Result<u16> {
        let addr = SocketAddr::new(self.0.config.bind_ip, 0);
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind preview server to {addr}"))?;
        let port = listener
            .local_addr()
            .context("failed to read preview server address")?
            .port();

        let app = router(self.0.state.clone());
        tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, app).await {
                tracing::error!("preview server stopped: {error}");
            }
        });

        tracing::info!("preview server listening on port {port}");
        Ok(port)
    }

    /// Bound port, or 0 before [`Self::start`] completed.
    pub fn port(&self) -> u16 {
        self.0.port.get().copied().unwrap_or(0)
    }

    pub fn base_url(&self) -> String {
        let ip = self.0.config.bind_ip;
        if ip.is_loopback() || ip.is_unspecified() {
            format!("http://localhost:{}", self.port())
        } else {
            format!("http://{}", SocketAddr::new(ip, self.port()))
        }
    }

    pub fn view_url(&self, action_id: &ActionId) -> String {
        let mut url = Buffer::from(self.base_url());
        url.push_str("/view/");
        url.push_uri(action_id);
        url.into()
    }

    /// Set the content served for `action_id`. The payload is validated when
    /// it is served, not here.
    pub fn register_content(&self, action_id: ActionId, kind: ContentKind, payload: impl Into<String>) {
        let record = ContentRecord {
            kind,
            payload: payload.into(),
        };
        self.0.state.register_content(action_id, record);
    }

    pub fn unregister_content(&self, action_id: &ActionId) -> bool {
        self.0.state.unregister_content(action_id)
    }

    pub fn lookup(&self, action_id: &ActionId) -> Option<ContentRecord> {
        self.0.state.content(action_id)
    }

    pub fn has_connection(&self, action_id: &ActionId) -> bool {
        self.tracker().is_connected(action_id)
    }

    /// Ask the window of `action_id` to close. No-op without an open window.
    pub fn close_window(&self, action_id: &ActionId) {
        if self.tracker().close_window(action_id) {
            tracing::info!("closing preview window for action {action_id}");
        }
    }

    pub fn subscribe(&self) -> Subscription {
        self.tracker().subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.tracker().unsubscribe(id)
    }

    /// Call `listener` for every connection change until it is removed with
    /// [`Self::unsubscribe`]. Must be called within a Tokio runtime.
    pub fn on_connection_change<F>(&self, mut listener: F) -> SubscriberId
    where
        F: FnMut(ConnectionEvent) + Send + 'static,
    {
        let subscription = self.subscribe();
        let id = subscription.id();

        tokio::spawn(async move {
            while let Ok(event) = subscription.recv().await {
                listener(event);
            }
        });

        id
    }

    fn tracker(&self) -> &ConnectionTracker {
        self.0.state.tracker()
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(websocket::websocket_handler))
        .route("/view/{action_id}", get(handlers::view))
        .route("/static/{action_id}/{*asset_path}", get(handlers::static_asset))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
