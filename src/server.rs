use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::booking::BookingService;
use crate::catalog::RoomCatalog;
use crate::config::Config;
use crate::contact::ContactService;
use crate::db::Pool;
use crate::gateway::PaymentGateway;
use crate::handlers;
use crate::mailer::Mailer;
use crate::model::Language;
use crate::pages::PageRouter;
use crate::pricing::RateTable;

/// Shared per-process state handed to every handler.
pub struct AppState {
    pub pool: Pool,
    pub catalog: RoomCatalog,
    pub bookings: BookingService,
    pub contact: ContactService,
    pub pages: PageRouter,
    pub client_key: String,
    pub is_production: bool,
    pub default_language: Language,
}

impl AppState {
    pub fn new(
        cfg: &Config,
        pool: Pool,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            catalog: RoomCatalog::new(pool.clone()),
            bookings: BookingService::new(
                pool.clone(),
                RateTable::default(),
                gateway,
                cfg.finish_url(),
            ),
            contact: ContactService::new(pool.clone(), mailer, cfg.contact.clone()),
            pages: PageRouter::new(&cfg.site.templates_dir),
            client_key: cfg.gateway.client_key.clone(),
            is_production: cfg.gateway.is_production,
            default_language: cfg.app.default_language,
            pool,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::index))
        .route("/rooms/", get(handlers::rooms))
        .route(
            "/booking/",
            get(handlers::booking_page).post(handlers::submit_booking),
        )
        .route(
            "/contact/",
            get(handlers::contact_page).post(handlers::submit_contact),
        )
        .route(
            "/payment/",
            post(handlers::payment_notification).fallback(handlers::payment_method_not_allowed),
        )
        .route("/payment/finish/", get(handlers::payment_finish))
        .route("/{page}/", get(handlers::page))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(cfg: &Config, state: Arc<AppState>) -> Result<()> {
    let addr: SocketAddr = cfg
        .app
        .bind_addr
        .parse()
        .context("invalid app.bind_addr")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .context("server error")?;
    Ok(())
}
