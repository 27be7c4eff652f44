use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use rust_decimal::Decimal;
use tokio::{signal, sync::mpsc};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

use cotizador_api as api;

use api::margins::{EffectiveMargin, MarginResolver};
use api::pricing::source::PriceSourceResolver;
use api::services::conversion::ConversionService;
use api::services::quotations::{QuotationService, QuotationSettings};
use api::stores::db::{
    DbCategoryStore, DbCouponService, DbInventoryStore, DbSaleFactory, DbSupplierCatalog,
};
use api::stores::{Clock, SystemClock};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    // Init DB
    let db_pool = api::db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }
    let db = Arc::new(db_pool);

    // Init events
    let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
    let event_sender = api::events::EventSender::new(event_tx);
    tokio::spawn(api::events::process_events(event_rx));

    // Engine settings and collaborator wiring
    let settings = QuotationSettings::from_config(&cfg.quotation)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let category_store = Arc::new(DbCategoryStore::new(db.clone()));
    let margin_defaults = EffectiveMargin {
        min: Decimal::from_f64_retain(cfg.quotation.default_min_margin)
            .unwrap_or(Decimal::new(1000, 2)),
        normal: Decimal::from_f64_retain(cfg.quotation.default_normal_margin)
            .unwrap_or(Decimal::new(2000, 2)),
    };
    let margins = Arc::new(MarginResolver::new(
        category_store,
        margin_defaults,
        cfg.quotation.max_category_depth,
    ));

    let sources = Arc::new(PriceSourceResolver::new(
        Arc::new(DbInventoryStore::new(db.clone())),
        Arc::new(DbSupplierCatalog::new(db.clone())),
        cfg.quotation.default_price_list_id,
    ));
    let coupons = Arc::new(DbCouponService::new(db.clone()));

    let quotation_service = Arc::new(QuotationService::new(
        db.clone(),
        event_sender.clone(),
        margins.clone(),
        sources.clone(),
        coupons.clone(),
        clock.clone(),
        settings.clone(),
    ));
    let conversion_service = Arc::new(ConversionService::new(
        db.clone(),
        event_sender.clone(),
        sources,
        Arc::new(DbSaleFactory::new()),
        coupons,
        clock,
        settings.price_drift_tolerance,
    ));

    let state = api::AppState {
        db,
        config: cfg.clone(),
        event_sender,
        services: api::handlers::AppServices {
            quotations: quotation_service,
            conversion: conversion_service,
        },
    };

    // Router with ambient layers
    let cors = match cfg.cors_allowed_origins.as_deref() {
        Some(origins) if !origins.trim().is_empty() => {
            let parsed = origins
                .split(',')
                .filter_map(|origin| origin.trim().parse::<axum::http::HeaderValue>().ok())
                .collect::<Vec<_>>();
            CorsLayer::new().allow_origin(parsed)
        }
        _ => CorsLayer::permissive(),
    };

    let app = Router::new()
        .nest("/api/v1", api::api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
        .with_state(state);

    let addr: SocketAddr = cfg.server_addr().parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
