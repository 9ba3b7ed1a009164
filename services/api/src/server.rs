use crate::cli::ServeArgs;
use crate::infra::{AppState, Marketplace, StaticSessionResolver};
use crate::routes::marketplace_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use rentmatch::auth::SessionResolver;
use rentmatch::config::AppConfig;
use rentmatch::error::AppError;
use rentmatch::telemetry;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let resolver = StaticSessionResolver::from_seeds(&config.sessions);
    if resolver.len() == 0 {
        warn!("APP_SESSION_TOKENS is empty; every authenticated route will answer 401");
    }
    let sessions: Arc<dyn SessionResolver> = Arc::new(resolver);
    let marketplace = Marketplace::in_memory(&config);

    let app = marketplace_routes(&marketplace, sessions)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        approval_threshold = config.matching.approval_threshold,
        digest_threshold = config.matching.digest_threshold,
        "rental marketplace api ready"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
