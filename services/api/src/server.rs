use crate::cli::ServeArgs;
use crate::infra::{build_service, http_client, AppState};
use crate::routes::with_church_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use church_finder::config::AppConfig;
use church_finder::error::AppError;
use church_finder::telemetry;
use std::sync::atomic::Ordering;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    if config.providers.tavily_api_key.is_none() || config.providers.openai_api_key.is_none() {
        warn!("provider credentials missing; evaluations will fail until configured");
    }
    if config.admin_id.is_none() {
        warn!("ADMIN_ID not set; forced re-evaluation and deletes are disabled");
    }

    let service = Arc::new(build_service(&config, http_client())?);

    let app = with_church_routes(service, config.admin_id.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "church finder ready");

    axum::serve(listener, app).await?;
    Ok(())
}
