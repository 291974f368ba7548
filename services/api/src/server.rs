use crate::cli::ServeArgs;
use crate::infra::{
    seed_demo_directory, AppState, ConsoleNotifier, InMemoryIncidentRepository,
    InMemoryUserDirectory,
};
use crate::routes::with_dispatch_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use lifeline::config::AppConfig;
use lifeline::dispatch::{DispatchService, EventBroadcaster};
use lifeline::error::AppError;
use lifeline::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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

    let repository = Arc::new(InMemoryIncidentRepository::default());
    let directory = Arc::new(InMemoryUserDirectory::default());
    if args.seed {
        seed_demo_directory(&directory);
        info!("seeded demo users into the directory");
    }
    let notifier = Arc::new(ConsoleNotifier);
    let broadcaster = EventBroadcaster::default();
    let dispatch_service = Arc::new(DispatchService::new(
        repository,
        directory,
        notifier,
        broadcaster.clone(),
        config.dispatch.clone(),
    ));

    let app = with_dispatch_routes(dispatch_service, broadcaster)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "emergency dispatch service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
