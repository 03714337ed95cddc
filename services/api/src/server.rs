use crate::cli::ServeArgs;
use crate::infra::{
    default_security_questions, AppState, InMemoryApplicationRepository, InMemoryContactDirectory,
};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use brokerage_onboarding::config::AppConfig;
use brokerage_onboarding::error::AppError;
use brokerage_onboarding::telemetry;
use brokerage_onboarding::workflows::account_opening::OnboardingService;
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

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let contacts = Arc::new(InMemoryContactDirectory::default());
    let onboarding_service = Arc::new(OnboardingService::new(
        repository,
        contacts,
        default_security_questions(),
        config.onboarding.clone(),
    ));

    let app = with_application_routes(onboarding_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        base_currency = %config.onboarding.base_currency,
        "brokerage onboarding service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
