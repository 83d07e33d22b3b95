use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::StatusCode;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info, warn};

use bizdesk_api::{build_router, AppState};
use bizdesk_core::domain::PayrollRates;
use bizdesk_core::gateways::{EventPublisher, Mailer};
use bizdesk_core::services::{
    AuthService, CalendarService, ContactService, DispatchHandle, EnrichmentLimiter, EnrichmentService,
    NotificationDispatcher, NotificationService, PayrollService, ProductService, ProjectService, PtoService,
    StaffService, TaxDocumentService,
};
use bizdesk_infrastructure::{
    create_pool, run_migrations, GeminiGenerator, GoogleWebResearcher, ImgbbImageHost, OpenAiGenerator,
    OpenFacturaSource, PgContactRepository, PgEventRepository, PgNotificationRepository,
    PgNotificationRuleRepository, PgNotificationTemplateRepository, PgPayrollRepository, PgProductRepository,
    PgProjectRepository, PgPtoRepository, PgRoleRepository, PgStaffRepository, PgTaskRepository,
    PgTaxDocumentRepository, PgTenantRepository, SmtpMailer,
};
use bizdesk_security::JwtService;
use bizdesk_shared::config::AppConfig;

/// Upper bound for a whole request; enrichment waits on several LLM calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    let _log_guard = bizdesk_shared::telemetry::init_telemetry(&config.log)?;
    config.validate()?;

    info!(env = %config.app.env, "BizDesk server starting...");

    // Database
    let pool = create_pool(&config.database)
        .await
        .context("failed to connect to database")?;
    info!("Database connection established.");

    if config.database.run_migrations {
        run_migrations(&pool).await.context("failed to run migrations")?;
        info!("Migrations applied.");
    }

    // Repositories
    let tenants = Arc::new(PgTenantRepository::new(pool.clone()));
    let staff_repo = Arc::new(PgStaffRepository::new(pool.clone()));
    let roles = Arc::new(PgRoleRepository::new(pool.clone()));
    let products = Arc::new(PgProductRepository::new(pool.clone()));
    let tax_documents = Arc::new(PgTaxDocumentRepository::new(pool.clone()));
    let payroll = Arc::new(PgPayrollRepository::new(pool.clone()));
    let pto = Arc::new(PgPtoRepository::new(pool.clone()));
    let events = Arc::new(PgEventRepository::new(pool.clone()));
    let contacts = Arc::new(PgContactRepository::new(pool.clone()));
    let projects = Arc::new(PgProjectRepository::new(pool.clone()));
    let tasks = Arc::new(PgTaskRepository::new(pool.clone()));
    let templates = Arc::new(PgNotificationTemplateRepository::new(pool.clone()));
    let rules = Arc::new(PgNotificationRuleRepository::new(pool.clone()));
    let notifications = Arc::new(PgNotificationRepository::new(pool.clone()));

    // Outbound gateways
    let mailer: Option<Arc<dyn Mailer>> = if config.mail.enabled {
        Some(Arc::new(SmtpMailer::new(&config.mail)?))
    } else {
        warn!("Outbound mail disabled; e-mail notifications will be marked failed");
        None
    };

    // Notifications first: every other service publishes into it.
    let (dispatch, dispatch_rx) = DispatchHandle::channel();
    let notification_service = Arc::new(NotificationService::new(
        templates,
        rules,
        notifications.clone(),
        staff_repo.clone(),
        dispatch.clone(),
    ));
    let publisher: Arc<dyn EventPublisher> = notification_service.clone();

    let dispatcher = Arc::new(NotificationDispatcher::new(notifications, staff_repo.clone(), mailer));
    let _dispatcher_task = Arc::clone(&dispatcher).spawn(dispatch_rx);
    if let Err(e) = dispatcher.requeue_pending(&dispatch).await {
        error!("Could not re-enqueue pending notifications: {}", e);
    }

    let jwt = Arc::new(JwtService::new(&config.jwt.secret, config.jwt.access_token_expiry));

    let state = AppState {
        db: pool,
        jwt: jwt.clone(),
        service_api_key: Arc::from(config.security.service_api_key.as_str()),
        auth: Arc::new(AuthService::new(tenants, staff_repo.clone(), roles.clone(), jwt)),
        staff: Arc::new(StaffService::new(staff_repo.clone(), roles)),
        products: Arc::new(ProductService::new(
            products.clone(),
            Arc::new(ImgbbImageHost::new(&config.image_host)?),
        )),
        enrichment: Arc::new(EnrichmentService::new(
            products,
            Arc::new(GeminiGenerator::new(&config.llm)?),
            Arc::new(OpenAiGenerator::new(&config.llm)?),
            Arc::new(OpenAiGenerator::premium(&config.llm)?),
            Arc::new(GoogleWebResearcher::new(&config.search)?),
            EnrichmentLimiter::new(
                config.limits.enrichment_concurrency,
                Duration::from_millis(config.limits.acquire_timeout_ms),
            ),
        )),
        tax_documents: Arc::new(TaxDocumentService::new(
            tax_documents,
            Arc::new(OpenFacturaSource::new(&config.openfactura)?),
            publisher.clone(),
            config.openfactura.chunk_days,
            Duration::from_millis(config.openfactura.request_delay_ms),
        )),
        payroll: Arc::new(PayrollService::new(
            payroll,
            staff_repo.clone(),
            pto.clone(),
            publisher.clone(),
            PayrollRates {
                pension_rate: config.payroll.pension_rate,
                health_rate: config.payroll.health_rate,
            },
        )),
        pto: Arc::new(PtoService::new(pto, staff_repo.clone(), publisher.clone())),
        calendar: Arc::new(CalendarService::new(events)),
        contacts: Arc::new(ContactService::new(contacts)),
        projects: Arc::new(ProjectService::new(projects, tasks, staff_repo, publisher)),
        notifications: notification_service,
    };

    let app = build_router(state, &config.app.cors_origins)
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, REQUEST_TIMEOUT));

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("BizDesk server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections...");
}
