use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::repositories::Repositories;
use crate::domain::services::{AuthService, NotificationService, TicketService, TokenStore};
use crate::infrastructure::auth_service_impl::AuthServiceImpl;
use crate::infrastructure::database::RedisConnection;
use crate::infrastructure::memory::InMemoryTokenStore;
use crate::infrastructure::messaging::{
    EmailGateway, HttpEmailGateway, HttpSmsGateway, LoggingGateway, NotificationDispatcher,
    SmsGateway,
};
use crate::infrastructure::Persistence;
use crate::shared::Result;

// Application state for dependency injection
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub persistence: Persistence,
    pub repositories: Repositories,
    pub token_store: Arc<dyn TokenStore>,
    pub auth_service: Arc<dyn AuthService>,
    pub notification_service: Arc<dyn NotificationService>,
    pub ticket_service: Arc<TicketService>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Connect every external collaborator named by `config`. Called once at start-up.
    pub async fn new(config: AppConfig) -> Result<Self> {
        let persistence = Persistence::connect(&config.database).await?;

        let token_store: Arc<dyn TokenStore> = match &config.redis {
            Some(redis) => Arc::new(RedisConnection::new(redis).await?),
            None => {
                warn!("REDIS_URL not set; tokens and rate limits are kept in process memory");
                Arc::new(InMemoryTokenStore::new())
            }
        };

        let timeout = Duration::from_secs(config.notifications.request_timeout_seconds);
        let email: Arc<dyn EmailGateway> = match config.notifications.email.clone() {
            Some(email) => Arc::new(HttpEmailGateway::new(email, timeout)?),
            None => Arc::new(LoggingGateway),
        };
        let sms: Arc<dyn SmsGateway> = match config.notifications.sms.clone() {
            Some(sms) => Arc::new(HttpSmsGateway::new(sms, timeout)?),
            None => Arc::new(LoggingGateway),
        };

        let metrics = match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Prometheus recorder not installed: {}", e);
                None
            }
        };

        info!("Persistence backend: {}", persistence.backend_name());
        Ok(Self::assemble(config, persistence, token_store, email, sms, metrics))
    }

    /// Wire services from already-built parts.
    pub fn assemble(
        config: AppConfig,
        persistence: Persistence,
        token_store: Arc<dyn TokenStore>,
        email: Arc<dyn EmailGateway>,
        sms: Arc<dyn SmsGateway>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let repositories = persistence.repositories();

        let notification_service: Arc<dyn NotificationService> =
            Arc::new(NotificationDispatcher::new(
                repositories.users.clone(),
                repositories.tickets.clone(),
                email,
                sms,
                config.notifications.bulk_concurrency,
            ));

        let auth_service: Arc<dyn AuthService> = Arc::new(AuthServiceImpl::new(
            config.auth.clone(),
            token_store.clone(),
            repositories.users.clone(),
            notification_service.clone(),
        ));

        let ticket_service = Arc::new(TicketService::new(
            repositories.tickets.clone(),
            repositories.users.clone(),
            notification_service.clone(),
        ));

        Self {
            config,
            persistence,
            repositories,
            token_store,
            auth_service,
            notification_service,
            ticket_service,
            metrics,
        }
    }
}
