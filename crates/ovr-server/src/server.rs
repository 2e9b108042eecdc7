use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{delete, get, post},
};
use ovr_auth::{SecureDataAccess, SharedAccessManager};
use ovr_core::WorkflowResult;
use ovr_storage::WorkflowStorage;
use ovr_workflow::{CorrectiveActionService, Dispatcher, InvestigationService};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{bootstrap, config::AppConfig, handlers};

/// Services shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub incidents: SecureDataAccess,
    pub sharing: SharedAccessManager,
    pub investigations: InvestigationService,
    pub corrective_actions: CorrectiveActionService,
}

impl AppState {
    pub fn new(storage: Arc<dyn WorkflowStorage>, cfg: &AppConfig) -> WorkflowResult<Self> {
        let sharing = SharedAccessManager::new(storage.clone(), cfg.sharing.clone());
        Ok(Self {
            dispatcher: Dispatcher::standard(storage.clone())?,
            incidents: SecureDataAccess::new(storage.clone()),
            investigations: InvestigationService::new(storage.clone(), sharing.clone()),
            corrective_actions: CorrectiveActionService::new(storage, sharing.clone()),
            sharing,
        })
    }
}

pub fn build_app(cfg: &AppConfig, state: AppState) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        .route("/healthz", get(handlers::healthz))
        // Incidents and workflow actions
        .route("/incidents", get(handlers::list_incidents))
        .route("/incidents/{id}", get(handlers::get_incident))
        .route(
            "/incidents/{id}/actions",
            get(handlers::allowed_actions).post(handlers::perform_action),
        )
        // Investigations
        .route(
            "/investigations/{id}",
            get(handlers::get_investigation).patch(handlers::update_investigation),
        )
        .route(
            "/investigations/{id}/invitations",
            get(handlers::list_investigation_invitations)
                .post(handlers::create_investigation_invitation),
        )
        // Corrective actions
        .route(
            "/corrective-actions/{id}",
            get(handlers::get_corrective_action),
        )
        .route(
            "/corrective-actions/{id}/progress",
            get(handlers::corrective_action_progress),
        )
        .route(
            "/corrective-actions/{id}/checklist/{item_id}/toggle",
            post(handlers::toggle_checklist_item),
        )
        .route(
            "/corrective-actions/{id}/close",
            post(handlers::close_corrective_action),
        )
        .route(
            "/corrective-actions/{id}/invitations",
            get(handlers::list_corrective_action_invitations)
                .post(handlers::create_corrective_action_invitation),
        )
        // Invitation lifecycle
        .route("/invitations/accept", post(handlers::accept_invitation))
        .route("/invitations/{id}", delete(handlers::revoke_invitation))
        .with_state(state)
        // Outermost first: trace -> cors -> timeout
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|req: &axum::http::Request<_>| {
                            tracing::info_span!(
                                "http.request",
                                http.method = %req.method(),
                                http.target = %req.uri().path(),
                            )
                        })
                        .on_response(
                            |res: &axum::http::Response<_>,
                             latency: std::time::Duration,
                             _span: &tracing::Span| {
                                tracing::info!(
                                    http.status = %res.status().as_u16(),
                                    elapsed_ms = %latency.as_millis(),
                                    "request handled"
                                );
                            },
                        ),
                )
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(cfg.request_timeout())),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

pub struct OvrServer {
    addr: SocketAddr,
    app: Router,
}

impl OvrServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!(addr = %self.addr, "OVR server listening");
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    storage: Option<Arc<dyn WorkflowStorage>>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            storage: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn WorkflowStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub async fn build(self) -> anyhow::Result<OvrServer> {
        let storage = self.storage.unwrap_or_else(ovr_db_memory::create_storage);
        if self.config.bootstrap.demo_data {
            bootstrap::seed_demo_data(storage.as_ref()).await?;
        }
        let state = AppState::new(storage, &self.config)?;
        let app = build_app(&self.config, state);

        Ok(OvrServer {
            addr: self.addr,
            app,
        })
    }
}
