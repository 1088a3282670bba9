//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router (guarded forward-auth endpoint + health check)
//! - Wire up middleware (request ID, tracing, access control)
//! - Own the reloadable engine (and its hostname resolver) and adapter settings
//! - Apply configuration updates while serving
//! - Bind server to listener and drain on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{validate_config, ChallengeAction, GateConfig};
use crate::decision::{AccessDecision, AccessEngine, RuleError};
use crate::dns::{CacheSettings, CachedResolver, HostnameResolver, SystemResolver};
use crate::http::middleware::access_control::{
    access_control_middleware, decision_value, X_ACCESS_DECISION,
};
use crate::http::request::RequestPolicy;

/// Adapter behavior derived from configuration, swapped as a whole on reload.
#[derive(Debug, Clone)]
pub struct AdapterSettings {
    pub request: RequestPolicy,
    pub challenge_action: ChallengeAction,
    pub challenge_status: StatusCode,
    pub decision_timeout: Duration,
}

impl AdapterSettings {
    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            request: RequestPolicy::from_config(&config.request),
            challenge_action: config.challenge.action,
            challenge_status: StatusCode::from_u16(config.challenge.status)
                .unwrap_or(StatusCode::TOO_MANY_REQUESTS),
            decision_timeout: Duration::from_millis(config.request.decision_timeout_ms),
        }
    }
}

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AccessEngine>,
    settings: Arc<ArcSwap<AdapterSettings>>,
}

impl AppState {
    pub fn new(
        config: &GateConfig,
        resolver: Option<Arc<dyn HostnameResolver>>,
    ) -> Result<Self, RuleError> {
        Ok(Self {
            engine: Arc::new(AccessEngine::with_resolver(&config.rules, resolver)?),
            settings: Arc::new(ArcSwap::from_pointee(AdapterSettings::from_config(config))),
        })
    }

    /// Current adapter settings snapshot.
    pub fn settings(&self) -> Arc<AdapterSettings> {
        self.settings.load_full()
    }

    /// Rebuild rules and adapter settings from `config`.
    ///
    /// Nothing is published unless the whole rule set builds.
    pub fn apply_config(&self, config: &GateConfig) -> Result<(), RuleError> {
        self.engine.reload(&config.rules)?;
        self.settings
            .store(Arc::new(AdapterSettings::from_config(config)));
        Ok(())
    }
}

/// HTTP front end of the access gate.
pub struct GateServer {
    router: Router,
    state: AppState,
}

impl GateServer {
    /// Create a server, with a system reverse-DNS resolver when enabled.
    pub fn new(config: GateConfig) -> Result<Self, RuleError> {
        let resolver = system_resolver(&config);
        Self::with_resolver(config, resolver)
    }

    /// Create a server with an explicit hostname resolver (or none).
    pub fn with_resolver(
        config: GateConfig,
        resolver: Option<Arc<dyn HostnameResolver>>,
    ) -> Result<Self, RuleError> {
        let state = AppState::new(&config, resolver)?;
        let router = Self::build_router(state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let guarded = Router::new()
            .fallback(forward_auth)
            .layer(middleware::from_fn_with_state(
                state.clone(),
                access_control_middleware,
            ));

        Router::new()
            .route("/healthz", get(healthz))
            .merge(guarded)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configuration updates received on `config_updates` are applied
    /// while serving. Returns after `shutdown` fires and connections drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GateConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rules = self.state.engine.pipeline().len(),
            "HTTP server starting"
        );

        let state = self.state.clone();
        let updates = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                apply_update(&state, &config);
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        updates.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn apply_update(state: &AppState, config: &GateConfig) {
    if let Err(errors) = validate_config(config) {
        for e in &errors {
            tracing::error!(error = %e, "Rejected configuration update");
        }
        return;
    }

    match state.apply_config(config) {
        Ok(()) => tracing::info!(rules = config.rules.len(), "Configuration applied"),
        Err(e) => tracing::error!(
            error = %e,
            "Failed to apply configuration. Keeping current rules."
        ),
    }
}

fn system_resolver(config: &GateConfig) -> Option<Arc<dyn HostnameResolver>> {
    if !config.dns.enabled {
        return None;
    }

    let timeout = Duration::from_millis(config.dns.lookup_timeout_ms);
    match SystemResolver::from_system_conf(timeout) {
        Ok(resolver) => {
            let cached = CachedResolver::new(resolver, CacheSettings::from(&config.dns));
            Some(Arc::new(cached))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Reverse DNS unavailable; hostname rules see no hostname");
            None
        }
    }
}

/// Reached only when the request was not blocked.
async fn forward_auth(request: Request<Body>) -> Response {
    let decision = request
        .extensions()
        .get::<AccessDecision>()
        .copied()
        .unwrap_or_default();

    (
        StatusCode::OK,
        [(X_ACCESS_DECISION.clone(), decision_value(decision))],
    )
        .into_response()
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
