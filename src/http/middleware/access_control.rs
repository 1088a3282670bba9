//! Access-control middleware.
//! Runs the decision engine in front of every guarded route.

use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio_util::sync::CancellationToken;

use crate::config::ChallengeAction;
use crate::decision::{AccessDecision, EvaluationError, RequestInfo};
use crate::http::server::AppState;
use crate::observability::metrics;

pub static X_ACCESS_DECISION: HeaderName = HeaderName::from_static("x-access-decision");

pub async fn access_control_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let settings = state.settings();
    let info = settings.request.request_info(&req);
    let client_ip = info.client_ip();

    // Fires when this future is dropped, e.g. the client went away.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let decision = match decide(&state, &info, &cancel, settings.decision_timeout).await {
        Ok(decision) => decision,
        Err(e) => {
            tracing::warn!(
                client_ip = ?client_ip,
                error = %e,
                "Access decision indeterminate"
            );
            return indeterminate();
        }
    };

    match decision {
        AccessDecision::Block => {
            tracing::info!(client_ip = ?client_ip, "Request blocked");
            deny(StatusCode::FORBIDDEN, decision)
        }
        AccessDecision::Challenge => match settings.challenge_action {
            ChallengeAction::Reject => deny(settings.challenge_status, decision),
            ChallengeAction::Pass => {
                req.extensions_mut().insert(decision);
                let mut response = next.run(req).await;
                response
                    .headers_mut()
                    .insert(X_ACCESS_DECISION.clone(), decision_value(decision));
                response
            }
        },
        AccessDecision::Allow => {
            req.extensions_mut().insert(decision);
            next.run(req).await
        }
    }
}

/// Evaluate under a deadline. Expiry cancels the in-flight rule.
async fn decide(
    state: &AppState,
    info: &RequestInfo,
    cancel: &CancellationToken,
    deadline: Duration,
) -> Result<AccessDecision, EvaluationError> {
    match tokio::time::timeout(deadline, state.engine.evaluate(info, cancel)).await {
        Ok(result) => result,
        Err(_) => {
            cancel.cancel();
            let err = EvaluationError::TimedOut(deadline);
            metrics::record_aborted(err.reason());
            Err(err)
        }
    }
}

pub(crate) fn decision_value(decision: AccessDecision) -> HeaderValue {
    HeaderValue::from_static(decision.as_str())
}

fn deny(status: StatusCode, decision: AccessDecision) -> Response {
    (
        status,
        [(X_ACCESS_DECISION.clone(), decision_value(decision))],
        "Access denied",
    )
        .into_response()
}

fn indeterminate() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "Access decision unavailable").into_response()
}
