//! Route handlers and shared application state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::audit::{AuditEntry, AuditEvent, AuditLogger};
use crate::auth::{
    algorithm_for, claimed_identity, CredentialIssuer, CredentialStore, CredentialValidator,
    IssuerPolicy, SystemClock, SystemSecretSource,
};
use crate::config::{IdentityMode, Settings};
use crate::error::GateError;
use crate::resource::ResourceProvider;

use super::RequestMetrics;

/// Response header carrying the client identity on issuance.
pub const CLIENT_ID_HEADER: &str = "clientid";
/// Response header carrying the cleartext secret on issuance.
pub const SECRET_HEADER: &str = "secret";

const ROOT_MESSAGE: &str = "Welcome to the homepage! You must authenticate via `/auth` \
and use the information provided in order to retrieve valid data from `/users`. \
You should already have instructions for how to form a valid request. Good luck!";

const ISSUED_MESSAGE: &str = "Congratulations, you are now authenticated! You can use the \
provided credentials to build a valid request and retrieve the list of users. Additional \
requests to `/auth` will invalidate these credentials and return a new set.";

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<CredentialIssuer>,
    pub validator: Arc<CredentialValidator>,
    pub resource: Arc<dyn ResourceProvider>,
    pub audit: Option<Arc<AuditLogger>>,
    pub metrics: Arc<RequestMetrics>,
}

impl AppState {
    /// Assemble state from already-built components.
    pub fn new(
        issuer: CredentialIssuer,
        validator: CredentialValidator,
        resource: Arc<dyn ResourceProvider>,
    ) -> Self {
        Self {
            issuer: Arc::new(issuer),
            validator: Arc::new(validator),
            resource,
            audit: None,
            metrics: Arc::new(RequestMetrics::new()),
        }
    }

    /// Attach an audit logger.
    pub fn with_audit(mut self, logger: Arc<AuditLogger>) -> Self {
        self.audit = Some(logger);
        self
    }

    /// Build production state: OS randomness, system clock, configured
    /// checksum, and the audit log if enabled.
    pub fn from_settings(
        settings: &Settings,
        resource: Arc<dyn ResourceProvider>,
    ) -> Result<Self, GateError> {
        let store = Arc::new(CredentialStore::new());
        let clock = Arc::new(SystemClock);
        let issuer = CredentialIssuer::new(
            Arc::clone(&store),
            Arc::new(SystemSecretSource::new()?),
            algorithm_for(settings.credentials.checksum_algorithm),
            clock.clone(),
            IssuerPolicy::from_config(&settings.credentials)?,
        )?;
        let validator = CredentialValidator::new(store, clock);
        let state = Self::new(issuer, validator, resource);

        if !settings.audit.enabled {
            info!("Audit logging disabled");
            return Ok(state);
        }

        match AuditLogger::new(&settings.audit.log_path) {
            Ok(logger) => {
                info!(
                    path = %settings.audit.log_path.display(),
                    "Audit logging enabled"
                );
                Ok(state.with_audit(Arc::new(logger)))
            }
            Err(e) => {
                warn!(
                    error = %e,
                    path = %settings.audit.log_path.display(),
                    "Failed to create audit logger, audit logging disabled"
                );
                Ok(state)
            }
        }
    }

    fn audit(&self, entry: AuditEntry) {
        if let Some(logger) = &self.audit {
            if let Err(e) = logger.log(&entry) {
                error!(error = %e, "Failed to write audit log entry");
            }
        }
    }
}

/// Build the router. Every route answers any method.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", any(root))
        .route("/auth", any(issue))
        .route("/users", any(users))
        .layer(middleware::from_fn_with_state(
            request_timeout,
            enforce_timeout,
        ))
        .with_state(state)
}

async fn enforce_timeout(State(limit): State<Duration>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(path = %path, timeout_ms = limit.as_millis() as u64, "Request timed out");
            (StatusCode::REQUEST_TIMEOUT, "Request timed out\n").into_response()
        }
    }
}

async fn root() -> &'static str {
    ROOT_MESSAGE
}

async fn issue(State(state): State<AppState>) -> Response {
    let request_id = Uuid::new_v4();
    let start = Instant::now();

    let issued = match state.issuer.issue_next() {
        Ok(issued) => issued,
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Credential issuance failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error\n").into_response();
        }
    };

    state.metrics.record_issued();
    state.audit(AuditEntry::success(
        Utc::now().to_rfc3339(),
        request_id,
        AuditEvent::Issue,
        issued.client_id.clone(),
        issued.record.attempts_remaining,
        start.elapsed().as_micros() as u64,
    ));

    let headers = [
        (header::WWW_AUTHENTICATE, "Basic realm=users".to_string()),
        (
            HeaderName::from_static(CLIENT_ID_HEADER),
            issued.client_id.to_string(),
        ),
        (
            HeaderName::from_static(SECRET_HEADER),
            issued.secret.to_string(),
        ),
    ];

    (StatusCode::OK, headers, ISSUED_MESSAGE).into_response()
}

async fn users(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let request_id = Uuid::new_v4();
    let start = Instant::now();

    // A missing or non-text header is treated as empty, which is malformed.
    let credential = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let client_id = match state.issuer.policy().identity_mode {
        IdentityMode::Shared => state.issuer.client_id().clone(),
        IdentityMode::PerIssuance => claimed_identity(credential),
    };

    match state.validator.validate(&client_id, credential) {
        Ok(accepted) => {
            state.metrics.record_validation(true);
            state.audit(AuditEntry::success(
                Utc::now().to_rfc3339(),
                request_id,
                AuditEvent::Validate,
                accepted.client_id,
                accepted.attempts_remaining,
                start.elapsed().as_micros() as u64,
            ));
            info!(request_id = %request_id, "Request validated, returning user list");
            (StatusCode::OK, state.resource.render()).into_response()
        }
        Err(rejection) => {
            state.metrics.record_validation(false);
            state.audit(AuditEntry::rejected(
                Utc::now().to_rfc3339(),
                request_id,
                client_id,
                rejection,
                start.elapsed().as_micros() as u64,
            ));
            rejection.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::get;
    use tower::ServiceExt;

    fn timed_router(limit: Duration) -> Router {
        Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    "done"
                }),
            )
            .route("/fast", get(|| async { "done" }))
            .layer(middleware::from_fn_with_state(limit, enforce_timeout))
    }

    async fn call(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_stalled_request_times_out() {
        let (status, body) = call(timed_router(Duration::from_millis(20)), "/slow").await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body, "Request timed out\n");
    }

    #[tokio::test]
    async fn test_prompt_request_passes_through() {
        let (status, body) = call(timed_router(Duration::from_millis(200)), "/fast").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "done");
    }
}
