//! Route-level tests driving the router in-process.

mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Duration as ChronoDuration;
use tower::ServiceExt;

use keygate::auth::ClientId;
use keygate::config::IdentityMode;
use keygate::server::{router, CLIENT_ID_HEADER, SECRET_HEADER};

use common::{checksum_for, TestGate, USERS_BODY};

struct Reply {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    body: String,
}

fn app(gate: &TestGate) -> Router {
    router(gate.state.clone(), Duration::from_secs(10))
}

async fn send(app: &Router, uri: &str, authorization: Option<&str>) -> Reply {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let response = app
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    Reply {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

/// Call `/auth` and return `(client_id, secret)`.
async fn authenticate(app: &Router) -> (String, String) {
    let reply = send(app, "/auth", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let client_id = reply.headers[CLIENT_ID_HEADER].to_str().unwrap().to_string();
    let secret = reply.headers[SECRET_HEADER].to_str().unwrap().to_string();
    (client_id, secret)
}

#[tokio::test]
async fn test_root_is_static_and_stateless() {
    let gate = TestGate::shared(&[42]);
    let app = app(&gate);

    let reply = send(&app, "/", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("/auth"));
    assert!(gate.store.is_empty());
}

#[tokio::test]
async fn test_auth_returns_identity_and_secret() {
    let gate = TestGate::shared(&[42]);
    let app = app(&gate);

    let reply = send(&app, "/auth", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.headers[header::WWW_AUTHENTICATE],
        "Basic realm=users"
    );
    assert_eq!(reply.headers[SECRET_HEADER], "42");
    assert_eq!(
        reply.headers[CLIENT_ID_HEADER].to_str().unwrap(),
        gate.state.issuer.client_id().as_str()
    );
    assert!(reply.body.starts_with("Congratulations"));
    assert_eq!(gate.state.metrics.issued(), 1);
}

#[tokio::test]
async fn test_valid_credential_returns_users() {
    let gate = TestGate::shared(&[42]);
    let app = app(&gate);
    let (client_id, secret) = authenticate(&app).await;

    let credential = format!("{}:{}", client_id, checksum_for(&secret));
    for _ in 0..3 {
        let reply = send(&app, "/users", Some(&credential)).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, USERS_BODY);
    }
    assert_eq!(gate.state.metrics.accepted(), 3);
}

#[tokio::test]
async fn test_users_before_auth_is_unauthorized() {
    let gate = TestGate::shared(&[42]);
    let app = app(&gate);

    let reply = send(&app, "/users", Some("abc:def")).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(reply.body.contains("No credentials have been issued"));
}

#[tokio::test]
async fn test_missing_header_is_malformed() {
    let gate = TestGate::shared(&[42]);
    let app = app(&gate);
    authenticate(&app).await;

    let reply = send(&app, "/users", None).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(
        reply.body,
        "Forbidden - verify Authorization token formatting.\n"
    );

    let record = gate.store.get(gate.state.issuer.client_id()).unwrap();
    assert_eq!(record.attempts_remaining, 5);
}

#[tokio::test]
async fn test_wrong_checksum_counts_down_then_locks_out() {
    let gate = TestGate::shared(&[42]);
    let app = app(&gate);
    let (client_id, secret) = authenticate(&app).await;
    let wrong = format!("{}:not-the-checksum", client_id);

    for remaining in (0..5).rev() {
        let reply = send(&app, "/users", Some(&wrong)).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
        assert!(reply
            .body
            .contains(&format!("You have {} attempts remaining.", remaining)));
    }

    let good = format!("{}:{}", client_id, checksum_for(&secret));
    let reply = send(&app, "/users", Some(&good)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(reply.body.starts_with("No login attempts remain"));
}

#[tokio::test]
async fn test_expired_credential() {
    let gate = TestGate::shared(&[42]);
    let app = app(&gate);
    let (client_id, secret) = authenticate(&app).await;

    gate.clock.advance(ChronoDuration::seconds(301));

    let good = format!("{}:{}", client_id, checksum_for(&secret));
    let reply = send(&app, "/users", Some(&good)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(reply.body.starts_with("Token has expired"));
}

#[tokio::test]
async fn test_reauth_invalidates_previous_secret() {
    let gate = TestGate::shared(&[42, 77]);
    let app = app(&gate);
    let (client_id, old_secret) = authenticate(&app).await;
    let (same_id, new_secret) = authenticate(&app).await;
    assert_eq!(client_id, same_id);
    assert_ne!(old_secret, new_secret);

    let stale = format!("{}:{}", client_id, checksum_for(&old_secret));
    let reply = send(&app, "/users", Some(&stale)).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let fresh = format!("{}:{}", client_id, checksum_for(&new_secret));
    let reply = send(&app, "/users", Some(&fresh)).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn test_any_method_is_routed() {
    let gate = TestGate::shared(&[42]);
    let app = app(&gate);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_per_issuance_identities_are_independent() {
    let gate = TestGate::new(&[11, 42, 12, 77], 5, IdentityMode::PerIssuance);
    let app = app(&gate);

    let (first_id, first_secret) = authenticate(&app).await;
    let (second_id, second_secret) = authenticate(&app).await;
    assert_ne!(first_id, second_id);

    // Burn the first identity's budget; the second is unaffected.
    let wrong = format!("{}:nope", first_id);
    for _ in 0..5 {
        send(&app, "/users", Some(&wrong)).await;
    }
    let first = format!("{}:{}", first_id, checksum_for(&first_secret));
    assert_eq!(
        send(&app, "/users", Some(&first)).await.status,
        StatusCode::UNAUTHORIZED
    );

    let second = format!("{}:{}", second_id, checksum_for(&second_secret));
    let reply = send(&app, "/users", Some(&second)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        gate.store
            .get(&ClientId::from(second_id.as_str()))
            .unwrap()
            .attempts_remaining,
        5
    );
}

#[tokio::test]
async fn test_per_issuance_expired_stays_expired_after_other_issuance() {
    let gate = TestGate::new(&[11, 42, 12, 77], 5, IdentityMode::PerIssuance);
    let app = app(&gate);
    let (first_id, first_secret) = authenticate(&app).await;
    let first = format!("{}:{}", first_id, checksum_for(&first_secret));

    gate.clock.advance(ChronoDuration::seconds(301));
    let reply = send(&app, "/users", Some(&first)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(reply.body.starts_with("Token has expired"));

    // Another client authenticating must not change how the first is rejected.
    authenticate(&app).await;
    let reply = send(&app, "/users", Some(&first)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(reply.body.starts_with("Token has expired"));
}
