//! Session integration tests: validation before network, login failures,
//! token renewal, and poisoning after a failed renewal.

mod common;

use common::{asset, count_requests, mount_children, mount_login, page, test_config};
use dpres_dl::{EntityRef, Error, Session, descendants, fetch};
use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn missing_tenant_fails_before_any_network_call() {
    let server = MockServer::start().await;
    mount_login(&server, 900).await;

    let mut config = test_config(&server.uri());
    config.credentials.tenant.clear();

    match Session::open(&config).await {
        Err(Error::Validation { key, message }) => {
            assert_eq!(key.as_deref(), Some("tenant"));
            assert!(message.contains("tenant"));
        }
        other => panic!("expected Validation, got {other:?}"),
    }

    let received = server.received_requests().await.unwrap_or_default();
    assert!(
        received.is_empty(),
        "no network call may happen before validation passes"
    );
}

#[tokio::test]
async fn rejected_credentials_surface_as_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/accesstoken/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    match Session::open(&test_config(&server.uri())).await {
        Err(Error::Auth(message)) => {
            assert!(message.contains("rejected"), "message was: {message}")
        }
        other => panic!("expected Auth, got {other:?}"),
    }
    assert_eq!(
        count_requests(&server, "login").await,
        1,
        "credential rejection must not be retried"
    );
}

#[tokio::test]
async fn unreachable_server_surfaces_as_auth_error() {
    // Bind then drop a listener so the port is known to refuse connections.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = test_config(&format!("http://{addr}"));
    match Session::open(&config).await {
        Err(Error::Auth(message)) => {
            assert!(
                message.contains("login endpoint"),
                "message was: {message}"
            );
        }
        other => panic!("expected Auth, got {other:?}"),
    }
}

#[tokio::test]
async fn short_lived_token_is_renewed_transparently() {
    let server = MockServer::start().await;
    // validFor 1s is inside the refresh margin, so every request renews.
    mount_login(&server, 1).await;
    mount_children(&server, None, 0, 50, page(&[asset("a1", "one", None)], 1)).await;

    let session = Session::open(&test_config(&server.uri())).await.unwrap();
    let entities: Vec<_> = Box::pin(descendants(&session, None)).collect().await;
    assert_eq!(entities.len(), 1);
    assert!(entities[0].is_ok());

    let logins = count_requests(&server, "login").await;
    assert!(
        logins >= 2,
        "expected a renewal login beyond the initial one, saw {logins}"
    );
}

#[tokio::test]
async fn failed_renewal_poisons_the_session() {
    let server = MockServer::start().await;
    // Initial login succeeds with a token already inside the refresh
    // margin; the renewal attempt is rejected.
    Mock::given(method("POST"))
        .and(path("/api/accesstoken/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-1",
            "validFor": 1,
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/accesstoken/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let session = Session::open(&test_config(&server.uri())).await.unwrap();

    // First operation triggers the renewal, which fails.
    let items: Vec<_> = Box::pin(descendants(&session, None)).collect().await;
    assert_eq!(items.len(), 1);
    match &items[0] {
        Err(Error::Auth(message)) => {
            assert!(message.contains("renewal"), "message was: {message}")
        }
        other => panic!("expected Auth from failed renewal, got {other:?}"),
    }

    let logins_after_failure = count_requests(&server, "login").await;
    assert_eq!(logins_after_failure, 2, "initial login plus one renewal");

    // The session is now unusable and fails fast without touching the network.
    let reference = EntityRef::new("a-1");
    match fetch(&session, &reference).await {
        Err(Error::Auth(message)) => {
            assert!(
                message.contains("no longer usable"),
                "message was: {message}"
            );
        }
        other => panic!("expected Auth from poisoned session, got {other:?}"),
    }
    assert_eq!(
        count_requests(&server, "login").await,
        logins_after_failure,
        "a poisoned session must not retry logins"
    );
    assert_eq!(
        count_requests(&server, "entities").await,
        0,
        "a poisoned session must not reach the entity API"
    );
}

#[tokio::test]
async fn malformed_login_body_surfaces_as_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/accesstoken/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    match Session::open(&test_config(&server.uri())).await {
        Err(Error::Auth(message)) => {
            assert!(message.contains("malformed"), "message was: {message}")
        }
        other => panic!("expected Auth, got {other:?}"),
    }
}
