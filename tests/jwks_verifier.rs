use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;

use storefront_api::auth::{AuthError, JwksVerifier, TokenVerifier};

const JWKS: &str = include_str!("fixtures/jwks.json");
const SIGNING_KEY: &[u8] = include_bytes!("fixtures/session_signing_key.pem");
const KID: &str = "ins_2abcTestKey";

/// Local JWKS endpoint that counts fetches and can fail the first few.
#[derive(Clone, Default)]
struct KeyServer {
    fetches: Arc<AtomicUsize>,
    failures_left: Arc<AtomicUsize>,
}

impl KeyServer {
    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

async fn serve_jwks(State(server): State<KeyServer>) -> Response {
    server.fetches.fetch_add(1, Ordering::SeqCst);
    let failing = server
        .failures_left
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    ([(header::CONTENT_TYPE, "application/json")], JWKS).into_response()
}

async fn spawn_key_server(failures: usize) -> (String, KeyServer) {
    let server = KeyServer::default();
    server.failures_left.store(failures, Ordering::SeqCst);
    let app = Router::new()
        .route("/.well-known/jwks.json", get(serve_jwks))
        .with_state(server.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/.well-known/jwks.json"), server)
}

fn session_token(sub: &str, kid: &str, expires_in: i64) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let claims = json!({
        "sub": sub,
        "email": format!("{sub}@client.tn"),
        "sid": "sess_2abc",
        "exp": Utc::now().timestamp() + expires_in,
    });
    encode(&header, &claims, &EncodingKey::from_rsa_pem(SIGNING_KEY).unwrap()).unwrap()
}

#[tokio::test]
async fn test_valid_tokens_verify_with_one_key_fetch() {
    let (url, server) = spawn_key_server(0).await;
    let verifier = JwksVerifier::new(url).unwrap();

    let first = verifier.verify(&session_token("user_1", KID, 600)).await.unwrap();
    assert_eq!(first.sub, "user_1");
    assert_eq!(first.email.as_deref(), Some("user_1@client.tn"));
    assert_eq!(first.sid.as_deref(), Some("sess_2abc"));

    let second = verifier.verify(&session_token("user_2", KID, 600)).await.unwrap();
    assert_eq!(second.sub, "user_2");
    assert_eq!(server.fetches(), 1);
}

#[tokio::test]
async fn test_expired_or_unknown_key_is_rejected() {
    let (url, server) = spawn_key_server(0).await;
    let verifier = JwksVerifier::new(url).unwrap();

    let expired = verifier.verify(&session_token("user_1", KID, -3600)).await;
    assert!(matches!(expired, Err(AuthError::InvalidToken)));
    let rotated = verifier.verify(&session_token("user_1", "ins_other", 600)).await;
    assert!(matches!(rotated, Err(AuthError::InvalidToken)));

    let mut tampered = session_token("user_1", KID, 600);
    tampered.push('x');
    assert!(matches!(verifier.verify(&tampered).await, Err(AuthError::InvalidToken)));
    assert_eq!(server.fetches(), 1);
}

#[tokio::test]
async fn test_failed_key_fetch_is_retried() {
    let (url, server) = spawn_key_server(1).await;
    let verifier = JwksVerifier::new(url).unwrap();
    let token = session_token("user_1", KID, 600);

    assert!(matches!(verifier.verify(&token).await, Err(AuthError::KeysUnavailable(_))));
    assert_eq!(verifier.verify(&token).await.unwrap().sub, "user_1");
    assert_eq!(server.fetches(), 2);

    verifier.verify(&token).await.unwrap();
    assert_eq!(server.fetches(), 2);
}
