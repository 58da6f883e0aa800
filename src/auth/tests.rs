//! Tests for the auth module

use super::*;
use crate::config::AccountConfig;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig};
use base64::Engine;
use pretty_assertions::assert_eq;
use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE};
use test_case::test_case;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver_for(server: &MockServer) -> CredentialResolver {
    CredentialResolver::with_client(HttpClient::new().unwrap())
        .with_iam_url(format!("{}/identity/token", server.uri()))
}

async fn mount_iam_token(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": token,
            "refresh_token": "not_supported",
            "token_type": "Bearer",
            "expires_in": 3600,
            "expiration": 1_700_000_000
        })))
        .mount(server)
        .await;
}

async fn mount_session(server: &MockServer, set_cookie: &str) {
    Mock::given(method("POST"))
        .and(path("/_session"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", set_cookie)
                .set_body_json(serde_json::json!({"ok": true, "name": "user", "roles": []})),
        )
        .mount(server)
        .await;
}

// ============================================================================
// Basic auth
// ============================================================================

#[test_case("", "p" ; "blank username")]
#[test_case("u", "" ; "blank password")]
#[test_case("", "" ; "both blank")]
#[test_case("  ", "p" ; "whitespace username")]
fn test_basic_auth_blank_input(username: &str, password: &str) {
    assert_eq!(CredentialResolver::derive_basic_auth(username, password), "");

    let err = CredentialResolver::try_derive_basic_auth(username, password).unwrap_err();
    assert!(err.is_missing_input());
}

#[test]
fn test_basic_auth() {
    let header = CredentialResolver::derive_basic_auth("u", "p");
    let expected = format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode("u:p")
    );
    assert_eq!(header, expected);
    assert_eq!(header, "Basic dTpw");
}

#[test]
fn test_basic_auth_decodes_to_user_and_password() {
    let header = CredentialResolver::derive_basic_auth("admin", "p@ss:word");
    let encoded = header.strip_prefix("Basic ").unwrap();
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .unwrap();
    assert_eq!(String::from_utf8(decoded).unwrap(), "admin:p@ss:word");
}

// ============================================================================
// IAM bearer token
// ============================================================================

#[tokio::test]
async fn test_bearer_token_blank_apikey_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let resolver = resolver_for(&mock_server);
    assert_eq!(resolver.fetch_bearer_token("").await, "");

    let err = resolver.try_fetch_bearer_token("   ").await.unwrap_err();
    assert!(matches!(err, Error::MissingInput { ref field } if field == "apikey"));
}

#[tokio::test]
async fn test_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .and(header("Accept", "application/json"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string_contains(
            "grant_type=urn%3Aibm%3Aparams%3Aoauth%3Agrant-type%3Aapikey",
        ))
        .and(body_string_contains("apikey=key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"access_token": "abc123"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolver = resolver_for(&mock_server);
    assert_eq!(resolver.fetch_bearer_token("key").await, "abc123");
}

#[tokio::test]
async fn test_bearer_token_expiry_from_response() {
    let mock_server = MockServer::start().await;
    mount_iam_token(&mock_server, "tok").await;

    let resolver = resolver_for(&mock_server);
    let token = assert_ok!(resolver.try_fetch_bearer_token("key").await);

    assert_eq!(token.token, "tok");
    assert!(token.expires_at.is_some());
    assert!(!token.is_expired());
}

#[tokio::test]
async fn test_bearer_token_default_expiry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"access_token": "tok"})),
        )
        .mount(&mock_server)
        .await;

    let resolver = resolver_for(&mock_server);
    let token = resolver.try_fetch_bearer_token("key").await.unwrap();

    let remaining = token.expires_at.unwrap() - chrono::Utc::now();
    assert!(remaining.num_seconds() > DEFAULT_TOKEN_LIFETIME_SECS - 60);
    assert!(remaining.num_seconds() <= DEFAULT_TOKEN_LIFETIME_SECS);
}

#[tokio::test]
async fn test_bearer_token_huge_expires_in() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "abc123",
            "expires_in": i64::MAX
        })))
        .mount(&mock_server)
        .await;

    let resolver = resolver_for(&mock_server);
    assert_eq!(resolver.fetch_bearer_token("key").await, "abc123");

    let config = AccountConfig::new("key", "", "", "");
    let creds = resolver.resolve_all(&config).await;
    assert_eq!(creds.bearer_token(), "abc123");
    assert!(!creds.bearer.unwrap().is_expired());
}

#[tokio::test]
async fn test_bearer_token_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "errorCode": "BXNIM0415E",
            "errorMessage": "Provided API key could not be found."
        })))
        .mount(&mock_server)
        .await;

    let resolver = resolver_for(&mock_server);
    assert_eq!(resolver.fetch_bearer_token("key").await, "");

    let err = resolver.try_fetch_bearer_token("key").await.unwrap_err();
    assert!(matches!(err, Error::UpstreamRejected { status: 401, .. }));
    assert!(err.to_string().contains("BXNIM0415E"));
}

#[tokio::test]
async fn test_bearer_token_missing_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"token_type": "Bearer"})),
        )
        .mount(&mock_server)
        .await;

    let resolver = resolver_for(&mock_server);
    let err = assert_err!(resolver.try_fetch_bearer_token("key").await);
    assert!(matches!(err, Error::MalformedResponse { .. }));
    assert_eq!(resolver.fetch_bearer_token("key").await, "");
}

#[tokio::test]
async fn test_bearer_token_non_200_success_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(
            ResponseTemplate::new(202).set_body_json(serde_json::json!({"access_token": "tok"})),
        )
        .mount(&mock_server)
        .await;

    let resolver = resolver_for(&mock_server);
    assert_eq!(resolver.fetch_bearer_token("key").await, "");
}

// ============================================================================
// Session cookie
// ============================================================================

#[tokio::test]
async fn test_session_cookie() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/_session"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("name=u"))
        .and(body_string_contains("password=p"))
        .respond_with(ResponseTemplate::new(200).insert_header("Set-Cookie", "AuthSession=XYZ; Path=/"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolver = resolver_for(&mock_server);
    let cookie = resolver
        .fetch_session_cookie(&mock_server.uri(), "u", "p")
        .await;

    assert!(cookie.contains("AuthSession=XYZ"));
    assert_eq!(cookie, "AuthSession=XYZ");
}

#[tokio::test]
async fn test_session_cookie_strips_attributes_and_quotes() {
    let mock_server = MockServer::start().await;
    mount_session(
        &mock_server,
        "AuthSession=\"dXNlcjo2NTk3\"; Version=1; Expires=Wed, 01 Jan 2025 00:00:00 GMT; Max-Age=86400; Path=/; HttpOnly; Secure",
    )
    .await;

    let resolver = resolver_for(&mock_server);
    let cookie = resolver
        .fetch_session_cookie(&mock_server.uri(), "user", "pass")
        .await;

    assert_eq!(cookie, "AuthSession=dXNlcjo2NTk3");
}

#[tokio::test]
async fn test_session_cookie_without_set_cookie() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/_session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let resolver = resolver_for(&mock_server);
    assert_eq!(
        resolver
            .fetch_session_cookie(&mock_server.uri(), "u", "p")
            .await,
        ""
    );

    let err = resolver
        .try_fetch_session_cookie(&mock_server.uri(), "u", "p")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_session_cookie_other_cookies_only() {
    let mock_server = MockServer::start().await;
    mount_session(&mock_server, "tracking=abc; Path=/").await;

    let resolver = resolver_for(&mock_server);
    assert_eq!(
        resolver
            .fetch_session_cookie(&mock_server.uri(), "u", "p")
            .await,
        ""
    );
}

#[tokio::test]
async fn test_session_cookie_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/_session"))
        .respond_with(
            ResponseTemplate::new(401)
                .insert_header("Set-Cookie", "AuthSession=XYZ; Path=/")
                .set_body_json(serde_json::json!({
                    "error": "unauthorized",
                    "reason": "Name or password is incorrect."
                })),
        )
        .mount(&mock_server)
        .await;

    let resolver = resolver_for(&mock_server);
    let err = resolver
        .try_fetch_session_cookie(&mock_server.uri(), "u", "wrong")
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_session_cookie_blank_credentials_make_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let resolver = resolver_for(&mock_server);
    let uri = mock_server.uri();
    assert_eq!(resolver.fetch_session_cookie(&uri, "", "p").await, "");
    assert_eq!(resolver.fetch_session_cookie(&uri, "u", " ").await, "");
    assert_eq!(resolver.fetch_session_cookie("", "u", "p").await, "");
}

#[test]
fn test_find_session_cookie_among_many() {
    let mut headers = HeaderMap::new();
    headers.append(SET_COOKIE, HeaderValue::from_static("first=1; Path=/"));
    headers.append(SET_COOKIE, HeaderValue::from_static("AuthSession=abc=; Path=/"));
    headers.append(SET_COOKIE, HeaderValue::from_static("last=2"));

    assert_eq!(find_session_cookie(&headers), Some("abc=".to_string()));
}

#[test]
fn test_find_session_cookie_empty_value() {
    let mut headers = HeaderMap::new();
    headers.append(SET_COOKIE, HeaderValue::from_static("AuthSession=; Path=/"));

    assert_eq!(find_session_cookie(&headers), None);
}

// ============================================================================
// Session info
// ============================================================================

#[tokio::test]
async fn test_session_info() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/_session"))
        .and(header("Cookie", "AuthSession=XYZ"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "userCtx": {"name": "user", "roles": ["_admin"]}
        })))
        .mount(&mock_server)
        .await;

    let resolver = resolver_for(&mock_server);
    let credentials = Credentials {
        session_cookie: "AuthSession=XYZ".to_string(),
        base_url: mock_server.uri(),
        ..Credentials::default()
    };

    let info = resolver.session_info(&credentials).await.unwrap();
    assert_eq!(info["userCtx"]["name"], "user");
}

#[tokio::test]
async fn test_session_info_without_cookie() {
    let resolver = CredentialResolver::new().unwrap();
    let credentials = Credentials {
        base_url: "https://acct.example.com".to_string(),
        ..Credentials::default()
    };

    let err = resolver.session_info(&credentials).await.unwrap_err();
    assert!(err.is_missing_input());
}

// ============================================================================
// Aggregation
// ============================================================================

#[tokio::test]
async fn test_resolve_all() {
    let mock_server = MockServer::start().await;
    mount_iam_token(&mock_server, "iam-token").await;
    mount_session(&mock_server, "AuthSession=cookie-value; Path=/; HttpOnly").await;

    let resolver = resolver_for(&mock_server);
    let config = AccountConfig::new("key", mock_server.uri(), "user", "pass");

    let creds = resolver.resolve_all(&config).await;

    assert_eq!(creds.base_url, mock_server.uri());
    assert_eq!(creds.basic_auth, CredentialResolver::derive_basic_auth("user", "pass"));
    assert_eq!(creds.session_cookie, "AuthSession=cookie-value");
    assert_eq!(creds.bearer_token(), "iam-token");
    assert_eq!(creds.preferred_method(), Some(AuthMethod::Bearer));
}

#[tokio::test]
async fn test_resolve_all_without_host() {
    let mock_server = MockServer::start().await;
    mount_iam_token(&mock_server, "iam-token").await;

    let resolver = resolver_for(&mock_server);
    let config = AccountConfig::new("key", "", "user", "pass");

    let creds = resolver.resolve_all(&config).await;

    assert_eq!(creds.base_url, "");
    assert_eq!(creds.session_cookie, "");
    assert_eq!(creds.basic_auth, "Basic dXNlcjpwYXNz");
    assert_eq!(creds.bearer_token(), "iam-token");
}

#[tokio::test]
async fn test_resolve_all_failures_are_independent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    mount_session(&mock_server, "AuthSession=still-works; Path=/").await;

    let resolver = resolver_for(&mock_server);
    let config = AccountConfig::new("key", mock_server.uri(), "user", "pass");

    let creds = resolver.resolve_all(&config).await;

    assert!(creds.bearer.is_none());
    assert_eq!(creds.session_cookie, "AuthSession=still-works");
    assert_eq!(creds.preferred_method(), Some(AuthMethod::Cookie));
}

#[tokio::test]
async fn test_resolve_all_empty_config() {
    let resolver = CredentialResolver::with_client(
        HttpClient::with_config(HttpClientConfig::default()).unwrap(),
    );

    let creds = resolver.resolve_all(&AccountConfig::default()).await;
    assert!(creds.is_empty());
    assert_eq!(creds.base_url, "");
}

#[test]
fn test_default_iam_url() {
    let resolver = CredentialResolver::new().unwrap();
    assert_eq!(resolver.iam_token_url(), IAM_TOKEN_URL);
    assert_eq!(IAM_TOKEN_URL, "https://iam.cloud.ibm.com/identity/token");
}
