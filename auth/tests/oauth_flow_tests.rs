mod common;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param as has_query};
use wiremock::{Mock, MockServer, ResponseTemplate};

use callback_auth::adapter::Adapter;
use callback_auth::models::{NewUser, RegistrationType};
use callback_auth::providers::{ProviderId, Providers};
use callback_auth::session::SESSION_COOKIE;
use callback_auth::{configure_routes, session_middleware};

use common::*;

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .wrap(session_middleware(&$state.config))
                .configure(configure_routes),
        )
        .await
    };
}

macro_rules! send {
    ($app:expr, $jar:expr, $req:expr) => {{
        let mut req = $req;
        for cookie in $jar.all() {
            req = req.cookie(cookie);
        }
        let resp = test::call_service(&$app, req.to_request()).await;
        $jar.store(&resp);
        resp
    }};
}

/// Google provider whose token and userinfo endpoints point at the mock server.
async fn google_context(server: &MockServer) -> TestContext {
    let config = test_config(&[
        ("GOOGLE_CLIENT_ID", "g-id"),
        ("GOOGLE_CLIENT_SECRET", "g-secret"),
    ]);
    let mut providers = Providers::from_config(&config);
    for provider in providers.oauth.iter_mut() {
        if provider.id == ProviderId::Google {
            provider.authorization_url = format!("{}/authorize", server.uri());
            provider.token_url = format!("{}/token", server.uri());
            provider.userinfo.url = format!("{}/userinfo", server.uri());
        }
    }
    test_context(config, providers)
}

/// Facebook provider whose endpoints point at the mock server.
async fn facebook_context(server: &MockServer) -> TestContext {
    let config = test_config(&[
        ("FACEBOOK_CLIENT_ID", "fb-id"),
        ("FACEBOOK_CLIENT_SECRET", "fb-secret"),
    ]);
    let mut providers = Providers::from_config(&config);
    for provider in providers.oauth.iter_mut() {
        if provider.id == ProviderId::Facebook {
            provider.authorization_url = format!("{}/dialog/oauth", server.uri());
            provider.token_url = format!("{}/oauth/access_token", server.uri());
            provider.userinfo.url = format!("{}/me", server.uri());
        }
    }
    test_context(config, providers)
}

async fn mock_google(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-123",
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .and(header("authorization", "Bearer at-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sub": "1098765",
            "email": "ana@example.com",
            "email_verified": true,
            "name": "Ana Santos",
            "given_name": "Ana",
            "family_name": "Santos"
        })))
        .mount(server)
        .await;
}

#[actix_web::test]
async fn test_google_sign_in_creates_user_then_reuses_account() {
    let server = MockServer::start().await;
    mock_google(&server).await;
    let ctx = google_context(&server).await;
    let app = app!(ctx.state);
    let mut jar = CookieJar::default();

    let resp = send!(
        app,
        jar,
        test::TestRequest::get().uri("/api/auth/signin/google?callbackUrl=/dashboard")
    );
    assert_eq!(resp.status(), StatusCode::FOUND);
    let authorize = location(&resp);
    assert_eq!(authorize.path(), "/authorize");
    assert_eq!(query_param(&authorize, "client_id").as_deref(), Some("g-id"));
    assert_eq!(
        query_param(&authorize, "redirect_uri").as_deref(),
        Some("http://localhost:3000/api/auth/callback/google")
    );
    assert_eq!(query_param(&authorize, "code_challenge_method").as_deref(), Some("S256"));
    let state = query_param(&authorize, "state").expect("state param");

    let resp = send!(
        app,
        jar,
        test::TestRequest::get().uri(&format!("/api/auth/callback/google?code=abc&state={}", state))
    );
    assert_eq!(resp.status(), StatusCode::FOUND);
    let target = location(&resp);
    assert_eq!(target.path(), "/auth/new-user");
    assert_eq!(
        query_param(&target, "callbackUrl").as_deref(),
        Some("http://localhost:3000/dashboard")
    );
    assert!(jar.get(SESSION_COOKIE).is_some());

    let user = ctx
        .adapter
        .get_user_by_account("google", "1098765")
        .await
        .unwrap()
        .expect("linked user");
    assert_eq!(user.first_name.as_deref(), Some("Ana"));
    assert_eq!(user.last_name.as_deref(), Some("Santos"));
    assert_eq!(user.registration_type, Some(RegistrationType::Google));
    let accounts = ctx.adapter.accounts_for(&user.id);
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].access_token.as_deref(), Some("at-123"));

    let resp = send!(app, jar, test::TestRequest::get().uri("/api/auth/session"));
    let session: Value = test::read_body_json(resp).await;
    assert_eq!(session["user"]["firstName"], "Ana");
    assert_eq!(session["user"]["registrationType"], "google");

    // Second sign-in finds the account and skips the new-user page
    let resp = send!(app, jar, test::TestRequest::get().uri("/api/auth/signin/google?callbackUrl=/dashboard"));
    let state = query_param(&location(&resp), "state").unwrap();
    let resp = send!(
        app,
        jar,
        test::TestRequest::get().uri(&format!("/api/auth/callback/google?code=def&state={}", state))
    );
    assert_eq!(location(&resp).as_str(), "http://localhost:3000/dashboard");
    assert_eq!(ctx.adapter.user_count(), 1);
}

#[actix_web::test]
async fn test_google_links_existing_email_user() {
    let server = MockServer::start().await;
    mock_google(&server).await;
    let ctx = google_context(&server).await;
    let existing = ctx
        .adapter
        .create_user(NewUser {
            email: Some("ana@example.com".to_string()),
            first_name: Some("Ana".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    let app = app!(ctx.state);
    let mut jar = CookieJar::default();

    let resp = send!(app, jar, test::TestRequest::get().uri("/api/auth/signin/google"));
    let state = query_param(&location(&resp), "state").unwrap();
    let resp = send!(
        app,
        jar,
        test::TestRequest::get().uri(&format!("/api/auth/callback/google?code=abc&state={}", state))
    );

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp).as_str(), "http://localhost:3000/");
    assert_eq!(ctx.adapter.user_count(), 1);
    assert_eq!(ctx.adapter.accounts_for(&existing.id).len(), 1);
}

#[actix_web::test]
async fn test_state_mismatch_redirects_to_error_page() {
    let server = MockServer::start().await;
    mock_google(&server).await;
    let ctx = google_context(&server).await;
    let app = app!(ctx.state);
    let mut jar = CookieJar::default();

    send!(app, jar, test::TestRequest::get().uri("/api/auth/signin/google"));
    let resp = send!(
        app,
        jar,
        test::TestRequest::get().uri("/api/auth/callback/google?code=abc&state=forged")
    );

    assert_eq!(resp.status(), StatusCode::FOUND);
    let target = location(&resp);
    assert_eq!(target.path(), "/register");
    assert_eq!(query_param(&target, "error").as_deref(), Some("OAuthCallback"));
    assert!(jar.get(SESSION_COOKIE).is_none());
    assert_eq!(ctx.adapter.user_count(), 0);
}

#[actix_web::test]
async fn test_provider_error_redirects_to_error_page() {
    let server = MockServer::start().await;
    let ctx = google_context(&server).await;
    let app = app!(ctx.state);
    let mut jar = CookieJar::default();

    let resp = send!(app, jar, test::TestRequest::get().uri("/api/auth/signin/google"));
    let state = query_param(&location(&resp), "state").unwrap();
    let resp = send!(
        app,
        jar,
        test::TestRequest::get().uri(&format!(
            "/api/auth/callback/google?error=access_denied&state={}",
            state
        ))
    );

    let target = location(&resp);
    assert_eq!(query_param(&target, "error").as_deref(), Some("OAuthCallback"));
}

#[actix_web::test]
async fn test_userinfo_failure_redirects_to_error_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-123",
            "token_type": "bearer"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let ctx = google_context(&server).await;
    let app = app!(ctx.state);
    let mut jar = CookieJar::default();

    let resp = send!(app, jar, test::TestRequest::get().uri("/api/auth/signin/google"));
    let state = query_param(&location(&resp), "state").unwrap();
    let resp = send!(
        app,
        jar,
        test::TestRequest::get().uri(&format!("/api/auth/callback/google?code=abc&state={}", state))
    );

    let target = location(&resp);
    assert_eq!(query_param(&target, "error").as_deref(), Some("OAuthCallback"));
    assert_eq!(ctx.adapter.user_count(), 0);
}

#[actix_web::test]
async fn test_unconfigured_provider_is_rejected() {
    let server = MockServer::start().await;
    let ctx = google_context(&server).await;
    let app = app!(ctx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/auth/signin/facebook").to_request(),
    )
    .await;

    assert!(resp.status().is_client_error());
}

#[actix_web::test]
async fn test_facebook_sign_in_requests_profile_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fb-at",
            "token_type": "bearer",
            "expires_in": 5183944
        })))
        .mount(&server)
        .await;
    // only a request carrying the field list gets a profile back
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(has_query("fields", "id,name,email,first_name,last_name"))
        .and(header("authorization", "Bearer fb-at"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "10224321987654321",
            "name": "Juan Dela Cruz",
            "email": "Juan@Example.com",
            "first_name": "Juan",
            "last_name": "Dela Cruz"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = facebook_context(&server).await;
    let app = app!(ctx.state);
    let mut jar = CookieJar::default();

    let resp = send!(app, jar, test::TestRequest::get().uri("/api/auth/signin/facebook?callbackUrl=/home"));
    assert_eq!(resp.status(), StatusCode::FOUND);
    let authorize = location(&resp);
    assert_eq!(query_param(&authorize, "client_id").as_deref(), Some("fb-id"));
    assert_eq!(query_param(&authorize, "scope").as_deref(), Some("email"));
    assert!(query_param(&authorize, "code_challenge").is_none());
    let state = query_param(&authorize, "state").unwrap();

    let resp = send!(
        app,
        jar,
        test::TestRequest::get().uri(&format!("/api/auth/callback/facebook?code=fb-code&state={}", state))
    );
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp).path(), "/auth/new-user");

    let user = ctx
        .adapter
        .get_user_by_account("facebook", "10224321987654321")
        .await
        .unwrap()
        .expect("linked user");
    assert_eq!(user.email.as_deref(), Some("juan@example.com"));
    assert_eq!(user.first_name.as_deref(), Some("Juan"));
    assert_eq!(user.last_name.as_deref(), Some("Dela Cruz"));
    assert_eq!(user.registration_type, Some(RegistrationType::Facebook));
}
