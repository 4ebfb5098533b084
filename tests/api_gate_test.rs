mod common;

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use stockroom_api::auth::{auth_routes, AuthService};
use stockroom_api::{api_v1_routes, AppState};

use common::TestApp;

const TEST_PASSWORD: &str = "correct horse battery staple";

/// Router wired the way `main` wires it: v1 API + auth routes + the
/// extension-injection middleware the extractor relies on.
fn build_router(app: &TestApp) -> Router {
    let state = AppState {
        db: app.db.clone(),
        config: stockroom_api::config::load_config().expect("config"),
        services: app.services.clone(),
    };

    let auth_service = Arc::new(AuthService::new(TEST_PASSWORD.to_string()));

    Router::new()
        .nest("/api/v1", api_v1_routes())
        .nest("/auth", auth_routes().with_state(auth_service.clone()))
        .layer(axum::middleware::from_fn_with_state(
            auth_service,
            |axum::extract::State(auth): axum::extract::State<Arc<AuthService>>,
             mut req: axum::http::Request<Body>,
             next: axum::middleware::Next| async move {
                req.extensions_mut().insert(auth);
                next.run(req).await
            },
        ))
        .with_state(state)
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse body")
}

async fn login(router: &Router) -> String {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"password": TEST_PASSWORD}).to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("login response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    body["data"]["token"]
        .as_str()
        .expect("token in body")
        .to_string()
}

#[tokio::test]
async fn requests_without_a_session_are_rejected() {
    let app = TestApp::new().await;
    let router = build_router(&app);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/products")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().is_some());
}

#[tokio::test]
async fn wrong_password_does_not_open_a_session() {
    let app = TestApp::new().await;
    let router = build_router(&app);

    let response = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"password": "guess"}).to_string()))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn a_session_token_unlocks_the_api() {
    let app = TestApp::new().await;
    let router = build_router(&app);
    let token = login(&router).await;

    // create a customer through the HTTP surface
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/customers")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::from(json!({"name": "Ada"}).to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    // and read the listing back
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/customers")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(body["data"][0]["name"], "Ada");
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let app = TestApp::new().await;
    let router = build_router(&app);
    let token = login(&router).await;

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/auth/logout")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/orders")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
