use std::net::SocketAddr;

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{auth, characters, error::AppError, reviews, sitcoms, state::AppState};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Hello, Sitcomverse API is running!" }))
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(sitcoms::router())
                .merge(characters::router())
                .merge(reviews::router()),
        )
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::map_response(method_not_allowed_as_json))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

async fn not_found() -> AppError {
    AppError::NotFound("Resource not found".into())
}

/// axum answers a known path with the wrong method with an empty 405.
async fn method_not_allowed_as_json(res: Response) -> Response {
    if res.status() == StatusCode::METHOD_NOT_ALLOWED {
        AppError::MethodNotAllowed.into_response()
    } else {
        res
    }
}

pub async fn serve(app: Router, addr: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = addr.parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt as _;

    use super::*;

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let res = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register_and_login(app: &Router, name: &str) -> (i64, String) {
        let (status, body) = call(
            app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "username": name, "email": format!("{name}@x.com"), "password": "pw123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["user"]["id"].as_i64().unwrap();

        let (status, body) = call(
            app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": name, "password": "pw123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        (id, body["access_token"].as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn root_banner() {
        let app = build_app(AppState::in_memory());
        let res = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Hello, Sitcomverse API is running!");
    }

    #[tokio::test]
    async fn register_response_hides_password_digest() {
        let app = build_app(AppState::in_memory());
        let (status, body) = call(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "username": "alice", "email": "alice@x.com", "password": "pw123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "User registered successfully");
        assert_eq!(body["user"]["username"], "alice");
        assert!(body["user"].get("password_hash").is_none());
        assert!(!body.to_string().contains("argon2"));
    }

    #[tokio::test]
    async fn protected_routes_require_a_valid_token() {
        let app = build_app(AppState::in_memory());

        let (status, body) = call(&app, "GET", "/api/auth/protected", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["message"].is_string());

        let (status, _) = call(&app, "GET", "/api/auth/protected", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(
            &app,
            "POST",
            "/api/sitcoms",
            None,
            Some(json!({ "title": "Friends", "genre": "Comedy" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (id, token) = register_and_login(&app, "alice").await;
        let (status, body) = call(&app, "GET", "/api/auth/protected", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["logged_in_as"], id.to_string());
    }

    #[tokio::test]
    async fn token_for_a_missing_user_is_401() {
        let state = AppState::in_memory();
        let token = state.keys.sign_access(999).unwrap();
        let app = build_app(state);

        let (status, body) = call(&app, "GET", "/api/auth/protected", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "User no longer exists");
    }

    #[tokio::test]
    async fn bad_login_is_401_and_missing_fields_400() {
        let app = build_app(AppState::in_memory());
        register_and_login(&app, "alice").await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@x.com", "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");

        let (status, _) = call(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "password": "pw123" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_body_and_path_are_json_400() {
        let app = build_app(AppState::in_memory());
        let (_, token) = register_and_login(&app, "alice").await;

        let req = Request::post("/api/sitcoms")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value =
            serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await.unwrap()).unwrap();
        assert!(body["message"].as_str().unwrap().starts_with("Invalid JSON body"));

        let (status, body) = call(&app, "GET", "/api/sitcoms/abc", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn unknown_route_and_wrong_method_are_json() {
        let app = build_app(AppState::in_memory());

        let (status, body) = call(&app, "GET", "/api/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Resource not found");

        let (status, body) = call(&app, "PATCH", "/api/sitcoms", None, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["message"], "Method not allowed");
    }

    #[tokio::test]
    async fn sitcom_ownership_is_403_and_review_authorship_is_404() {
        let app = build_app(AppState::in_memory());
        let (_, alice) = register_and_login(&app, "alice").await;
        let (_, bob) = register_and_login(&app, "bob").await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/sitcoms",
            Some(&alice),
            Some(json!({ "title": "Friends", "genre": "Comedy" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let sitcom_id = body["sitcom"]["id"].as_i64().unwrap();

        let (status, _) = call(
            &app,
            "PUT",
            &format!("/api/sitcoms/{sitcom_id}"),
            Some(&bob),
            Some(json!({ "title": "Enemies" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/sitcoms/{sitcom_id}/characters"),
            Some(&bob),
            Some(json!({ "name": "Gunther" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/sitcoms/{sitcom_id}/reviews"),
            Some(&bob),
            Some(json!({ "score": 3, "text": "Fine" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let review_id = body["review"]["id"].as_i64().unwrap();

        let (status, _) = call(
            &app,
            "DELETE",
            &format!("/api/sitcoms/{sitcom_id}/reviews/{review_id}"),
            Some(&alice),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(
            &app,
            "GET",
            &format!("/api/sitcoms/{sitcom_id}"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Friends");
        assert_eq!(body["average_rating"], 3.0);
    }

    #[tokio::test]
    async fn catalog_lifecycle() {
        let app = build_app(AppState::in_memory());
        let (alice_id, alice) = register_and_login(&app, "alice").await;
        let (_, bob) = register_and_login(&app, "bob").await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/sitcoms",
            Some(&alice),
            Some(json!({ "title": "Friends", "genre": "Comedy", "number_of_seasons": 10 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["sitcom"]["user_id"], alice_id);
        let id = body["sitcom"]["id"].as_i64().unwrap();
        let sitcom_uri = format!("/api/sitcoms/{id}");

        let (status, body) = call(&app, "GET", &sitcom_uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["average_rating"].is_null());

        let (status, _) = call(
            &app,
            "POST",
            "/api/sitcoms",
            Some(&bob),
            Some(json!({ "title": "Friends", "genre": "Drama" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = call(
            &app,
            "PUT",
            &sitcom_uri,
            Some(&alice),
            Some(json!({ "number_of_seasons": -1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());

        let (status, body) = call(
            &app,
            "PUT",
            &sitcom_uri,
            Some(&alice),
            Some(json!({ "synopsis": "Six friends in New York" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sitcom"]["genre"], "Comedy");
        assert_eq!(body["sitcom"]["number_of_seasons"], 10);
        assert_eq!(body["sitcom"]["synopsis"], "Six friends in New York");

        let (status, body) = call(
            &app,
            "POST",
            &format!("{sitcom_uri}/characters"),
            Some(&alice),
            Some(json!({ "name": "Chandler Bing", "actor": "Matthew Perry" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let character_id = body["character"]["id"].as_i64().unwrap();

        let review = json!({ "score": 5, "text": "Classic" });
        let reviews_uri = format!("{sitcom_uri}/reviews");
        let (status, _) = call(&app, "POST", &reviews_uri, Some(&bob), Some(review.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = call(&app, "POST", &reviews_uri, Some(&bob), Some(review)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(
            &app,
            "POST",
            &reviews_uri,
            Some(&alice),
            Some(json!({ "score": 6 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = call(&app, "GET", &sitcom_uri, None, None).await;
        assert_eq!(body["average_rating"], 5.0);

        let (status, _) = call(&app, "DELETE", &sitcom_uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(&app, "DELETE", &sitcom_uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Sitcom deleted successfully");

        let (status, _) = call(&app, "GET", &sitcom_uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(
            &app,
            "GET",
            &format!("{sitcom_uri}/characters/{character_id}"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, "GET", &reviews_uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = call(&app, "GET", "/api/sitcoms", None, None).await;
        assert_eq!(body, json!([]));
    }
}
