// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName},
    routing::{get, post, put},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::Role,
    error::ErrorBody,
    models::{
        AccessTier, BalanceResponse, Chapter, CreditRequest, CreditResponse, ImageListResponse,
        ImageUploadResponse, LedgerEntry, LedgerEntryKind, PublishChapterRequest,
        TransactionListResponse, UnlockRecord, UnlockResponse,
    },
    paywall::{AccessDecision, AccessType},
    state::AppState,
};

pub mod admin;
pub mod chapters;
pub mod currency;
pub mod health;
pub mod images;

/// JSON body sent with `Cache-Control: no-store`.
pub type NoStore<T> = ([(HeaderName, &'static str); 1], Json<T>);

pub fn no_store<T>(body: T) -> NoStore<T> {
    ([(header::CACHE_CONTROL, "no-store")], Json(body))
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/chapters/{chapter_id}/access", get(chapters::get_access))
        .route("/chapters/{chapter_id}/unlock", post(chapters::unlock_chapter))
        .route("/currency/balance", get(currency::get_balance))
        .route("/currency/transactions", get(currency::list_transactions))
        .route("/images/{folder}/{filename}", get(images::get_image))
        .route("/admin/chapters", post(admin::publish_chapter))
        .route("/admin/users/{user_id}/credit", post(admin::credit_user))
        .route("/admin/images/{folder}", get(images::list_images))
        .route(
            "/admin/images/{folder}/{filename}",
            put(images::put_image)
                .delete(images::delete_image)
                .layer(DefaultBodyLimit::max(images::MAX_IMAGE_BYTES)),
        );

    let request_id = HeaderName::from_static("x-request-id");

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        chapters::get_access,
        chapters::unlock_chapter,
        currency::get_balance,
        currency::list_transactions,
        admin::publish_chapter,
        admin::credit_user,
        images::get_image,
        images::put_image,
        images::delete_image,
        images::list_images
    ),
    components(
        schemas(
            AccessDecision,
            AccessType,
            AccessTier,
            Chapter,
            PublishChapterRequest,
            UnlockRecord,
            UnlockResponse,
            LedgerEntry,
            LedgerEntryKind,
            BalanceResponse,
            TransactionListResponse,
            CreditRequest,
            CreditResponse,
            ImageUploadResponse,
            ImageListResponse,
            images::ImageDeleteResponse,
            ErrorBody,
            Role,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Chapters", description = "Chapter access checks and unlocks"),
        (name = "Currency", description = "Balance and transaction history"),
        (name = "Admin", description = "Chapter publishing and currency grants"),
        (name = "Images", description = "Cover and chapter image storage")
    )
)]
pub struct ApiDoc;

/// Router-level request helpers for handler tests.
#[cfg(test)]
pub(crate) mod test_support {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
        Router,
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::state::AppState;
    use crate::storage::StoragePaths;

    pub struct TestApp {
        pub router: Router,
        _temp: TempDir,
    }

    pub async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    impl TestApp {
        pub async fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let state = AppState::open_for_tests(StoragePaths::new(temp.path())).await;
            Self {
                router: super::router(state),
                _temp: temp,
            }
        }

        fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            builder
        }

        pub async fn send(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.send(request).await;
            let status = response.status();
            let bytes = body_bytes(response).await;
            (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
        }

        pub async fn raw_get(&self, uri: &str, token: Option<&str>) -> Response {
            let request = Self::request(Method::GET, uri, token)
                .body(Body::empty())
                .unwrap();
            self.send(request).await
        }

        pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
            let request = Self::request(Method::GET, uri, token)
                .body(Body::empty())
                .unwrap();
            self.send_json(request).await
        }

        pub async fn post_json(
            &self,
            uri: &str,
            token: Option<&str>,
            body: Value,
        ) -> (StatusCode, Value) {
            let request = Self::request(Method::POST, uri, token)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            self.send_json(request).await
        }

        pub async fn put_bytes(
            &self,
            uri: &str,
            token: Option<&str>,
            body: Vec<u8>,
        ) -> (StatusCode, Value) {
            let request = Self::request(Method::PUT, uri, token)
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .body(Body::from(body))
                .unwrap();
            self.send_json(request).await
        }

        pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
            let request = Self::request(Method::DELETE, uri, token)
                .body(Body::empty())
                .unwrap();
            self.send_json(request).await
        }

        pub async fn publish(&self, admin_token: &str, chapter_id: &str, tier: &str, cost: u64) {
            let (status, body) = self
                .post_json(
                    "/api/admin/chapters",
                    Some(admin_token),
                    json!({
                        "chapterId": chapter_id,
                        "workId": "work-1",
                        "unlockCost": cost,
                        "accessTier": tier,
                    }),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "publish failed: {body}");
        }

        pub async fn credit(&self, admin_token: &str, user_id: &str, amount: u64) {
            let (status, body) = self
                .post_json(
                    &format!("/api/admin/users/{user_id}/credit"),
                    Some(admin_token),
                    json!({ "amount": amount }),
                )
                .await;
            assert_eq!(status, StatusCode::OK, "credit failed: {body}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::TestApp;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn health_probes_respond() {
        let app = TestApp::new().await;
        for uri in ["/health", "/health/live", "/health/ready"] {
            let (status, body) = app.get(uri, None).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body["status"], "ok");
        }
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = TestApp::new().await;
        let (status, body) = app.get("/api-doc/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/chapters/{chapter_id}/unlock"].is_object());
        assert!(body["components"]["securitySchemes"]["bearer_auth"].is_object());
    }

    #[tokio::test]
    async fn request_id_is_propagated() {
        let app = TestApp::new().await;
        let response = app.raw_get("/health/live", None).await;
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = TestApp::new().await;
        let (status, _) = app.get("/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
