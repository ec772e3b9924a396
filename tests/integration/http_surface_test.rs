// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::middleware;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use scrapeloom::presentation::middleware::auth_middleware::{auth_middleware, AuthState};
use scrapeloom::presentation::routes;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower::util::ServiceExt;

/// 认证中间件拒绝请求时不触达数据库，断开的连接足够
fn guarded_routes() -> axum::Router {
    let auth_state = AuthState {
        db: Arc::new(DatabaseConnection::Disconnected),
    };
    routes::protected_routes().layer(middleware::from_fn_with_state(auth_state, auth_middleware))
}

/// 健康检查测试
///
/// 验证健康检查端点无需认证即可访问
#[tokio::test]
async fn health_check_works() {
    let app = routes::public_routes();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

/// 版本端点返回包版本号
#[tokio::test]
async fn version_endpoint_reports_package_version() {
    let app = routes::public_routes();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/version")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(body, env!("CARGO_PKG_VERSION").as_bytes());
}

/// 无认证头访问任务端点返回401
#[tokio::test]
async fn jobs_endpoint_returns_401_without_auth() {
    let app = guarded_routes();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/jobs")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// 非Bearer方案的认证头同样返回401
#[tokio::test]
async fn non_bearer_scheme_returns_401() {
    let app = guarded_routes();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/jobs")
                .header("Authorization", "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
