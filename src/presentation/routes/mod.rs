// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use crate::infrastructure::repositories::notification_repo_impl::NotificationRepositoryImpl;
use crate::infrastructure::repositories::product_repo_impl::ProductRepositoryImpl;
use crate::infrastructure::repositories::result_repo_impl::ResultRepositoryImpl;
use crate::infrastructure::repositories::website_repo_impl::WebsiteRepositoryImpl;
use crate::presentation::handlers::{
    analytics_handler, discovery_handler, job_handler, monitor_handler, notification_handler,
    product_handler, website_handler,
};
use axum::{
    routing::{delete, get, post, put},
    Router,
};

/// 创建受保护的应用路由
///
/// 认证中间件和Extension层由调用方（main）挂载。
pub fn protected_routes() -> Router {
    Router::new()
        .route("/v1/jobs", get(job_handler::list_jobs::<JobRepositoryImpl>))
        .route("/v1/jobs", post(job_handler::create_job::<JobRepositoryImpl>))
        .route(
            "/v1/jobs/query",
            post(job_handler::query_jobs::<JobRepositoryImpl>),
        )
        .route(
            "/v1/jobs/from-template",
            post(job_handler::create_from_template::<JobRepositoryImpl>),
        )
        .route("/v1/jobs/templates", get(job_handler::list_templates))
        .route("/v1/jobs/test-run", post(job_handler::test_run))
        .route(
            "/v1/jobs/{id}",
            get(job_handler::get_job::<JobRepositoryImpl>),
        )
        .route(
            "/v1/jobs/{id}",
            put(job_handler::update_job::<JobRepositoryImpl>),
        )
        .route(
            "/v1/jobs/{id}",
            delete(job_handler::delete_job::<JobRepositoryImpl, ResultRepositoryImpl>),
        )
        .route(
            "/v1/jobs/{id}/execute",
            post(job_handler::execute_job::<JobRepositoryImpl>),
        )
        .route(
            "/v1/jobs/{id}/cancel",
            post(job_handler::cancel_job::<JobRepositoryImpl>),
        )
        .route(
            "/v1/jobs/{id}/results",
            get(job_handler::list_results::<JobRepositoryImpl, ResultRepositoryImpl>),
        )
        .route(
            "/v1/jobs/{id}/results/latest",
            get(job_handler::latest_result::<JobRepositoryImpl, ResultRepositoryImpl>),
        )
        .route(
            "/v1/jobs/{id}/export",
            get(job_handler::export_results::<JobRepositoryImpl, ResultRepositoryImpl>),
        )
        .route(
            "/v1/jobs/{id}/summary",
            get(analytics_handler::execution_summary),
        )
        .route(
            "/v1/discovery/products",
            post(discovery_handler::discover_products),
        )
        .route(
            "/v1/discovery/sources",
            post(discovery_handler::discover_sources),
        )
        .route(
            "/v1/discovery/sessions",
            get(discovery_handler::list_sessions),
        )
        .route(
            "/v1/products",
            get(product_handler::list_products::<ProductRepositoryImpl>),
        )
        .route(
            "/v1/products",
            post(product_handler::create_product::<ProductRepositoryImpl>),
        )
        .route(
            "/v1/products/{id}",
            delete(product_handler::delete_product::<ProductRepositoryImpl>),
        )
        .route(
            "/v1/products/{id}/prices",
            post(product_handler::record_price::<ProductRepositoryImpl>),
        )
        .route(
            "/v1/products/{id}/prices",
            get(product_handler::price_history::<ProductRepositoryImpl>),
        )
        .route(
            "/v1/websites",
            get(website_handler::list_websites::<WebsiteRepositoryImpl>),
        )
        .route(
            "/v1/notifications/settings",
            get(notification_handler::get_settings::<NotificationRepositoryImpl>),
        )
        .route(
            "/v1/notifications/settings",
            put(notification_handler::save_settings::<NotificationRepositoryImpl>),
        )
        .route(
            "/v1/notifications/recent",
            get(notification_handler::recent_notifications::<NotificationRepositoryImpl>),
        )
        .route("/v1/analytics/overview", get(analytics_handler::job_overview))
        .route(
            "/v1/analytics/products/{id}/prices",
            get(analytics_handler::price_summary),
        )
        .route("/v1/monitor/snapshot", get(monitor_handler::snapshot))
        .route(
            "/v1/monitor/jobs/{id}",
            get(monitor_handler::job_snapshot),
        )
        .route(
            "/v1/monitor/jobs/{id}/watch",
            post(monitor_handler::watch_job),
        )
        .route(
            "/v1/monitor/jobs/{id}/watch",
            delete(monitor_handler::unwatch_job),
        )
        .route("/v1/monitor/errors", get(monitor_handler::recent_errors))
        .route("/v1/monitor/stream", get(monitor_handler::stream_all_events))
        .route(
            "/v1/monitor/stream/{id}",
            get(monitor_handler::stream_job_events),
        )
}

/// 创建公开路由
pub fn public_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version))
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
