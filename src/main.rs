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

use axum::Extension;
use axum::Router;
use scrapeloom::config::settings::Settings;
use scrapeloom::domain::errors::ErrorMonitor;
use scrapeloom::domain::services::ai_client::AiClient;
use scrapeloom::domain::services::analytics_service::AnalyticsService;
use scrapeloom::domain::services::discovery_service::DiscoveryService;
use scrapeloom::domain::services::notification_service::{
    NotificationDelivery, NotificationService,
};
use scrapeloom::domain::services::scrape_service::ScrapeService;
use scrapeloom::executor::{JobExecutor, Scheduler};
use scrapeloom::infrastructure::ai::OpenAiClient;
use scrapeloom::infrastructure::database::connection;
use scrapeloom::infrastructure::notifications::HttpDelivery;
use scrapeloom::infrastructure::repositories::ai_session_repo_impl::AiSessionRepositoryImpl;
use scrapeloom::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use scrapeloom::infrastructure::repositories::notification_repo_impl::NotificationRepositoryImpl;
use scrapeloom::infrastructure::repositories::product_repo_impl::ProductRepositoryImpl;
use scrapeloom::infrastructure::repositories::result_repo_impl::ResultRepositoryImpl;
use scrapeloom::infrastructure::repositories::website_repo_impl::WebsiteRepositoryImpl;
use scrapeloom::presentation::middleware::auth_middleware::{auth_middleware, AuthState};
use scrapeloom::presentation::routes;
use scrapeloom::realtime::{EventHub, RealtimeMonitor};
use scrapeloom::utils::telemetry;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

use migration::{Migrator, MigratorTrait};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting scrapeloom...");

    // Initialize Prometheus Metrics
    scrapeloom::infrastructure::metrics::init_metrics();

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // 3. Connect to database
    let db = connection::create_pool(&settings.database).await?;
    let db = Arc::new(db);
    info!("Database connection established");

    // Run database migrations
    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Initialize repositories
    let job_repo = Arc::new(JobRepositoryImpl::new(db.clone()));
    let result_repo = Arc::new(ResultRepositoryImpl::new(db.clone()));
    let product_repo = Arc::new(ProductRepositoryImpl::new(db.clone()));
    let website_repo = Arc::new(WebsiteRepositoryImpl::new(db.clone()));
    let session_repo = Arc::new(AiSessionRepositoryImpl::new(db.clone()));
    let notification_repo = Arc::new(NotificationRepositoryImpl::new(db.clone()));

    // 5. Initialize services
    let ai_client: Arc<dyn AiClient> = Arc::new(OpenAiClient::new(&settings.ai)?);
    let scrape_service = Arc::new(ScrapeService::new(
        ai_client.clone(),
        settings.ai.default_model.clone(),
        settings.ai.vision_model.clone(),
    ));
    let delivery: Arc<dyn NotificationDelivery> =
        Arc::new(HttpDelivery::new(&settings.notification)?);
    let notification_service = Arc::new(NotificationService::new(
        notification_repo.clone(),
        delivery,
    ));
    let discovery_service = Arc::new(DiscoveryService::new(
        ai_client.clone(),
        session_repo.clone(),
        product_repo.clone(),
        website_repo.clone(),
        settings.ai.default_model.clone(),
    ));
    let analytics_service = Arc::new(AnalyticsService::new(
        job_repo.clone(),
        result_repo.clone(),
        product_repo.clone(),
    ));
    let error_monitor = Arc::new(ErrorMonitor::new());

    // 6. Realtime hub and monitoring mirror
    let hub = EventHub::with_capacity(settings.realtime.channel_capacity);
    let realtime_monitor = Arc::new(RealtimeMonitor::new(hub.clone()));

    // 7. Executor and scheduler
    let executor = Arc::new(JobExecutor::new(
        job_repo.clone(),
        result_repo.clone(),
        scrape_service.clone(),
        hub.clone(),
        notification_service.clone(),
        error_monitor.clone(),
    ));

    let scheduler = Arc::new(Scheduler::new(
        job_repo.clone(),
        executor.clone(),
        Duration::from_secs(settings.scheduler.tick_interval),
        chrono::Duration::minutes(settings.scheduler.stuck_timeout_minutes),
    ));
    tokio::spawn(scheduler.run());
    info!("Scheduler started");

    // 8. Setup auth state
    let auth_state = AuthState { db: db.clone() };

    // 9. Start HTTP server
    let protected = routes::protected_routes()
        .layer(axum::middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ))
        .layer(Extension(job_repo))
        .layer(Extension(result_repo))
        .layer(Extension(product_repo))
        .layer(Extension(website_repo))
        .layer(Extension(notification_repo))
        .layer(Extension(executor))
        .layer(Extension(discovery_service))
        .layer(Extension(analytics_service))
        .layer(Extension(error_monitor))
        .layer(Extension(realtime_monitor))
        .layer(Extension(hub));

    let app = Router::new()
        .merge(routes::public_routes())
        .merge(protected)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
