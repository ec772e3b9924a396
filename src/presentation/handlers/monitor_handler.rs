// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::stream::{self, StreamExt};
use serde_json::json;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::domain::errors::ErrorMonitor;
use crate::presentation::errors::AppError;
use crate::realtime::events::{job_topic, ALL_JOBS_TOPIC};
use crate::realtime::{EventHub, RealtimeMonitor};

/// 监控快照
///
/// 返回所有被监控任务的最新执行事件、进度和错误统计。
pub async fn snapshot(
    Extension(monitor): Extension<Arc<RealtimeMonitor>>,
    Extension(errors): Extension<Arc<ErrorMonitor>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let executions = monitor.snapshot_all();
    let stats = errors.stats();
    Ok(Json(json!({
        "watched_jobs": monitor.watched_count(),
        "executions": executions,
        "errors": stats,
    })))
}

/// 开始监控一个任务
///
/// 幂等：重复监控同一任务不会产生新的订阅。
pub async fn watch_job(
    Extension(monitor): Extension<Arc<RealtimeMonitor>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    monitor.subscribe_job(job_id);
    Ok(Json(json!({
        "job_id": job_id,
        "status": monitor.status_of(job_id),
        "watched_jobs": monitor.watched_count(),
    })))
}

/// 停止监控一个任务
pub async fn unwatch_job(
    Extension(monitor): Extension<Arc<RealtimeMonitor>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    monitor.unsubscribe_job(job_id);
    Ok(Json(json!({
        "job_id": job_id,
        "watched_jobs": monitor.watched_count(),
    })))
}

/// 单任务的监控快照
pub async fn job_snapshot(
    Extension(monitor): Extension<Arc<RealtimeMonitor>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(json!({
        "job_id": job_id,
        "status": monitor.status_of(job_id),
        "execution": monitor.execution_snapshot(job_id),
        "progress": monitor.progress_snapshot(job_id),
    })))
}

/// 最近错误列表（环形缓冲，最多50条）
pub async fn recent_errors(
    Extension(errors): Extension<Arc<ErrorMonitor>>,
) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(json!({ "errors": errors.recent() })))
}

fn event_stream(
    rx: tokio::sync::broadcast::Receiver<serde_json::Value>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let connected =
        stream::once(async { Ok::<_, Infallible>(Event::default().event("connected").data("ok")) });

    let events = BroadcastStream::new(rx).filter_map(|result| async {
        match result {
            Ok(value) => {
                let event_name = value
                    .get("phase")
                    .and_then(|p| p.as_str())
                    .unwrap_or("message")
                    .to_string();
                Event::default()
                    .event(event_name)
                    .json_data(&value)
                    .ok()
                    .map(Ok::<_, Infallible>)
            }
            Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(n)) => {
                Event::default()
                    .event("lagged")
                    .json_data(&json!({"missed": n}))
                    .ok()
                    .map(Ok::<_, Infallible>)
            }
        }
    });

    Sse::new(connected.chain(events)).keep_alive(KeepAlive::default())
}

/// 全部任务事件的SSE流
pub async fn stream_all_events(
    Extension(hub): Extension<EventHub>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    event_stream(hub.subscribe(ALL_JOBS_TOPIC))
}

/// 单任务事件的SSE流
pub async fn stream_job_events(
    Extension(hub): Extension<EventHub>,
    Path(job_id): Path<Uuid>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    event_stream(hub.subscribe(&job_topic(job_id)))
}
