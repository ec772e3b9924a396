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

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::realtime::events::{job_topic, progress_topic, ExecutionEvent, ProgressEvent};
use crate::realtime::hub::EventHub;
use crate::utils::retry_policy::RetryPolicy;

/// 监控连接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// 未连接
    Disconnected,
    /// 正在建立订阅
    Connecting,
    /// 已连接，正在接收事件
    Connected,
    /// 连接异常，按退避策略重连
    Error,
}

/// 实时监控器
///
/// 为每个被监控的任务维护两路订阅（执行事件与进度事件），
/// 把流中每个任务的最新记录镜像到内存映射，供快照查询。
/// 对同一任务的重复订阅是幂等的；通道中断后按退避策略
/// 重新订阅；停止时清空所有镜像与订阅。
pub struct RealtimeMonitor {
    hub: EventHub,
    /// 任务ID -> 最新执行事件
    executions: Arc<DashMap<Uuid, ExecutionEvent>>,
    /// 任务ID -> 最新进度事件
    progress: Arc<DashMap<Uuid, ProgressEvent>>,
    /// 任务ID -> 监听任务句柄
    subscriptions: DashMap<Uuid, JoinHandle<()>>,
    status: Arc<DashMap<Uuid, ConnectionStatus>>,
    retry_policy: RetryPolicy,
}

impl RealtimeMonitor {
    pub fn new(hub: EventHub) -> Self {
        Self {
            hub,
            executions: Arc::new(DashMap::new()),
            progress: Arc::new(DashMap::new()),
            subscriptions: DashMap::new(),
            status: Arc::new(DashMap::new()),
            retry_policy: RetryPolicy::slow(),
        }
    }

    /// 开始监控一组任务
    pub fn start_monitoring(&self, job_ids: &[Uuid]) {
        for id in job_ids {
            self.subscribe_job(*id);
        }
    }

    /// 开始监控一个任务
    ///
    /// 已在监控中的任务再次调用是空操作。
    pub fn subscribe_job(&self, job_id: Uuid) {
        if self.subscriptions.contains_key(&job_id) {
            return;
        }
        self.status.insert(job_id, ConnectionStatus::Connecting);

        let hub = self.hub.clone();
        let executions = Arc::clone(&self.executions);
        let progress = Arc::clone(&self.progress);
        let status = Arc::clone(&self.status);
        let policy = self.retry_policy.clone();

        let handle = tokio::spawn(async move {
            let mut attempt: u32;
            'reconnect: loop {
                let mut exec_rx = hub.subscribe(&job_topic(job_id));
                let mut progress_rx = hub.subscribe(&progress_topic(job_id));
                status.insert(job_id, ConnectionStatus::Connected);
                attempt = 0;

                loop {
                    tokio::select! {
                        received = exec_rx.recv() => match received {
                            Ok(value) => {
                                if let Ok(event) = serde_json::from_value::<ExecutionEvent>(value) {
                                    executions.insert(job_id, event);
                                }
                            }
                            Err(RecvError::Lagged(skipped)) => {
                                tracing::warn!(%job_id, skipped, "monitor lagged behind execution stream");
                            }
                            Err(RecvError::Closed) => {
                                status.insert(job_id, ConnectionStatus::Error);
                                attempt += 1;
                                if !policy.should_retry(attempt) {
                                    status.insert(job_id, ConnectionStatus::Disconnected);
                                    tracing::warn!(%job_id, "monitor gave up reconnecting");
                                    return;
                                }
                                let backoff = policy.calculate_backoff(attempt);
                                tokio::time::sleep(backoff).await;
                                continue 'reconnect;
                            }
                        },
                        received = progress_rx.recv() => match received {
                            Ok(value) => {
                                if let Ok(event) = serde_json::from_value::<ProgressEvent>(value) {
                                    progress.insert(job_id, event);
                                }
                            }
                            Err(RecvError::Lagged(skipped)) => {
                                tracing::warn!(%job_id, skipped, "monitor lagged behind progress stream");
                            }
                            Err(RecvError::Closed) => {
                                status.insert(job_id, ConnectionStatus::Error);
                                attempt += 1;
                                if !policy.should_retry(attempt) {
                                    status.insert(job_id, ConnectionStatus::Disconnected);
                                    return;
                                }
                                let backoff = policy.calculate_backoff(attempt);
                                tokio::time::sleep(backoff).await;
                                continue 'reconnect;
                            }
                        },
                    }
                }
            }
        });

        self.subscriptions.insert(job_id, handle);
    }

    /// 停止监控一个任务
    pub fn unsubscribe_job(&self, job_id: Uuid) {
        if let Some((_, handle)) = self.subscriptions.remove(&job_id) {
            handle.abort();
        }
        self.executions.remove(&job_id);
        self.progress.remove(&job_id);
        self.status.remove(&job_id);
    }

    /// 任务的连接状态
    pub fn status_of(&self, job_id: Uuid) -> ConnectionStatus {
        self.status
            .get(&job_id)
            .map(|s| *s)
            .unwrap_or(ConnectionStatus::Disconnected)
    }

    /// 任务的最新执行事件快照
    pub fn execution_snapshot(&self, job_id: Uuid) -> Option<ExecutionEvent> {
        self.executions.get(&job_id).map(|e| e.clone())
    }

    /// 任务的最新进度快照
    pub fn progress_snapshot(&self, job_id: Uuid) -> Option<ProgressEvent> {
        self.progress.get(&job_id).map(|e| e.clone())
    }

    /// 所有被监控任务的最新执行事件
    pub fn snapshot_all(&self) -> Vec<ExecutionEvent> {
        self.executions.iter().map(|e| e.value().clone()).collect()
    }

    /// 当前监控的任务数量
    pub fn watched_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// 停止所有监控并清空镜像
    pub fn stop_monitoring(&self) {
        for entry in self.subscriptions.iter() {
            entry.value().abort();
        }
        self.subscriptions.clear();
        self.executions.clear();
        self.progress.clear();
        self.status.clear();
    }
}

impl Drop for RealtimeMonitor {
    fn drop(&mut self) {
        self.stop_monitoring();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::events::ExecutionPhase;
    use std::time::Duration;

    #[tokio::test]
    async fn test_execution_mirror_is_last_write_wins() {
        let hub = EventHub::new();
        let monitor = RealtimeMonitor::new(hub.clone());
        let job_id = Uuid::new_v4();
        monitor.subscribe_job(job_id);
        tokio::time::sleep(Duration::from_millis(20)).await;

        let event = ExecutionEvent::new(job_id, ExecutionPhase::Started);
        hub.publish(&job_topic(job_id), serde_json::to_value(&event).unwrap());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(
            monitor.execution_snapshot(job_id).unwrap().phase,
            ExecutionPhase::Started
        );

        let event = ExecutionEvent::new(job_id, ExecutionPhase::Completed);
        hub.publish(&job_topic(job_id), serde_json::to_value(&event).unwrap());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(
            monitor.execution_snapshot(job_id).unwrap().phase,
            ExecutionPhase::Completed
        );
    }

    #[tokio::test]
    async fn test_progress_mirror_tracks_stage() {
        let hub = EventHub::new();
        let monitor = RealtimeMonitor::new(hub.clone());
        let job_id = Uuid::new_v4();
        monitor.subscribe_job(job_id);
        tokio::time::sleep(Duration::from_millis(20)).await;

        let event = ProgressEvent::new(job_id, "scraping", Some(40));
        hub.publish(
            &progress_topic(job_id),
            serde_json::to_value(&event).unwrap(),
        );
        tokio::time::sleep(Duration::from_millis(20)).await;

        let snap = monitor.progress_snapshot(job_id).unwrap();
        assert_eq!(snap.stage, "scraping");
        assert_eq!(snap.percent, Some(40));
    }

    #[tokio::test]
    async fn test_subscribe_is_idempotent() {
        let hub = EventHub::new();
        let monitor = RealtimeMonitor::new(hub);
        let job_id = Uuid::new_v4();
        monitor.subscribe_job(job_id);
        monitor.subscribe_job(job_id);
        monitor.subscribe_job(job_id);
        assert_eq!(monitor.watched_count(), 1);
    }

    #[tokio::test]
    async fn test_stop_monitoring_clears_everything() {
        let hub = EventHub::new();
        let monitor = RealtimeMonitor::new(hub.clone());
        let job_id = Uuid::new_v4();
        monitor.start_monitoring(&[job_id]);
        tokio::time::sleep(Duration::from_millis(20)).await;

        let event = ExecutionEvent::new(job_id, ExecutionPhase::Started);
        hub.publish(&job_topic(job_id), serde_json::to_value(&event).unwrap());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(monitor.execution_snapshot(job_id).is_some());

        monitor.stop_monitoring();
        assert_eq!(monitor.watched_count(), 0);
        assert!(monitor.execution_snapshot(job_id).is_none());
        assert!(monitor.progress_snapshot(job_id).is_none());
        assert_eq!(monitor.status_of(job_id), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_single_job() {
        let hub = EventHub::new();
        let monitor = RealtimeMonitor::new(hub);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        monitor.start_monitoring(&[a, b]);
        tokio::time::sleep(Duration::from_millis(20)).await;
        monitor.unsubscribe_job(a);
        assert_eq!(monitor.watched_count(), 1);
        assert_eq!(monitor.status_of(a), ConnectionStatus::Disconnected);
        assert_eq!(monitor.status_of(b), ConnectionStatus::Connected);
    }
}
