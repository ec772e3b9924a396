// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::domain::repositories::JobRepository;
use crate::executor::job_executor::{ExecutorError, JobExecutor};

/// 调度器
///
/// 后台滴答循环：找到到期的定时任务并触发执行，执行前
/// 先写好下一次运行时间，避免同一到期点被重复触发；
/// 顺带重置卡在 running 状态过久的任务。
pub struct Scheduler {
    jobs: Arc<dyn JobRepository>,
    executor: Arc<JobExecutor>,
    tick_interval: Duration,
    stuck_timeout: chrono::Duration,
}

impl Scheduler {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        executor: Arc<JobExecutor>,
        tick_interval: Duration,
        stuck_timeout: chrono::Duration,
    ) -> Self {
        Self {
            jobs,
            executor,
            tick_interval,
            stuck_timeout,
        }
    }

    /// 运行调度循环
    pub async fn run(self: Arc<Self>) {
        info!(interval = ?self.tick_interval, "scheduler started");
        loop {
            if let Err(e) = self.tick().await {
                error!("scheduler tick failed: {}", e);
            }
            sleep(self.tick_interval).await;
        }
    }

    /// 单次调度滴答
    pub async fn tick(&self) -> Result<()> {
        let reset = self.jobs.reset_stuck_jobs(self.stuck_timeout).await?;
        if reset > 0 {
            warn!(count = reset, "reset stuck jobs");
            metrics::counter!("scheduler_stuck_jobs_reset_total").increment(reset);
        }

        let now = Utc::now();
        let due = self.jobs.find_due_scheduled(now).await?;
        if due.is_empty() {
            return Ok(());
        }
        info!(count = due.len(), "due scheduled jobs found");

        for mut job in due {
            // 先推进下一次运行时间，失败的执行不会导致风暴
            let next = job
                .schedule
                .as_ref()
                .and_then(|s| s.next_run_after(now));
            job.next_run_at = next.map(|n| n.into());
            if next.is_none() {
                job.schedule_enabled = false;
            }
            if let Err(e) = self.jobs.update(&job).await {
                error!(job_id = %job.id, "failed to advance schedule: {}", e);
                continue;
            }

            let executor = Arc::clone(&self.executor);
            let job_id = job.id;
            tokio::spawn(async move {
                match executor.execute(job_id, "").await {
                    Ok(result) => {
                        info!(%job_id, execution_id = %result.id, "scheduled execution finished");
                    }
                    Err(ExecutorError::AlreadyRunning) => {
                        // 手动触发抢先了，跳过本次调度
                        info!(%job_id, "scheduled execution skipped, already running");
                    }
                    Err(e) => {
                        error!(%job_id, "scheduled execution failed: {}", e);
                    }
                }
            });
            metrics::counter!("scheduler_jobs_triggered_total").increment(1);
        }

        Ok(())
    }
}
