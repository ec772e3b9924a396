// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::job_result::ResultStatus;
use crate::domain::repositories::{
    JobQueryParams, JobRepository, ProductRepository, ResultRepository,
};

/// 用户任务概览
#[derive(Debug, Clone, Serialize)]
pub struct JobOverview {
    pub total: u64,
    pub by_status: HashMap<String, u64>,
    pub scheduled: u64,
}

/// 任务执行汇总
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionSummary {
    pub runs: usize,
    pub successes: usize,
    pub failures: usize,
    /// 成功率（0-1），无执行记录时为0
    pub success_rate: f64,
    pub avg_duration_ms: f64,
    pub total_tokens: u64,
}

/// 产品价格汇总
#[derive(Debug, Clone, Serialize)]
pub struct PriceSummary {
    pub points: usize,
    pub currency: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub first: Option<f64>,
    pub latest: Option<f64>,
    /// 相对首个记录价格的变化百分比
    pub change_pct: Option<f64>,
}

/// 分析服务
///
/// 从持久化数据即时聚合统计，不维护物化视图。
pub struct AnalyticsService {
    jobs: Arc<dyn JobRepository>,
    results: Arc<dyn ResultRepository>,
    products: Arc<dyn ProductRepository>,
}

impl AnalyticsService {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        results: Arc<dyn ResultRepository>,
        products: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            jobs,
            results,
            products,
        }
    }

    /// 用户的任务概览
    pub async fn job_overview(&self, user_id: Uuid) -> Result<JobOverview> {
        let params = JobQueryParams {
            user_id,
            limit: 1000,
            ..Default::default()
        };
        let (jobs, total) = self.jobs.query_jobs(params).await?;

        let mut by_status: HashMap<String, u64> = HashMap::new();
        let mut scheduled = 0;
        for job in &jobs {
            *by_status.entry(job.status.to_string()).or_insert(0) += 1;
            if job.schedule_enabled {
                scheduled += 1;
            }
        }
        Ok(JobOverview {
            total,
            by_status,
            scheduled,
        })
    }

    /// 任务最近若干次执行的汇总
    pub async fn execution_summary(&self, job_id: Uuid, window: u64) -> Result<ExecutionSummary> {
        let results = self.results.find_by_job_id(job_id, window).await?;

        let runs = results.len();
        let successes = results
            .iter()
            .filter(|r| matches!(r.status, ResultStatus::Success | ResultStatus::Partial))
            .count();
        let failures = runs - successes;
        let success_rate = if runs == 0 {
            0.0
        } else {
            successes as f64 / runs as f64
        };
        let avg_duration_ms = if runs == 0 {
            0.0
        } else {
            results.iter().map(|r| r.duration_ms as f64).sum::<f64>() / runs as f64
        };
        let total_tokens = results
            .iter()
            .map(|r| r.token_usage.total_tokens as u64)
            .sum();

        Ok(ExecutionSummary {
            runs,
            successes,
            failures,
            success_rate,
            avg_duration_ms,
            total_tokens,
        })
    }

    /// 产品价格历史的汇总
    pub async fn price_summary(
        &self,
        product_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<PriceSummary> {
        let history = self.products.price_history(product_id, since).await?;

        if history.is_empty() {
            return Ok(PriceSummary {
                points: 0,
                currency: None,
                min: None,
                max: None,
                avg: None,
                first: None,
                latest: None,
                change_pct: None,
            });
        }

        let prices: Vec<f64> = history.iter().map(|p| p.price).collect();
        let min = prices.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let avg = prices.iter().sum::<f64>() / prices.len() as f64;
        let first = prices[0];
        let latest = prices[prices.len() - 1];
        let change_pct = if first.abs() > f64::EPSILON {
            Some((latest - first) / first * 100.0)
        } else {
            None
        };

        Ok(PriceSummary {
            points: history.len(),
            currency: history.first().map(|p| p.currency.clone()),
            min: Some(min),
            max: Some(max),
            avg: Some(avg),
            first: Some(first),
            latest: Some(latest),
            change_pct,
        })
    }
}
