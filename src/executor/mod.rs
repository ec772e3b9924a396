// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 执行器模块
///
/// 提供任务执行编排和定时调度功能
pub mod job_executor;
pub mod scheduler;

pub use job_executor::{ExecutorError, JobExecutor};
pub use scheduler::Scheduler;
