// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 包含核心业务实体：任务、结果、产品、来源站点、
/// AI会话、通知设置及其状态枚举
pub mod ai_session;
pub mod job;
pub mod job_result;
pub mod notification;
pub mod product;
pub mod schedule;
pub mod template;
pub mod website;
