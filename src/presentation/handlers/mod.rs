// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP处理器模块
///
/// 包含各资源的axum处理函数，保持轻薄：
/// 解析与校验请求、校验归属、委托领域服务、序列化响应。
pub mod analytics_handler;
pub mod discovery_handler;
pub mod job_handler;
pub mod monitor_handler;
pub mod notification_handler;
pub mod product_handler;
pub mod website_handler;
