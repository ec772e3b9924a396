// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含应用程序层的数据传输对象
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、服务和仓库接口
pub mod domain;

/// 执行器模块
///
/// 实现任务认领、执行编排和定时调度
pub mod executor;

/// 导出模块
///
/// 将执行结果序列化为CSV和JSON下载格式
pub mod export;

/// 基础设施模块
///
/// 提供外部服务集成，如数据库、AI接口和通知投递
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由、处理器和中间件
pub mod presentation;

/// 实时模块
///
/// 提供进程内事件广播和执行状态镜像
pub mod realtime;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;
