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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含数据库、服务器、AI、通知、调度和实时通道等所有配置项。
/// 数据库URL和AI API密钥没有默认值，缺失时启动即失败。
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 服务器配置
    pub server: ServerSettings,
    /// AI服务配置
    pub ai: AiSettings,
    /// 通知配置
    pub notification: NotificationSettingsConfig,
    /// 调度器配置
    pub scheduler: SchedulerSettings,
    /// 实时通道配置
    pub realtime: RealtimeSettings,
}

/// 数据库配置设置
#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// 服务器配置设置
#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// AI服务配置设置
#[derive(Debug, Deserialize, Clone)]
pub struct AiSettings {
    /// AI API密钥
    pub api_key: String,
    /// API基础URL（OpenAI兼容）
    pub api_base_url: String,
    /// 默认模型名称
    pub default_model: String,
    /// 支持视觉输入的模型名称
    pub vision_model: String,
    /// 调用超时时间（秒）
    pub request_timeout: u64,
}

/// 通知配置设置
#[derive(Debug, Deserialize, Clone)]
pub struct NotificationSettingsConfig {
    /// 远程投递函数的URL
    pub delivery_url: String,
    /// 投递负载签名密钥
    pub secret: String,
    /// 投递超时时间（秒）
    pub request_timeout: u64,
}

/// 调度器配置设置
#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerSettings {
    /// 调度检查间隔（秒）
    pub tick_interval: u64,
    /// 卡住任务重置阈值（分钟）
    pub stuck_timeout_minutes: i64,
}

/// 实时通道配置设置
#[derive(Debug, Deserialize, Clone)]
pub struct RealtimeSettings {
    /// 每个广播通道的容量
    pub channel_capacity: usize,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败（缺少数据库URL或AI密钥也属于此类）
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Start with default settings
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            // Default DB pool settings
            .set_default("database.max_connections", 100)?
            .set_default("database.min_connections", 10)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default AI settings (api_key intentionally has no default)
            .set_default("ai.api_base_url", "https://api.openai.com/v1")?
            .set_default("ai.default_model", "gpt-4o-mini")?
            .set_default("ai.vision_model", "gpt-4o")?
            .set_default("ai.request_timeout", 60)?
            // Default Notification settings
            .set_default("notification.delivery_url", "http://localhost:8089/deliver")?
            .set_default("notification.secret", "your-secret-key")?
            .set_default("notification.request_timeout", 10)?
            // Default Scheduler settings
            .set_default("scheduler.tick_interval", 60)?
            .set_default("scheduler.stuck_timeout_minutes", 30)?
            // Default Realtime settings
            .set_default("realtime.channel_capacity", 256)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("SCRAPELOOM").separator("__"));

        builder.build()?.try_deserialize()
    }
}
