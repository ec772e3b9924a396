// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 一次AI调用的令牌使用情况
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    /// 累加另一次调用的用量
    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// AI补全客户端接口
///
/// 抓取与发现服务通过该接口与AI提供商交互，
/// 实现位于基础设施层，测试中用内存替身实现。
#[async_trait]
pub trait AiClient: Send + Sync {
    /// 执行一次文本补全
    ///
    /// # 参数
    /// * `prompt` - 完整的组合提示词
    /// * `model` - 模型名称，`None`时使用客户端默认模型
    ///
    /// # 返回值
    /// * `Result<(String, TokenUsage)>` - 原始补全文本和令牌用量
    async fn generate(&self, prompt: &str, model: Option<&str>) -> Result<(String, TokenUsage)>;

    /// 检查AI服务是否可达
    ///
    /// 发送一个最小提示词，任何成功返回都视为健康。
    async fn health_check(&self) -> Result<bool> {
        let (text, _) = self.generate("Respond with just OK.", None).await?;
        Ok(!text.trim().is_empty())
    }
}
