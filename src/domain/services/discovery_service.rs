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

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::ai_session::{AiSession, SessionKind};
use crate::domain::models::product::{Product, ProductSource};
use crate::domain::models::website::Website;
use crate::domain::repositories::{AiSessionRepository, ProductRepository, WebsiteRepository};
use crate::domain::services::ai_client::AiClient;

/// AI返回的单个发现条目
#[derive(Debug, Deserialize)]
struct DiscoveredItem {
    name: String,
    #[serde(default)]
    sources: Vec<DiscoveredSource>,
}

#[derive(Debug, Deserialize)]
struct DiscoveredSource {
    url: String,
    #[serde(default)]
    site: Option<String>,
    #[serde(default)]
    price: Option<f64>,
}

/// 一次发现调用的汇总
#[derive(Debug)]
pub struct DiscoveryReport {
    /// 审计会话（已完成）
    pub session: AiSession,
    /// 新建的产品
    pub products: Vec<Product>,
    /// 新登记的站点
    pub websites: Vec<Website>,
}

/// AI发现服务
///
/// 把自由文本查询交给AI，解析返回的条目列表，
/// 生成发现型产品和站点目录条目，并留下审计会话。
/// 会话在开始时持久化，调用失败时以零条目完成，
/// 保证每次调用恰好留下一条完成的会话记录。
pub struct DiscoveryService {
    ai_client: Arc<dyn AiClient>,
    sessions: Arc<dyn AiSessionRepository>,
    products: Arc<dyn ProductRepository>,
    websites: Arc<dyn WebsiteRepository>,
    model: String,
}

impl DiscoveryService {
    pub fn new(
        ai_client: Arc<dyn AiClient>,
        sessions: Arc<dyn AiSessionRepository>,
        products: Arc<dyn ProductRepository>,
        websites: Arc<dyn WebsiteRepository>,
        model: String,
    ) -> Self {
        Self {
            ai_client,
            sessions,
            products,
            websites,
            model,
        }
    }

    fn prompt_for(kind: SessionKind, query: &str) -> String {
        match kind {
            SessionKind::ProductDiscovery => format!(
                "Find products matching this description: {}. For each product \
                 return its name and up to 5 online sources where it can be \
                 bought, with url, site name and price if known. Return ONLY a \
                 JSON array of objects with keys: name, sources \
                 (array of {{url, site, price}}).",
                query
            ),
            SessionKind::SourceDiscovery => format!(
                "Find online shops or websites that sell or cover: {}. Return \
                 ONLY a JSON array of objects with keys: name (the site domain), \
                 sources (array of {{url, site, price}} sample listings).",
                query
            ),
        }
    }

    /// 执行一次产品发现
    pub async fn discover_products(&self, user_id: Uuid, query: &str) -> Result<DiscoveryReport> {
        self.run(user_id, SessionKind::ProductDiscovery, query).await
    }

    /// 执行一次来源发现
    pub async fn discover_sources(&self, user_id: Uuid, query: &str) -> Result<DiscoveryReport> {
        self.run(user_id, SessionKind::SourceDiscovery, query).await
    }

    /// 用户最近的发现会话，按开始时间倒序
    pub async fn recent_sessions(&self, user_id: Uuid, limit: u64) -> Result<Vec<AiSession>> {
        let sessions = self.sessions.find_recent(user_id, limit).await?;
        Ok(sessions)
    }

    async fn run(&self, user_id: Uuid, kind: SessionKind, query: &str) -> Result<DiscoveryReport> {
        let session = AiSession::open(user_id, kind, self.model.clone(), query.to_string());
        let session = self
            .sessions
            .create(&session)
            .await
            .context("failed to open discovery session")?;

        let prompt = Self::prompt_for(kind, query);
        let generated = self.ai_client.generate(&prompt, Some(&self.model)).await;

        let (text, usage) = match generated {
            Ok(pair) => pair,
            Err(err) => {
                // 失败的调用也要完成会话，保留审计记录
                let failed = session
                    .complete(0, Some(json!({ "error": err.to_string() })))
                    .map_err(anyhow::Error::from)?;
                let failed = self.sessions.update(&failed).await?;
                tracing::warn!(session_id = %failed.id, "discovery call failed: {}", err);
                return Ok(DiscoveryReport {
                    session: failed,
                    products: Vec::new(),
                    websites: Vec::new(),
                });
            }
        };

        let items = Self::parse_items(&text);
        let mut products = Vec::new();
        let mut websites = Vec::new();

        for item in &items {
            let sources: Vec<ProductSource> = item
                .sources
                .iter()
                .map(|s| ProductSource {
                    url: s.url.clone(),
                    site: s.site.clone(),
                    price: s.price,
                })
                .collect();

            let product = Product::discovered(user_id, item.name.clone(), session.id, sources);
            products.push(self.products.create(&product).await?);

            for source in &item.sources {
                if let Some(domain) = Self::domain_of(&source.url) {
                    let known = self.websites.exists_by_domain(user_id, &domain).await?;
                    if !known {
                        let site = Website::discovered(user_id, domain, None, 0.8);
                        websites.push(self.websites.create(&site).await?);
                    }
                }
            }
        }

        let insights = json!({
            "token_usage": usage,
            "raw_item_count": items.len(),
        });
        let session = session
            .complete(items.len() as i32, Some(insights))
            .map_err(anyhow::Error::from)?;
        let session = self.sessions.update(&session).await?;

        tracing::info!(
            session_id = %session.id,
            items = items.len(),
            "discovery session completed"
        );
        metrics::counter!("discovery_sessions_total", "kind" => kind.to_string()).increment(1);

        Ok(DiscoveryReport {
            session,
            products,
            websites,
        })
    }

    fn parse_items(text: &str) -> Vec<DiscoveredItem> {
        let clean = text
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();
        serde_json::from_str::<Vec<DiscoveredItem>>(clean).unwrap_or_default()
    }

    fn domain_of(raw: &str) -> Option<String> {
        let parsed = url::Url::parse(raw).ok()?;
        parsed.host_str().map(|h| h.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_items_tolerates_fences_and_garbage() {
        let items = DiscoveryService::parse_items(
            "```json\n[{\"name\": \"Widget\", \"sources\": [{\"url\": \"https://shop.example/w\"}]}]\n```",
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Widget");
        assert_eq!(items[0].sources[0].url, "https://shop.example/w");

        assert!(DiscoveryService::parse_items("no json here").is_empty());
    }

    #[test]
    fn test_domain_extraction() {
        assert_eq!(
            DiscoveryService::domain_of("https://shop.example.com/p/1"),
            Some("shop.example.com".to_string())
        );
        assert_eq!(DiscoveryService::domain_of("not a url"), None);
    }
}
