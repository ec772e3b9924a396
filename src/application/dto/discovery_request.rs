// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::models::ai_session::{AiSession, SessionKind};
use crate::domain::models::product::Product;
use crate::domain::models::website::Website;
use crate::domain::services::discovery_service::DiscoveryReport;

/// AI发现请求DTO
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct DiscoveryRequestDto {
    /// 自然语言查询，例如"wireless earbuds under $100"
    #[validate(length(min = 1, max = 500))]
    pub query: String,
}

/// AI发现响应DTO
#[derive(Debug, Serialize)]
pub struct DiscoveryResponseDto {
    pub session_id: Uuid,
    pub kind: SessionKind,
    pub items_found: usize,
    pub products: Vec<Product>,
    pub websites: Vec<Website>,
    pub session: AiSession,
}

impl From<DiscoveryReport> for DiscoveryResponseDto {
    fn from(report: DiscoveryReport) -> Self {
        Self {
            session_id: report.session.id,
            kind: report.session.kind,
            items_found: report.products.len(),
            products: report.products,
            websites: report.websites,
            session: report.session,
        }
    }
}
