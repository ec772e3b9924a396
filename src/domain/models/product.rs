// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::validators::DISCOVERY_URL_SCHEME;

/// 产品实体
///
/// 用户手工录入（固定URL，手动监控）或AI发现生成
/// （合成 `discovery://<id>` URL，内嵌来源数组）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// 产品唯一标识符
    pub id: Uuid,
    /// 所属用户ID
    pub user_id: Uuid,
    /// 产品名称
    pub name: String,
    /// 产品URL；发现生成的产品使用 discovery:// 合成URL
    pub url: String,
    /// 发现来源数组，仅发现生成的产品持有
    pub sources: Option<Vec<ProductSource>>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
}

/// 发现来源
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductSource {
    /// 来源URL
    pub url: String,
    /// 来源站点名称
    pub site: Option<String>,
    /// 来源报价
    pub price: Option<f64>,
}

impl Product {
    /// 创建一个用户手工录入的产品
    pub fn manual(user_id: Uuid, name: String, url: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            url,
            sources: None,
            created_at: Utc::now().into(),
        }
    }

    /// 创建一个AI发现生成的产品
    ///
    /// URL为合成的 `discovery://<session_id>` 形式，来源数组内嵌。
    pub fn discovered(user_id: Uuid, name: String, session_id: Uuid, sources: Vec<ProductSource>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            url: format!("{}://{}", DISCOVERY_URL_SCHEME, session_id),
            sources: Some(sources),
            created_at: Utc::now().into(),
        }
    }

    /// 是否为发现生成的产品
    pub fn is_discovered(&self) -> bool {
        self.sources.is_some()
    }
}

/// 价格历史条目
///
/// 按产品追加的时间序列，只追加从不修改或重排。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    /// 条目唯一标识符
    pub id: Uuid,
    /// 所属产品ID
    pub product_id: Uuid,
    /// 价格
    pub price: f64,
    /// 货币代码
    pub currency: String,
    /// 是否有库存
    pub in_stock: bool,
    /// 记录时间
    pub recorded_at: DateTime<FixedOffset>,
}

impl PricePoint {
    /// 创建一个新的价格条目
    pub fn new(product_id: Uuid, price: f64, currency: String, in_stock: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            price,
            currency,
            in_stock,
            recorded_at: Utc::now().into(),
        }
    }
}
