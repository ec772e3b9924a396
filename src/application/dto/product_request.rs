// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// 手工录入产品请求DTO
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateProductRequestDto {
    /// 产品名称
    #[validate(length(min = 1, max = 200, message = "Product name must be 1-200 characters"))]
    pub name: String,
    /// 产品URL
    #[validate(url(message = "Product URL must be a valid URL"))]
    pub url: String,
}

/// 追加价格点请求DTO
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RecordPriceRequestDto {
    /// 价格
    #[validate(range(min = 0.0, message = "Price must be non-negative"))]
    pub price: f64,
    /// ISO 4217货币代码
    #[validate(length(min = 3, max = 3, message = "Currency must be a 3-letter code"))]
    pub currency: String,
    /// 是否有库存，缺省视为有货
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

fn default_in_stock() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_product_rejects_bad_url() {
        let dto = CreateProductRequestDto {
            name: "Widget".to_string(),
            url: "not-a-url".to_string(),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_record_price_defaults_in_stock() {
        let dto: RecordPriceRequestDto =
            serde_json::from_str(r#"{"price": 9.99, "currency": "USD"}"#).unwrap();
        assert!(dto.in_stock);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_record_price_rejects_long_currency() {
        let dto = RecordPriceRequestDto {
            price: 1.0,
            currency: "EURO".to_string(),
            in_stock: true,
        };
        assert!(dto.validate().is_err());
    }
}
