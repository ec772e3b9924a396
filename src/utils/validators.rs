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

use thiserror::Error;
use url::Url;

/// 发现生成的产品使用的合成URL前缀
pub const DISCOVERY_URL_SCHEME: &str = "discovery";

/// 验证错误类型
#[derive(Error, Debug)]
pub enum ValidationError {
    /// URL无效
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// 验证抓取目标URL
///
/// 只接受 http/https 目标。`discovery://` 是产品发现使用的
/// 合成方案，不是可抓取的目标。
///
/// # 参数
///
/// * `url` - URL字符串
///
/// # 返回值
///
/// * `Ok(Url)` - 解析后的URL
/// * `Err(ValidationError)` - URL无效
pub fn validate_scrape_url(url: &str) -> Result<Url, ValidationError> {
    let parsed = Url::parse(url).map_err(|_| ValidationError::InvalidUrl(url.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ValidationError::InvalidUrl(url.to_string()));
    }

    if parsed.host_str().is_none() {
        return Err(ValidationError::InvalidUrl(url.to_string()));
    }

    Ok(parsed)
}

/// 判断URL是否为发现生成的合成URL
pub fn is_discovery_url(url: &str) -> bool {
    url.starts_with(&format!("{}://", DISCOVERY_URL_SCHEME))
}
