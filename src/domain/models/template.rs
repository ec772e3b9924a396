// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::job::{Job, JobConfig, ScrapeType};

/// 任务模板
///
/// 预置的任务配置，实例化时复制模板的提示词、视觉开关和
/// 模型标识；生成的任务名称包含模板名称和当前日期。
#[derive(Debug, Clone, Serialize)]
pub struct JobTemplate {
    /// 模板标识符
    pub id: &'static str,
    /// 模板名称
    pub name: &'static str,
    /// 抓取类型
    pub scrape_type: ScrapeType,
    /// 默认提示词
    pub prompt: &'static str,
    /// 默认视觉开关
    pub use_vision: bool,
    /// 默认模型标识符
    pub model: &'static str,
}

/// 模板实例化时的覆盖项
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateOverrides {
    /// 覆盖任务名称
    pub name: Option<String>,
    /// 覆盖提示词
    pub prompt: Option<String>,
    /// 覆盖视觉开关
    pub use_vision: Option<bool>,
    /// 覆盖模型标识符
    pub model: Option<String>,
}

/// 内置模板列表
pub const BUILTIN_TEMPLATES: &[JobTemplate] = &[
    JobTemplate {
        id: "product-tracker",
        name: "Product Tracker",
        scrape_type: ScrapeType::Product,
        prompt: "Extract the product name, price, currency, availability and \
                 primary image URL from this product page. Return a JSON object \
                 with keys: name, price, currency, in_stock, image_url.",
        use_vision: false,
        model: "gpt-4o-mini",
    },
    JobTemplate {
        id: "price-watch",
        name: "Price Watch",
        scrape_type: ScrapeType::Price,
        prompt: "Extract the current price and currency from this page. Return a \
                 JSON object with keys: price (number), currency (ISO code), \
                 in_stock (boolean).",
        use_vision: false,
        model: "gpt-4o-mini",
    },
    JobTemplate {
        id: "article-content",
        name: "Article Content",
        scrape_type: ScrapeType::Content,
        prompt: "Extract the article title, author, publication date and full \
                 body text from this page. Return a JSON object with keys: \
                 title, author, published_at, body.",
        use_vision: false,
        model: "gpt-4o-mini",
    },
    JobTemplate {
        id: "visual-page-audit",
        name: "Visual Page Audit",
        scrape_type: ScrapeType::General,
        prompt: "Describe the main sections of this page and extract any \
                 headline figures as a JSON object with keys: sections (array), \
                 figures (object).",
        use_vision: true,
        model: "gpt-4o",
    },
];

/// 按标识符查找内置模板
pub fn find_template(id: &str) -> Option<&'static JobTemplate> {
    BUILTIN_TEMPLATES.iter().find(|t| t.id == id)
}

impl Job {
    /// 从模板实例化任务
    ///
    /// 无覆盖项时，提示词、视觉开关和模型与模板默认值完全一致；
    /// 任务名称为「模板名称 - 当前日期」。
    pub fn from_template(
        template: &JobTemplate,
        user_id: Uuid,
        url: String,
        overrides: TemplateOverrides,
    ) -> Self {
        let name = overrides
            .name
            .unwrap_or_else(|| format!("{} - {}", template.name, Utc::now().format("%Y-%m-%d")));

        let mut job = Job::new(user_id, name, url, template.scrape_type);
        job.ai_prompt = Some(overrides.prompt.unwrap_or_else(|| template.prompt.to_string()));
        job.use_vision = overrides.use_vision.unwrap_or(template.use_vision);
        job.ai_model = Some(overrides.model.unwrap_or_else(|| template.model.to_string()));
        job.config = JobConfig::default();
        job
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_template_without_overrides_copies_defaults() {
        let template = find_template("price-watch").unwrap();
        let job = Job::from_template(
            template,
            Uuid::new_v4(),
            "https://example.com/item".to_string(),
            TemplateOverrides::default(),
        );

        assert_eq!(job.ai_prompt.as_deref(), Some(template.prompt));
        assert_eq!(job.use_vision, template.use_vision);
        assert_eq!(job.ai_model.as_deref(), Some(template.model));
        assert_eq!(job.scrape_type, template.scrape_type);
    }

    #[test]
    fn test_from_template_name_includes_template_name_and_date() {
        let template = find_template("product-tracker").unwrap();
        let job = Job::from_template(
            template,
            Uuid::new_v4(),
            "https://example.com/item".to_string(),
            TemplateOverrides::default(),
        );

        assert!(job.name.contains(template.name));
        let today = Utc::now().format("%Y-%m-%d").to_string();
        assert!(job.name.contains(&today));
    }

    #[test]
    fn test_from_template_overrides_win() {
        let template = find_template("article-content").unwrap();
        let job = Job::from_template(
            template,
            Uuid::new_v4(),
            "https://example.com/post".to_string(),
            TemplateOverrides {
                name: Some("My Job".to_string()),
                prompt: Some("Custom prompt".to_string()),
                use_vision: Some(true),
                model: Some("gpt-4o".to_string()),
            },
        );

        assert_eq!(job.name, "My Job");
        assert_eq!(job.ai_prompt.as_deref(), Some("Custom prompt"));
        assert!(job.use_vision);
        assert_eq!(job.ai_model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn test_find_template_unknown_id() {
        assert!(find_template("does-not-exist").is_none());
    }
}
