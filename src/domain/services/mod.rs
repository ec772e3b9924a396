// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod ai_client;
pub mod analytics_service;
pub mod discovery_service;
pub mod notification_service;
pub mod scrape_service;

pub use ai_client::{AiClient, TokenUsage};
pub use analytics_service::AnalyticsService;
pub use discovery_service::DiscoveryService;
pub use notification_service::{NotificationDelivery, NotificationService};
pub use scrape_service::ScrapeService;
