// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod ai_session_repository;
pub mod job_repository;
pub mod notification_repository;
pub mod product_repository;
pub mod result_repository;
pub mod website_repository;

pub use ai_session_repository::AiSessionRepository;
pub use job_repository::{JobQueryParams, JobRepository, RepositoryError};
pub use notification_repository::NotificationRepository;
pub use product_repository::ProductRepository;
pub use result_repository::ResultRepository;
pub use website_repository::WebsiteRepository;
