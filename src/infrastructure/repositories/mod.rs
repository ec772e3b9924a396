// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 提供领域仓库接口的SeaORM实现
pub mod ai_session_repo_impl;
pub mod job_repo_impl;
pub mod notification_repo_impl;
pub mod product_repo_impl;
pub mod result_repo_impl;
pub mod website_repo_impl;

pub use ai_session_repo_impl::AiSessionRepositoryImpl;
pub use job_repo_impl::JobRepositoryImpl;
pub use notification_repo_impl::NotificationRepositoryImpl;
pub use product_repo_impl::ProductRepositoryImpl;
pub use result_repo_impl::ResultRepositoryImpl;
pub use website_repo_impl::WebsiteRepositoryImpl;
