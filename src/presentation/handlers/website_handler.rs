// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::website::Website;
use crate::domain::repositories::website_repository::WebsiteRepository;
use crate::presentation::errors::AppError;
use crate::presentation::middleware::auth_middleware::AuthenticatedUser;
use axum::extract::Extension;
use axum::Json;
use std::sync::Arc;

/// 用户已登记站点列表
pub async fn list_websites<W: WebsiteRepository>(
    Extension(websites): Extension<Arc<W>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Website>>, AppError> {
    let found = websites.find_by_user(user.user_id).await?;
    Ok(Json(found))
}
