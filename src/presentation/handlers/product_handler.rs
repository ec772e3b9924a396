// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::product_request::{CreateProductRequestDto, RecordPriceRequestDto};
use crate::domain::models::product::{PricePoint, Product};
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::product_repository::ProductRepository;
use crate::presentation::errors::AppError;
use crate::presentation::middleware::auth_middleware::AuthenticatedUser;
use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 查找产品并校验归属
///
/// 未找到与越权访问返回同一错误，不暴露他人产品的存在性。
async fn fetch_owned_product<P: ProductRepository>(
    products: &Arc<P>,
    product_id: Uuid,
    user_id: Uuid,
) -> Result<Product, AppError> {
    let product = products
        .find_by_id(product_id)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    if product.user_id != user_id {
        return Err(RepositoryError::NotFound.into());
    }
    Ok(product)
}

/// 用户产品列表
pub async fn list_products<P: ProductRepository>(
    Extension(products): Extension<Arc<P>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Product>>, AppError> {
    let found = products.find_by_user(user.user_id).await?;
    Ok(Json(found))
}

/// 手工录入产品
pub async fn create_product<P: ProductRepository>(
    Extension(products): Extension<Arc<P>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateProductRequestDto>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    request.validate()?;

    let product = Product::manual(user.user_id, request.name, request.url);
    let created = products.create(&product).await?;

    tracing::info!(product_id = %created.id, user_id = %user.user_id, "Product created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// 删除产品及其价格历史
pub async fn delete_product<P: ProductRepository>(
    Extension(products): Extension<Arc<P>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(product_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    fetch_owned_product(&products, product_id, user.user_id).await?;
    products.delete(product_id).await?;

    tracing::info!(product_id = %product_id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// 追加价格点
///
/// 价格历史只追加，已有条目永不修改或重排。
pub async fn record_price<P: ProductRepository>(
    Extension(products): Extension<Arc<P>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<RecordPriceRequestDto>,
) -> Result<(StatusCode, Json<PricePoint>), AppError> {
    request.validate()?;
    fetch_owned_product(&products, product_id, user.user_id).await?;

    let point = PricePoint::new(
        product_id,
        request.price,
        request.currency.to_uppercase(),
        request.in_stock,
    );
    let appended = products.append_price_point(&point).await?;

    Ok((StatusCode::CREATED, Json(appended)))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// 只返回该时刻之后的价格点
    pub since: Option<DateTime<Utc>>,
}

/// 产品价格历史，按记录时间升序
pub async fn price_history<P: ProductRepository>(
    Extension(products): Extension<Arc<P>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<PricePoint>>, AppError> {
    fetch_owned_product(&products, product_id, user.user_id).await?;
    let history = products.price_history(product_id, query.since).await?;
    Ok(Json(history))
}
