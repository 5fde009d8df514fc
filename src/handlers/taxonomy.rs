use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{ApiResponse, Result};
use crate::models::{Category, CreateCategoryRequest, Tag};
use crate::services::TaxonomyService;
use crate::AppState;

/// List categories
/// GET /api/v1/categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Category>>>> {
    let categories = TaxonomyService::list_categories(&state.db).await?;
    Ok(Json(ApiResponse::success(categories)))
}

/// Create a category
/// POST /api/v1/categories
pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<Json<ApiResponse<Category>>> {
    let category = TaxonomyService::create_category(&state.db, &req.name).await?;
    Ok(Json(ApiResponse::success(category)))
}

/// Delete an unused category
/// DELETE /api/v1/categories/:id
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    TaxonomyService::delete_category(&state.db, id).await?;
    Ok(Json(ApiResponse::<()>::success_message("Category deleted")))
}

/// List tags
/// GET /api/v1/tags
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Tag>>>> {
    let tags = TaxonomyService::list_tags(&state.db).await?;
    Ok(Json(ApiResponse::success(tags)))
}
