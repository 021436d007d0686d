//! # Product Categories API
//!
//! Category CRUD. Reads are public; writes require the admin role.
//! Names are unique because calculation requests refer to categories by name.
//!
//! ## Endpoints
//!
//! - `GET /api/categories`: list categories, ordered by name
//! - `POST /api/categories`: create category (admin)
//! - `GET /api/categories/:id`: get category
//! - `PUT /api/categories/:id`: replace category (admin)
//! - `PATCH /api/categories/:id`: partial update (admin)
//! - `DELETE /api/categories/:id`: delete category (admin)

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use landed_core::Category;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::routes::persistence_failed;
use crate::state::AppState;

/// Full category body for create and replace.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryRequest {
    /// Unique category name.
    pub name: String,
    /// Fractional duty rate (0.1 means 10%).
    #[schema(value_type = f64)]
    pub duty_rate: Decimal,
}

impl Validate for CategoryRequest {
    fn validate(&self) -> Result<(), AppError> {
        Category::new(self.name.clone(), self.duty_rate)
            .validate()
            .map_err(AppError::from)
    }
}

/// Partial category update.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CategoryPatch {
    /// New name.
    pub name: Option<String>,
    /// New duty rate.
    #[schema(value_type = Option<f64>)]
    pub duty_rate: Option<Decimal>,
}

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(list_categories).post(create_category))
        .route(
            "/api/categories/:id",
            get(get_category)
                .put(replace_category)
                .patch(patch_category)
                .delete(delete_category),
        )
}

/// GET /api/categories: List categories ordered by name.
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Categories ordered by name", body = Vec<Category>),
    ),
    tag = "categories"
)]
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    Json(state.sorted_categories())
}

/// POST /api/categories: Create a category.
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
        (status = 409, description = "Name already in use", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_validated_json(body)?;

    let category = state
        .create_category(Category::new(req.name, req.duty_rate))
        .map_err(|e| {
            tracing::warn!(error = %e, "category rejected");
            AppError::from(e)
        })?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::categories::insert(pool, &category).await {
            state.categories.remove(&category.id);
            return Err(persistence_failed("category", category.id, e));
        }
    }

    tracing::info!(id = %category.id, name = %category.name, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /api/categories/:id: Get a single category.
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category found", body = Category),
        (status = 404, description = "Category not found", body = crate::error::ErrorBody),
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Category>, AppError> {
    state
        .categories
        .get(&id)
        .map(Json)
        .ok_or_else(|| category_not_found(id))
}

/// PUT /api/categories/:id: Replace a category.
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category replaced", body = Category),
        (status = 404, description = "Category not found", body = crate::error::ErrorBody),
        (status = 409, description = "Name already in use", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "categories"
)]
pub async fn replace_category(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<Json<Category>, AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_validated_json(body)?;
    store_update(&state, id, |c| {
        c.name = req.name;
        c.duty_rate = req.duty_rate;
    })
    .await
}

/// PATCH /api/categories/:id: Update some fields of a category.
#[utoipa::path(
    patch,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CategoryPatch,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 404, description = "Category not found", body = crate::error::ErrorBody),
        (status = 409, description = "Name already in use", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "categories"
)]
pub async fn patch_category(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<CategoryPatch>, JsonRejection>,
) -> Result<Json<Category>, AppError> {
    require_role(&caller, Role::Admin)?;
    let patch = extract_json(body)?;
    store_update(&state, id, |c| {
        if let Some(name) = patch.name {
            c.name = name;
        }
        if let Some(rate) = patch.duty_rate {
            c.duty_rate = rate;
        }
    })
    .await
}

/// DELETE /api/categories/:id: Delete a category.
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = crate::error::ErrorBody),
    ),
    tag = "categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_role(&caller, Role::Admin)?;
    let removed = state
        .categories
        .remove(&id)
        .ok_or_else(|| category_not_found(id))?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::categories::delete(pool, id).await {
            state.categories.insert(id, removed);
            return Err(persistence_failed("category", id, e));
        }
    }

    tracing::info!(id = %id, name = %removed.name, "category deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn store_update(
    state: &AppState,
    id: Uuid,
    edit: impl FnOnce(&mut Category),
) -> Result<Json<Category>, AppError> {
    let (previous, updated) = state
        .update_category(id, edit)
        .ok_or_else(|| category_not_found(id))?
        .map_err(|e| {
            tracing::warn!(id = %id, error = %e, "category update rejected");
            AppError::from(e)
        })?;

    if let Some(pool) = &state.db_pool {
        match crate::db::categories::update(pool, &updated).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(id = %id, "category missing from database on update"),
            Err(e) => {
                state.categories.insert(id, previous);
                return Err(persistence_failed("category", id, e));
            }
        }
    }

    if previous.name != updated.name {
        tracing::info!(
            id = %id,
            from = %previous.name,
            to = %updated.name,
            "category renamed; calculations using the old name will be rejected"
        );
    } else {
        tracing::info!(id = %id, name = %updated.name, "category updated");
    }
    Ok(Json(updated))
}

fn category_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("category {id} not found"))
}
