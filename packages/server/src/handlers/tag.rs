use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::DeferredDeletes;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::cascade::Cascade;
use crate::entity::{recipe_tag, recipe_tag_category};
use crate::error::{AppError, conflict_on_unique};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::shared::MessageResponse;
use crate::models::tag::{CategoryResponse, CategoryWithTags, NameRequest, TagDetail, TagResponse};
use crate::state::AppState;

const TAG_EXISTS: &str = "Tag already exists";
const CATEGORY_EXISTS: &str = "Tag category already exists";

#[instrument(skip(state))]
pub async fn list_tags(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryWithTags>>, AppError> {
    let categories = recipe_tag_category::Entity::find()
        .order_by_asc(recipe_tag_category::Column::Name)
        .all(&state.db)
        .await?;
    let mut tags: HashMap<Uuid, Vec<TagResponse>> = HashMap::new();
    for tag in recipe_tag::Entity::find()
        .order_by_asc(recipe_tag::Column::Name)
        .all(&state.db)
        .await?
    {
        tags.entry(tag.tag_category_id)
            .or_default()
            .push(TagResponse::from(tag));
    }

    Ok(Json(
        categories
            .into_iter()
            .map(|c| CategoryWithTags {
                tags: tags.remove(&c.id).unwrap_or_default(),
                id: c.id,
                name: c.name,
            })
            .collect(),
    ))
}

#[instrument(skip(state, auth_user, payload))]
pub async fn create_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<NameRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = payload.name()?;
    auth_user.require_admin()?;

    if find_category_by_name(&state.db, name).await?.is_some() {
        return Err(AppError::Conflict(CATEGORY_EXISTS.into()));
    }
    let category = recipe_tag_category::ActiveModel {
        id: Set(Uuid::now_v7()),
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, CATEGORY_EXISTS))?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

#[instrument(skip(state, auth_user, payload), fields(category_id = %category_id))]
pub async fn update_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    AppJson(payload): AppJson<NameRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    let name = payload.name()?;
    auth_user.require_admin()?;

    let category = find_category(&state.db, category_id).await?;
    let mut active: recipe_tag_category::ActiveModel = category.into();
    active.name = Set(name.to_string());
    let category = active
        .update(&state.db)
        .await
        .map_err(|e| conflict_on_unique(e, CATEGORY_EXISTS))?;

    Ok(Json(CategoryResponse::from(category)))
}

/// Delete a category with all of its tags. Recipes only lose the tags.
#[instrument(skip(state, auth_user), fields(category_id = %category_id))]
pub async fn delete_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> Result<Response, AppError> {
    auth_user.require_admin()?;

    let mut deferred = DeferredDeletes::new();
    let txn = state.db.begin().await?;
    let found = Cascade::new(&txn, &*state.uploads, &mut deferred)
        .delete_tag_category(category_id)
        .await?;
    if !found {
        return Ok(missing("Tag category not exists"));
    }
    txn.commit().await?;
    deferred.complete().await;

    Ok(Json(MessageResponse::new("Tag category deleted")).into_response())
}

#[instrument(skip(state, auth_user, payload), fields(category_id = %category_id))]
pub async fn create_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    AppJson(payload): AppJson<NameRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = payload.name()?;
    auth_user.require_admin()?;

    find_category(&state.db, category_id).await?;
    let taken = recipe_tag::Entity::find()
        .filter(recipe_tag::Column::Name.eq(name))
        .one(&state.db)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict(TAG_EXISTS.into()));
    }

    let tag = recipe_tag::ActiveModel {
        id: Set(Uuid::now_v7()),
        name: Set(name.to_string()),
        tag_category_id: Set(category_id),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, TAG_EXISTS))?;

    Ok((StatusCode::CREATED, Json(TagDetail::from(tag))))
}

/// Rename a tag; the path category becomes its category.
#[instrument(skip(state, auth_user, payload), fields(category_id = %category_id, tag_id = %tag_id))]
pub async fn update_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((category_id, tag_id)): Path<(Uuid, Uuid)>,
    AppJson(payload): AppJson<NameRequest>,
) -> Result<Json<TagDetail>, AppError> {
    let name = payload.name()?;
    auth_user.require_admin()?;

    find_category(&state.db, category_id).await?;
    let tag = recipe_tag::Entity::find_by_id(tag_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag doesn't exist".into()))?;

    let mut active: recipe_tag::ActiveModel = tag.into();
    active.name = Set(name.to_string());
    active.tag_category_id = Set(category_id);
    let tag = active
        .update(&state.db)
        .await
        .map_err(|e| conflict_on_unique(e, TAG_EXISTS))?;

    Ok(Json(TagDetail::from(tag)))
}

/// Delete a tag, detaching it from every recipe.
#[instrument(skip(state, auth_user), fields(tag_id = %tag_id))]
pub async fn delete_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((_category_id, tag_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, AppError> {
    auth_user.require_admin()?;

    let mut deferred = DeferredDeletes::new();
    let txn = state.db.begin().await?;
    let found = Cascade::new(&txn, &*state.uploads, &mut deferred)
        .delete_tag(tag_id)
        .await?;
    if !found {
        return Ok(missing("Tag not exists"));
    }
    txn.commit().await?;
    deferred.complete().await;

    Ok(Json(MessageResponse::new("Tag deleted")).into_response())
}

/// Deleting something that is already gone is not an error.
fn missing(message: &str) -> Response {
    (
        StatusCode::NON_AUTHORITATIVE_INFORMATION,
        Json(MessageResponse::new(message)),
    )
        .into_response()
}

async fn find_category<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<recipe_tag_category::Model, AppError> {
    recipe_tag_category::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))
}

async fn find_category_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<Option<recipe_tag_category::Model>, DbErr> {
    recipe_tag_category::Entity::find()
        .filter(recipe_tag_category::Column::Name.eq(name))
        .one(db)
        .await
}
