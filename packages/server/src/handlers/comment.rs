use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use common::storage::{DeferredDeletes, UploadFolder};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::cascade::Cascade;
use crate::entity::{recipe_comment, recipe_comment_image};
use crate::error::AppError;
use crate::extractors::auth::{AuthUser, MaybeAuthUser};
use crate::models::comment::{
    CommentGroups, CommentListQuery, CommentListResponse, CommentMeta,
};
use crate::models::shared::{MessageResponse, page_offset};
use crate::state::AppState;
use crate::utils::queries::{comment_responses, find_recipe};
use crate::utils::upload::{IMAGES, UploadedForm, receive_form};

/// Other users' comments are paginated by rating. An authenticated caller
/// additionally gets all of their own comments, newest first.
#[instrument(skip(state, caller, query), fields(recipe_id = %recipe_id))]
pub async fn list_comments(
    MaybeAuthUser(caller): MaybeAuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
    Query(query): Query<CommentListQuery>,
) -> Result<Json<CommentListResponse>, AppError> {
    let page = query.page();
    let limit = query.limit();
    let public_url = &state.config.storage.public_url;

    let mut others = recipe_comment::Entity::find()
        .filter(recipe_comment::Column::RecipeId.eq(recipe_id));
    if let Some(caller) = caller {
        others = others.filter(recipe_comment::Column::UserId.ne(caller.user_id));
    }
    let other_comments = others
        .order_by_desc(recipe_comment::Column::Rating)
        .order_by_desc(recipe_comment::Column::CreatedAt)
        .offset(page_offset(page, limit))
        .limit(limit)
        .all(&state.db)
        .await?;

    let user_comments = match caller {
        Some(caller) => {
            recipe_comment::Entity::find()
                .filter(recipe_comment::Column::RecipeId.eq(recipe_id))
                .filter(recipe_comment::Column::UserId.eq(caller.user_id))
                .order_by_desc(recipe_comment::Column::CreatedAt)
                .all(&state.db)
                .await?
        }
        None => Vec::new(),
    };

    let count = recipe_comment::Entity::find()
        .filter(recipe_comment::Column::RecipeId.eq(recipe_id))
        .count(&state.db)
        .await?;

    Ok(Json(CommentListResponse {
        comments: CommentGroups {
            user_comments: comment_responses(&state.db, public_url, user_comments).await?,
            other_comments: comment_responses(&state.db, public_url, other_comments).await?,
        },
        meta: CommentMeta {
            count,
            comments_page: page,
            comments_limit: limit,
            total_pages: count.div_ceil(limit),
        },
    }))
}

#[instrument(skip(state, auth_user, multipart), fields(recipe_id = %recipe_id, user_id = %auth_user.user_id))]
pub async fn create_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = receive_form(multipart, &state.uploads, UploadFolder::Recipes, &[IMAGES]).await?;

    let comment = match insert_comment(&state, auth_user.user_id, recipe_id, &form).await {
        Ok(comment) => comment,
        Err(e) => {
            form.discard().await;
            return Err(e);
        }
    };

    let response = comment_responses(&state.db, &state.config.storage.public_url, vec![comment])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("Created comment has no author".into()))?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn insert_comment(
    state: &AppState,
    user_id: Uuid,
    recipe_id: Uuid,
    form: &UploadedForm,
) -> Result<recipe_comment::Model, AppError> {
    let text = form.text("text").ok_or_else(AppError::all_fields_required)?;
    find_recipe(&state.db, recipe_id).await?;

    let txn = state.db.begin().await?;
    let comment = recipe_comment::ActiveModel {
        id: Set(Uuid::now_v7()),
        text: Set(text.to_string()),
        rating: Set(0),
        recipe_id: Set(recipe_id),
        user_id: Set(user_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    for file in form.files_in(IMAGES.name) {
        recipe_comment_image::ActiveModel {
            id: Set(Uuid::now_v7()),
            image_url: Set(file.file_name.clone()),
            comment_id: Set(comment.id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }
    txn.commit().await?;
    Ok(comment)
}

#[instrument(skip(state, auth_user), fields(recipe_id = %recipe_id, comment_id = %comment_id))]
pub async fn delete_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((recipe_id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>, AppError> {
    let comment = recipe_comment::Entity::find_by_id(comment_id)
        .filter(recipe_comment::Column::RecipeId.eq(recipe_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))?;
    auth_user.require_owner_or_admin(comment.user_id)?;

    let mut deferred = DeferredDeletes::new();
    let txn = state.db.begin().await?;
    let found = Cascade::new(&txn, &*state.uploads, &mut deferred)
        .delete_comment(comment.id)
        .await?;
    if !found {
        return Err(AppError::NotFound("Comment not found".into()));
    }
    txn.commit().await?;
    let removed = deferred.complete().await;

    tracing::info!(comment_id = %comment_id, removed, "Comment deleted");
    Ok(Json(MessageResponse::new("Comment was deleted successfully")))
}
