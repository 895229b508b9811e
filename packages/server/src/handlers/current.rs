use axum::{
    Json,
    extract::{Multipart, Query, State},
    http::StatusCode,
};
use common::storage::{DeferredDeletes, UploadFolder};
use sea_orm::*;
use tracing::instrument;

use crate::cascade::Cascade;
use crate::entity::user;
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::user::{authored_recipes, build_profile};
use crate::models::recipe::RecipeCard;
use crate::models::shared::{PageQuery, Paged};
use crate::models::user::{DeleteAccountRequest, ProfileResponse, UserResponse};
use crate::state::AppState;
use crate::utils::hash;
use crate::utils::queries::find_user;
use crate::utils::upload::{AVATAR, UploadedForm, receive_form};

#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_current(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = find_user(&state.db, auth_user.user_id).await?;
    let profile = build_profile(&state.db, &state.config.storage.public_url, &user, true).await?;
    Ok(Json(profile))
}

#[instrument(skip(state, auth_user, query), fields(user_id = %auth_user.user_id))]
pub async fn list_current_recipes(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<RecipeCard>>, AppError> {
    find_user(&state.db, auth_user.user_id).await?;
    let page = authored_recipes(
        &state.db,
        &state.config.storage.public_url,
        auth_user.user_id,
        &query,
    )
    .await?;
    Ok(Json(page))
}

/// Change the display name and/or avatar. A replaced avatar file is removed
/// once the new name is stored.
#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.user_id))]
pub async fn update_current(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UserResponse>, AppError> {
    let form = receive_form(multipart, &state.uploads, UploadFolder::Avatars, &[AVATAR]).await?;

    let mut deferred = DeferredDeletes::new();
    let user = match apply_profile_update(&state, auth_user, &form, &mut deferred).await {
        Ok(user) => user,
        Err(e) => {
            form.discard().await;
            return Err(e);
        }
    };
    deferred.complete().await;

    Ok(Json(UserResponse::new(user, &state.config.storage.public_url)))
}

async fn apply_profile_update(
    state: &AppState,
    auth_user: AuthUser,
    form: &UploadedForm,
    deferred: &mut DeferredDeletes,
) -> Result<user::Model, AppError> {
    let user = find_user(&state.db, auth_user.user_id).await?;
    let old_avatar = user.avatar_url.clone();

    let mut active: user::ActiveModel = user.into();
    if let Some(name) = form.text("name") {
        active.name = Set(name.to_string());
    }
    if let Some(avatar) = form.first_file(AVATAR.name) {
        if let Some(old) = old_avatar.as_deref().filter(|o| !o.is_empty()) {
            deferred.add(state.uploads.path_for(UploadFolder::Avatars, old));
        }
        active.avatar_url = Set(Some(avatar.file_name.clone()));
    }

    let txn = state.db.begin().await?;
    let updated = active.update(&txn).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Delete the caller's account and everything it owns. The password is
/// required as confirmation.
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn delete_current(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<DeleteAccountRequest>,
) -> Result<StatusCode, AppError> {
    let password = payload
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or(AppError::PermissionDenied)?;

    let user = find_user(&state.db, auth_user.user_id).await?;
    let valid = hash::verify_password(password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !valid {
        return Err(AppError::InvalidCredentials);
    }

    let mut deferred = DeferredDeletes::new();
    let txn = state.db.begin().await?;
    let found = Cascade::new(&txn, &*state.uploads, &mut deferred)
        .delete_user(user.id)
        .await?;
    if !found {
        return Err(AppError::NotFound("User not found".into()));
    }
    txn.commit().await?;
    let removed = deferred.complete().await;

    tracing::info!(user_id = %user.id, removed, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}
