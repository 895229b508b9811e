use axum::{
    Json,
    extract::{Path, Query, State},
};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{follows, message, recipe, user};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::recipe::RecipeCard;
use crate::models::shared::{PageMeta, PageQuery, Paged, contains_ci};
use crate::models::user::{PrivateInfoResponse, ProfileResponse, UserSummary};
use crate::state::AppState;
use crate::utils::queries::{find_user, recipe_cards};

#[instrument(skip(state), fields(id = %id))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = find_user(&state.db, id).await?;
    let profile = build_profile(&state.db, &state.config.storage.public_url, &user, false).await?;
    Ok(Json(profile))
}

#[instrument(skip(state, query), fields(id = %id))]
pub async fn list_user_recipes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<RecipeCard>>, AppError> {
    find_user(&state.db, id).await?;
    let page = authored_recipes(&state.db, &state.config.storage.public_url, id, &query).await?;
    Ok(Json(page))
}

#[instrument(skip(state, auth_user), fields(id = %id))]
pub async fn get_private_info(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PrivateInfoResponse>, AppError> {
    let edge = follows::Entity::find()
        .filter(follows::Column::FollowerId.eq(auth_user.user_id))
        .filter(follows::Column::FollowingId.eq(id))
        .one(&state.db)
        .await?;
    Ok(Json(PrivateInfoResponse {
        is_following: edge.is_some(),
    }))
}

/// Profile with follower, following and recipe counts. The unread message
/// count is only filled in for the user's own profile.
pub(crate) async fn build_profile<C: ConnectionTrait>(
    db: &C,
    public_url: &str,
    user: &user::Model,
    with_unread: bool,
) -> Result<ProfileResponse, DbErr> {
    let followers_count = follows::Entity::find()
        .filter(follows::Column::FollowingId.eq(user.id))
        .count(db)
        .await?;
    let following_count = follows::Entity::find()
        .filter(follows::Column::FollowerId.eq(user.id))
        .count(db)
        .await?;
    let recipes_count = recipe::Entity::find()
        .filter(recipe::Column::AuthorId.eq(user.id))
        .count(db)
        .await?;
    let unread_messages = if with_unread {
        Some(
            message::Entity::find()
                .filter(message::Column::ReceiverId.eq(user.id))
                .filter(message::Column::Read.eq(false))
                .count(db)
                .await?,
        )
    } else {
        None
    };

    Ok(ProfileResponse {
        user: UserSummary::new(user, public_url),
        followers_count,
        following_count,
        recipes_count,
        unread_messages,
    })
}

/// Recipes written by `author_id`, newest first, optionally filtered by title.
pub(crate) async fn authored_recipes<C: ConnectionTrait>(
    db: &C,
    public_url: &str,
    author_id: Uuid,
    query: &PageQuery,
) -> Result<Paged<RecipeCard>, DbErr> {
    let mut select = recipe::Entity::find().filter(recipe::Column::AuthorId.eq(author_id));
    if let Some(term) = query.search() {
        select = select.filter(contains_ci(recipe::Column::Title, term));
    }

    let total = select.clone().count(db).await?;
    let recipes = select
        .order_by_desc(recipe::Column::CreatedAt)
        .offset(query.offset())
        .limit(query.limit())
        .all(db)
        .await?;

    Ok(Paged {
        data: recipe_cards(db, public_url, recipes).await?,
        meta: PageMeta::new(query.page(), query.limit(), total),
    })
}
