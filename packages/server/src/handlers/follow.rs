use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::sea_query::{Condition, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{follows, user};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::shared::{MessageResponse, PageMeta, PageQuery, Paged, contains_ci};
use crate::models::user::{FollowerEntry, FollowingEntry};
use crate::state::AppState;
use crate::utils::queries::{find_user, follow_users};

#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, following_id = %following_id))]
pub async fn follow(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(following_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if following_id == auth_user.user_id {
        return Err(AppError::Validation("You can't follow yourself".into()));
    }
    find_user(&state.db, following_id).await?;

    if find_edge(&state.db, auth_user.user_id, following_id)
        .await?
        .is_some()
    {
        return Ok((
            StatusCode::NON_AUTHORITATIVE_INFORMATION,
            Json(MessageResponse::new("User is already followed by current user")),
        ));
    }

    follows::ActiveModel {
        id: Set(Uuid::now_v7()),
        follower_id: Set(auth_user.user_id),
        following_id: Set(following_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::OK, Json(MessageResponse::new("User followed"))))
}

#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, following_id = %following_id))]
pub async fn unfollow(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(following_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if find_edge(&state.db, auth_user.user_id, following_id)
        .await?
        .is_none()
    {
        return Ok((
            StatusCode::NON_AUTHORITATIVE_INFORMATION,
            Json(MessageResponse::new("Current user doesn't follow this user")),
        ));
    }

    follows::Entity::delete_many()
        .filter(follows::Column::FollowerId.eq(auth_user.user_id))
        .filter(follows::Column::FollowingId.eq(following_id))
        .exec(&state.db)
        .await?;

    Ok((StatusCode::OK, Json(MessageResponse::new("User unfollowed"))))
}

#[instrument(skip(state, query), fields(id = %id))]
pub async fn list_user_followers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<FollowerEntry>>, AppError> {
    Ok(Json(followers_of(&state, id, &query).await?))
}

#[instrument(skip(state, query), fields(id = %id))]
pub async fn list_user_following(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<FollowingEntry>>, AppError> {
    Ok(Json(following_of(&state, id, &query).await?))
}

#[instrument(skip(state, auth_user, query), fields(user_id = %auth_user.user_id))]
pub async fn list_current_followers(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<FollowerEntry>>, AppError> {
    Ok(Json(followers_of(&state, auth_user.user_id, &query).await?))
}

#[instrument(skip(state, auth_user, query), fields(user_id = %auth_user.user_id))]
pub async fn list_current_following(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<FollowingEntry>>, AppError> {
    Ok(Json(following_of(&state, auth_user.user_id, &query).await?))
}

async fn find_edge<C: ConnectionTrait>(
    db: &C,
    follower_id: Uuid,
    following_id: Uuid,
) -> Result<Option<follows::Model>, DbErr> {
    follows::Entity::find()
        .filter(follows::Column::FollowerId.eq(follower_id))
        .filter(follows::Column::FollowingId.eq(following_id))
        .one(db)
        .await
}

/// Users whose name or email contains `term`.
fn matching_users(term: &str) -> sea_orm::sea_query::SelectStatement {
    SeaQuery::select()
        .column(user::Column::Id)
        .from(user::Entity)
        .cond_where(
            Condition::any()
                .add(contains_ci(user::Column::Name, term))
                .add(contains_ci(user::Column::Email, term)),
        )
        .to_owned()
}

/// Page of follow edges pointing at `user_id`, newest first.
async fn followers_of(
    state: &AppState,
    user_id: Uuid,
    query: &PageQuery,
) -> Result<Paged<FollowerEntry>, AppError> {
    let mut select = follows::Entity::find().filter(follows::Column::FollowingId.eq(user_id));
    if let Some(term) = query.search() {
        select = select.filter(follows::Column::FollowerId.in_subquery(matching_users(term)));
    }

    let total = select.clone().count(&state.db).await?;
    let edges = select
        .order_by_desc(follows::Column::CreatedAt)
        .offset(query.offset())
        .limit(query.limit())
        .all(&state.db)
        .await?;

    let ids: Vec<Uuid> = edges.iter().map(|e| e.follower_id).collect();
    let mut users = follow_users(&state.db, &state.config.storage.public_url, &ids).await?;
    let data = edges
        .into_iter()
        .filter_map(|edge| {
            users.remove(&edge.follower_id).map(|follower| FollowerEntry {
                id: edge.id,
                follower,
            })
        })
        .collect();

    Ok(Paged {
        data,
        meta: PageMeta::new(query.page(), query.limit(), total),
    })
}

/// Page of follow edges starting at `user_id`, newest first.
async fn following_of(
    state: &AppState,
    user_id: Uuid,
    query: &PageQuery,
) -> Result<Paged<FollowingEntry>, AppError> {
    let mut select = follows::Entity::find().filter(follows::Column::FollowerId.eq(user_id));
    if let Some(term) = query.search() {
        select = select.filter(follows::Column::FollowingId.in_subquery(matching_users(term)));
    }

    let total = select.clone().count(&state.db).await?;
    let edges = select
        .order_by_desc(follows::Column::CreatedAt)
        .offset(query.offset())
        .limit(query.limit())
        .all(&state.db)
        .await?;

    let ids: Vec<Uuid> = edges.iter().map(|e| e.following_id).collect();
    let mut users = follow_users(&state.db, &state.config.storage.public_url, &ids).await?;
    let data = edges
        .into_iter()
        .filter_map(|edge| {
            users.remove(&edge.following_id).map(|following| FollowingEntry {
                id: edge.id,
                following,
            })
        })
        .collect();

    Ok(Paged {
        data,
        meta: PageMeta::new(query.page(), query.limit(), total),
    })
}
