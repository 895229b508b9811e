//! Likes, favorites and views: one join row per (user, recipe).

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{favorite_recipe, liked_recipe, recipe, recipe_view};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::recipe::RecipeCard;
use crate::models::shared::{ActiveResponse, PageMeta, PageQuery, Paged, contains_ci};
use crate::state::AppState;
use crate::utils::queries::{find_recipe, recipe_cards};

/// A (user, recipe) join table.
pub trait Reaction: EntityTrait<Model: FromQueryResult + Sync> {
    fn user_column() -> Self::Column;
    fn recipe_column() -> Self::Column;
    fn created_column() -> Self::Column;
    fn row(user_id: Uuid, recipe_id: Uuid) -> Self::ActiveModel;
}

impl Reaction for liked_recipe::Entity {
    fn user_column() -> Self::Column {
        liked_recipe::Column::UserId
    }
    fn recipe_column() -> Self::Column {
        liked_recipe::Column::RecipeId
    }
    fn created_column() -> Self::Column {
        liked_recipe::Column::CreatedAt
    }
    fn row(user_id: Uuid, recipe_id: Uuid) -> Self::ActiveModel {
        liked_recipe::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
    }
}

impl Reaction for favorite_recipe::Entity {
    fn user_column() -> Self::Column {
        favorite_recipe::Column::UserId
    }
    fn recipe_column() -> Self::Column {
        favorite_recipe::Column::RecipeId
    }
    fn created_column() -> Self::Column {
        favorite_recipe::Column::CreatedAt
    }
    fn row(user_id: Uuid, recipe_id: Uuid) -> Self::ActiveModel {
        favorite_recipe::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
    }
}

impl Reaction for recipe_view::Entity {
    fn user_column() -> Self::Column {
        recipe_view::Column::UserId
    }
    fn recipe_column() -> Self::Column {
        recipe_view::Column::RecipeId
    }
    fn created_column() -> Self::Column {
        recipe_view::Column::CreatedAt
    }
    fn row(user_id: Uuid, recipe_id: Uuid) -> Self::ActiveModel {
        recipe_view::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
    }
}

async fn is_active<R: Reaction, C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    recipe_id: Uuid,
) -> Result<bool, DbErr> {
    let count = R::find()
        .filter(R::user_column().eq(user_id))
        .filter(R::recipe_column().eq(recipe_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Flip the reaction and return the new state.
async fn toggle<R, C>(db: &C, user_id: Uuid, recipe_id: Uuid) -> Result<bool, DbErr>
where
    R: Reaction,
    R::ActiveModel: ActiveModelTrait<Entity = R>,
    C: ConnectionTrait,
{
    if is_active::<R, _>(db, user_id, recipe_id).await? {
        R::delete_many()
            .filter(R::user_column().eq(user_id))
            .filter(R::recipe_column().eq(recipe_id))
            .exec(db)
            .await?;
        Ok(false)
    } else {
        R::insert(R::row(user_id, recipe_id))
            .exec_without_returning(db)
            .await?;
        Ok(true)
    }
}

/// Recipes the user reacted to, most recent reaction first.
async fn reacted_recipes<R: Reaction>(
    state: &AppState,
    user_id: Uuid,
    query: &PageQuery,
) -> Result<Paged<RecipeCard>, AppError> {
    let mut select = R::find().filter(R::user_column().eq(user_id));
    if let Some(term) = query.search() {
        select = select.filter(
            R::recipe_column().in_subquery(
                SeaQuery::select()
                    .column(recipe::Column::Id)
                    .from(recipe::Entity)
                    .cond_where(contains_ci(recipe::Column::Title, term))
                    .to_owned(),
            ),
        );
    }

    let total = select.clone().count(&state.db).await?;
    let recipe_ids: Vec<Uuid> = select
        .order_by_desc(R::created_column())
        .offset(query.offset())
        .limit(query.limit())
        .select_only()
        .column(R::recipe_column())
        .into_tuple()
        .all(&state.db)
        .await?;

    let mut recipes = recipe::Entity::find()
        .filter(recipe::Column::Id.is_in(recipe_ids.clone()))
        .all(&state.db)
        .await?;
    recipes.sort_by_key(|r| recipe_ids.iter().position(|id| *id == r.id));

    Ok(Paged {
        data: recipe_cards(&state.db, &state.config.storage.public_url, recipes).await?,
        meta: PageMeta::new(query.page(), query.limit(), total),
    })
}

#[instrument(skip(state, auth_user, query), fields(user_id = %auth_user.user_id))]
pub async fn list_liked_recipes(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<RecipeCard>>, AppError> {
    let page = reacted_recipes::<liked_recipe::Entity>(&state, auth_user.user_id, &query).await?;
    Ok(Json(page))
}

#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, recipe_id = %recipe_id))]
pub async fn is_liked(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> Result<Json<ActiveResponse>, AppError> {
    find_recipe(&state.db, recipe_id).await?;
    let active = is_active::<liked_recipe::Entity, _>(&state.db, auth_user.user_id, recipe_id).await?;
    Ok(Json(ActiveResponse { active }))
}

#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, recipe_id = %recipe_id))]
pub async fn toggle_like(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> Result<Json<ActiveResponse>, AppError> {
    find_recipe(&state.db, recipe_id).await?;
    let active = toggle::<liked_recipe::Entity, _>(&state.db, auth_user.user_id, recipe_id).await?;
    Ok(Json(ActiveResponse { active }))
}

#[instrument(skip(state, auth_user, query), fields(user_id = %auth_user.user_id))]
pub async fn list_favorite_recipes(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<RecipeCard>>, AppError> {
    let page =
        reacted_recipes::<favorite_recipe::Entity>(&state, auth_user.user_id, &query).await?;
    Ok(Json(page))
}

#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, recipe_id = %recipe_id))]
pub async fn is_favorite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> Result<Json<ActiveResponse>, AppError> {
    find_recipe(&state.db, recipe_id).await?;
    let active =
        is_active::<favorite_recipe::Entity, _>(&state.db, auth_user.user_id, recipe_id).await?;
    Ok(Json(ActiveResponse { active }))
}

#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, recipe_id = %recipe_id))]
pub async fn toggle_favorite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> Result<Json<ActiveResponse>, AppError> {
    find_recipe(&state.db, recipe_id).await?;
    let active =
        toggle::<favorite_recipe::Entity, _>(&state.db, auth_user.user_id, recipe_id).await?;
    Ok(Json(ActiveResponse { active }))
}

/// Record that the user opened the recipe. Repeated views are not counted.
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, recipe_id = %recipe_id))]
pub async fn add_view(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> Result<Json<ActiveResponse>, AppError> {
    find_recipe(&state.db, recipe_id).await?;
    if !is_active::<recipe_view::Entity, _>(&state.db, auth_user.user_id, recipe_id).await? {
        recipe_view::Entity::insert(recipe_view::Entity::row(auth_user.user_id, recipe_id))
            .exec_without_returning(&state.db)
            .await?;
    }
    Ok(Json(ActiveResponse { active: true }))
}
