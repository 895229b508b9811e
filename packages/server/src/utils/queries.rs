//! Read-side lookups shared by several handlers.

use std::collections::HashMap;

use sea_orm::sea_query::{Expr, Func};
use sea_orm::*;
use uuid::Uuid;

use crate::entity::{
    follows, liked_recipe, recipe, recipe_comment, recipe_comment_image, recipe_tag,
    recipe_tag_link, recipe_view, user,
};
use crate::error::AppError;
use crate::models::comment::CommentResponse;
use crate::models::recipe::{ImageResponse, RecipeCard};
use crate::models::tag::TagResponse;
use crate::models::user::{FollowUser, UserSummary};
use crate::utils::urls::recipe_image_url;

pub async fn find_recipe<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<recipe::Model, AppError> {
    recipe::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".into()))
}

pub async fn find_user<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// `SELECT column, COUNT(column) ... WHERE column IN ids GROUP BY column`.
pub async fn count_grouped<E, C>(
    db: &C,
    column: E::Column,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, u64>, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, i64)> = E::find()
        .select_only()
        .column(column)
        .column_as(Expr::expr(Func::count(Expr::col(column))), "count")
        .filter(column.is_in(ids.iter().copied()))
        .group_by(column)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(id, count)| (id, Ord::max(count, 0) as u64))
        .collect())
}

pub async fn users_by_id<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, user::Model>, DbErr> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect())
}

/// Tags attached to each recipe, sorted by name.
pub async fn tags_by_recipe<C: ConnectionTrait>(
    db: &C,
    recipe_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<TagResponse>>, DbErr> {
    if recipe_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let links = recipe_tag_link::Entity::find()
        .filter(recipe_tag_link::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .all(db)
        .await?;
    let tag_ids: Vec<Uuid> = links.iter().map(|l| l.tag_id).collect();
    let tags: HashMap<Uuid, recipe_tag::Model> = recipe_tag::Entity::find()
        .filter(recipe_tag::Column::Id.is_in(tag_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    let mut by_recipe: HashMap<Uuid, Vec<TagResponse>> = HashMap::new();
    for link in links {
        if let Some(tag) = tags.get(&link.tag_id) {
            by_recipe
                .entry(link.recipe_id)
                .or_default()
                .push(TagResponse::from(tag.clone()));
        }
    }
    for tags in by_recipe.values_mut() {
        tags.sort_by(|a, b| a.name.cmp(&b.name));
    }
    Ok(by_recipe)
}

/// List entries for `recipes`, keeping their order.
pub async fn recipe_cards<C: ConnectionTrait>(
    db: &C,
    public_url: &str,
    recipes: Vec<recipe::Model>,
) -> Result<Vec<RecipeCard>, DbErr> {
    let ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();
    let mut tags = tags_by_recipe(db, &ids).await?;
    let likes = count_grouped::<liked_recipe::Entity, _>(db, liked_recipe::Column::RecipeId, &ids)
        .await?;
    let views = count_grouped::<recipe_view::Entity, _>(db, recipe_view::Column::RecipeId, &ids)
        .await?;

    Ok(recipes
        .into_iter()
        .map(|r| RecipeCard {
            id: r.id,
            main_image_url: r.main_image_url.map(|m| recipe_image_url(public_url, &m)),
            tags: tags.remove(&r.id).unwrap_or_default(),
            likes_count: likes.get(&r.id).copied().unwrap_or(0),
            views: views.get(&r.id).copied().unwrap_or(0),
            title: r.title,
            ingredients: r.ingredients,
            created_at: r.created_at,
        })
        .collect())
}

/// Response entries for `comments`, keeping their order.
pub async fn comment_responses<C: ConnectionTrait>(
    db: &C,
    public_url: &str,
    comments: Vec<recipe_comment::Model>,
) -> Result<Vec<CommentResponse>, DbErr> {
    if comments.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = comments.iter().map(|c| c.id).collect();
    let mut images: HashMap<Uuid, Vec<ImageResponse>> = HashMap::new();
    for image in recipe_comment_image::Entity::find()
        .filter(recipe_comment_image::Column::CommentId.is_in(ids))
        .all(db)
        .await?
    {
        images.entry(image.comment_id).or_default().push(ImageResponse {
            id: image.id,
            image_url: recipe_image_url(public_url, &image.image_url),
        });
    }
    let users = users_by_id(db, comments.iter().map(|c| c.user_id)).await?;

    let mut out = Vec::with_capacity(comments.len());
    for comment in comments {
        let Some(author) = users.get(&comment.user_id) else {
            continue;
        };
        out.push(CommentResponse {
            id: comment.id,
            user: UserSummary::new(author, public_url),
            images: images.remove(&comment.id).unwrap_or_default(),
            text: comment.text,
            rating: comment.rating,
            recipe_id: comment.recipe_id,
            created_at: comment.created_at,
        });
    }
    Ok(out)
}

/// Users with their follower and following counts.
pub async fn follow_users<C: ConnectionTrait>(
    db: &C,
    public_url: &str,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, FollowUser>, DbErr> {
    let users = users_by_id(db, ids.iter().copied()).await?;
    let followers =
        count_grouped::<follows::Entity, _>(db, follows::Column::FollowingId, ids).await?;
    let following =
        count_grouped::<follows::Entity, _>(db, follows::Column::FollowerId, ids).await?;

    Ok(users
        .into_iter()
        .map(|(id, user)| {
            (
                id,
                FollowUser {
                    user: UserSummary::new(&user, public_url),
                    followers_count: followers.get(&id).copied().unwrap_or(0),
                    following_count: following.get(&id).copied().unwrap_or(0),
                },
            )
        })
        .collect())
}
