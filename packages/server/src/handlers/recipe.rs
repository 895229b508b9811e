use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use common::storage::{DeferredDeletes, UploadFolder};
use sea_orm::sea_query::{Condition, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::cascade::Cascade;
use crate::entity::{
    liked_recipe, recipe, recipe_image, recipe_tag, recipe_tag_link, recipe_view, user,
};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::recipe::{
    ImageResponse, RecipeCard, RecipeDetail, RecipeListQuery, SearchBy, SortBy,
};
use crate::models::shared::{MessageResponse, PageMeta, Paged, contains_ci, page_offset};
use crate::models::user::UserSummary;
use crate::state::AppState;
use crate::utils::queries::{count_grouped, find_recipe, find_user, recipe_cards, tags_by_recipe};
use crate::utils::upload::{IMAGES, MAIN_IMAGE, UploadedForm, receive_form};
use crate::utils::urls::recipe_image_url;

#[instrument(skip(state, query))]
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(query): Query<RecipeListQuery>,
) -> Result<Json<Paged<RecipeCard>>, AppError> {
    let search_by = query.search_by()?;
    let sort_by = query.sort_by()?;
    let order = query.order()?;
    let page = query.page();
    let limit = query.limit();
    let offset = page_offset(page, limit);

    let mut select = recipe::Entity::find();

    if let Some(term) = query.search() {
        let mut any = Condition::any();
        if matches!(search_by, SearchBy::Title | SearchBy::All) {
            any = any.add(contains_ci(recipe::Column::Title, term));
        }
        if matches!(search_by, SearchBy::Text | SearchBy::All) {
            any = any.add(contains_ci(recipe::Column::Text, term));
        }
        if matches!(search_by, SearchBy::Ingredients | SearchBy::All) {
            any = any.add(contains_ci(recipe::Column::Ingredients, term));
        }
        select = select.filter(any);
    }

    if let Some(tag_ids) = query.tag_ids() {
        select = select.filter(
            recipe::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(recipe_tag_link::Column::RecipeId)
                    .from(recipe_tag_link::Entity)
                    .and_where(recipe_tag_link::Column::TagId.is_in(tag_ids))
                    .to_owned(),
            ),
        );
    }

    let total = select.clone().count(&state.db).await?;

    let recipes = match sort_by {
        SortBy::Date => {
            select
                .order_by(recipe::Column::CreatedAt, order)
                .offset(offset)
                .limit(limit)
                .all(&state.db)
                .await?
        }
        SortBy::Likes | SortBy::Views => {
            let ids: Vec<Uuid> = select
                .select_only()
                .column(recipe::Column::Id)
                .into_tuple()
                .all(&state.db)
                .await?;
            let counts = if sort_by == SortBy::Likes {
                count_grouped::<liked_recipe::Entity, _>(
                    &state.db,
                    liked_recipe::Column::RecipeId,
                    &ids,
                )
                .await?
            } else {
                count_grouped::<recipe_view::Entity, _>(
                    &state.db,
                    recipe_view::Column::RecipeId,
                    &ids,
                )
                .await?
            };

            let mut ranked: Vec<(u64, Uuid)> = ids
                .into_iter()
                .map(|id| (counts.get(&id).copied().unwrap_or(0), id))
                .collect();
            match order {
                Order::Asc => ranked.sort(),
                _ => ranked.sort_by(|a, b| b.cmp(a)),
            }
            let page_ids: Vec<Uuid> = ranked
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .map(|(_, id)| id)
                .collect();

            let mut rows = recipe::Entity::find()
                .filter(recipe::Column::Id.is_in(page_ids.clone()))
                .all(&state.db)
                .await?;
            rows.sort_by_key(|r| page_ids.iter().position(|id| *id == r.id));
            rows
        }
    };

    Ok(Json(Paged {
        data: recipe_cards(&state.db, &state.config.storage.public_url, recipes).await?,
        meta: PageMeta::new(page, limit, total),
    }))
}

#[instrument(skip(state), fields(id = %id))]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RecipeDetail>, AppError> {
    Ok(Json(
        recipe_detail(&state.db, &state.config.storage.public_url, id).await?,
    ))
}

#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.user_id))]
pub async fn create_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = receive_form(
        multipart,
        &state.uploads,
        UploadFolder::Recipes,
        &[MAIN_IMAGE, IMAGES],
    )
    .await?;

    let id = match insert_recipe(&state, auth_user.user_id, &form).await {
        Ok(id) => id,
        Err(e) => {
            form.discard().await;
            return Err(e);
        }
    };

    tracing::info!(recipe_id = %id, files = form.files().len(), "Recipe created");
    let detail = recipe_detail(&state.db, &state.config.storage.public_url, id).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn insert_recipe(
    state: &AppState,
    author_id: Uuid,
    form: &UploadedForm,
) -> Result<Uuid, AppError> {
    let (Some(title), Some(text), Some(ingredients)) = (
        form.text("title"),
        form.text("text"),
        form.text("ingredients"),
    ) else {
        return Err(AppError::all_fields_required());
    };
    let tag_ids = match form.json_list::<Uuid>("tagsId")? {
        Some(ids) => existing_tags(&state.db, ids).await?,
        None => Vec::new(),
    };

    let txn = state.db.begin().await?;
    let now = Utc::now();
    let recipe = recipe::ActiveModel {
        id: Set(Uuid::now_v7()),
        title: Set(title.to_string()),
        text: Set(text.to_string()),
        ingredients: Set(ingredients.to_string()),
        main_image_url: Set(form.first_file(MAIN_IMAGE.name).map(|f| f.file_name.clone())),
        author_id: Set(author_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for file in form.files_in(IMAGES.name) {
        add_gallery_image(&txn, recipe.id, &file.file_name).await?;
    }
    link_tags(&txn, recipe.id, &tag_ids).await?;

    txn.commit().await?;
    Ok(recipe.id)
}

#[instrument(skip(state, auth_user, multipart), fields(id = %id, user_id = %auth_user.user_id))]
pub async fn update_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<RecipeDetail>, AppError> {
    let form = receive_form(
        multipart,
        &state.uploads,
        UploadFolder::Recipes,
        &[MAIN_IMAGE, IMAGES],
    )
    .await?;

    let mut deferred = DeferredDeletes::new();
    if let Err(e) = apply_recipe_update(&state, auth_user, id, &form, &mut deferred).await {
        form.discard().await;
        return Err(e);
    }
    let removed = deferred.complete().await;

    tracing::info!(recipe_id = %id, removed, "Recipe updated");
    Ok(Json(
        recipe_detail(&state.db, &state.config.storage.public_url, id).await?,
    ))
}

/// Apply an update inside one transaction. Files of replaced images are
/// registered in `deferred` and only deleted by the caller after commit.
async fn apply_recipe_update(
    state: &AppState,
    auth_user: AuthUser,
    id: Uuid,
    form: &UploadedForm,
    deferred: &mut DeferredDeletes,
) -> Result<(), AppError> {
    let recipe = find_recipe(&state.db, id).await?;
    if recipe.author_id != auth_user.user_id {
        return Err(AppError::PermissionDenied);
    }
    let keep_images = form.json_list::<Uuid>("imagesId")?;
    let tag_ids = match form.json_list::<Uuid>("tagsId")? {
        Some(ids) => Some(existing_tags(&state.db, ids).await?),
        None => None,
    };

    let txn = state.db.begin().await?;
    let mut active: recipe::ActiveModel = recipe.clone().into();
    if let Some(title) = form.text("title") {
        active.title = Set(title.to_string());
    }
    if let Some(text) = form.text("text") {
        active.text = Set(text.to_string());
    }
    if let Some(ingredients) = form.text("ingredients") {
        active.ingredients = Set(ingredients.to_string());
    }
    if let Some(main_image) = form.first_file(MAIN_IMAGE.name) {
        if let Some(old) = recipe.main_image_url.as_deref().filter(|o| !o.is_empty()) {
            deferred.add(state.uploads.path_for(UploadFolder::Recipes, old));
        }
        active.main_image_url = Set(Some(main_image.file_name.clone()));
    }

    if let Some(keep) = keep_images {
        let dropped: Vec<recipe_image::Model> = recipe_image::Entity::find()
            .filter(recipe_image::Column::RecipeId.eq(recipe.id))
            .all(&txn)
            .await?
            .into_iter()
            .filter(|image| !keep.contains(&image.id))
            .collect();
        for image in &dropped {
            deferred.add(state.uploads.path_for(UploadFolder::Recipes, &image.image_url));
        }
        recipe_image::Entity::delete_many()
            .filter(recipe_image::Column::RecipeId.eq(recipe.id))
            .filter(recipe_image::Column::Id.is_in(dropped.iter().map(|i| i.id)))
            .exec(&txn)
            .await?;
    }
    for file in form.files_in(IMAGES.name) {
        add_gallery_image(&txn, recipe.id, &file.file_name).await?;
    }

    if let Some(tag_ids) = tag_ids {
        recipe_tag_link::Entity::delete_many()
            .filter(recipe_tag_link::Column::RecipeId.eq(recipe.id))
            .exec(&txn)
            .await?;
        link_tags(&txn, recipe.id, &tag_ids).await?;
    }

    active.updated_at = Set(Utc::now());
    active.update(&txn).await?;
    txn.commit().await?;
    Ok(())
}

#[instrument(skip(state, auth_user), fields(id = %id, user_id = %auth_user.user_id))]
pub async fn delete_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let recipe = find_recipe(&state.db, id).await?;
    auth_user.require_owner_or_admin(recipe.author_id)?;

    let mut deferred = DeferredDeletes::new();
    let txn = state.db.begin().await?;
    let found = Cascade::new(&txn, &*state.uploads, &mut deferred)
        .delete_recipe(recipe.id)
        .await?;
    if !found {
        return Err(AppError::NotFound("Recipe not found".into()));
    }
    txn.commit().await?;
    let removed = deferred.complete().await;

    tracing::info!(recipe_id = %id, removed, "Recipe deleted");
    Ok(Json(MessageResponse::new("Recipe was deleted successfully")))
}

/// Full view of one recipe with author, gallery, tags and like count.
pub(crate) async fn recipe_detail<C: ConnectionTrait>(
    db: &C,
    public_url: &str,
    id: Uuid,
) -> Result<RecipeDetail, AppError> {
    let recipe = find_recipe(db, id).await?;
    let author: user::Model = find_user(db, recipe.author_id).await?;
    let images = recipe_image::Entity::find()
        .filter(recipe_image::Column::RecipeId.eq(recipe.id))
        .order_by_asc(recipe_image::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|image| ImageResponse {
            id: image.id,
            image_url: recipe_image_url(public_url, &image.image_url),
        })
        .collect();
    let tags = tags_by_recipe(db, &[recipe.id])
        .await?
        .remove(&recipe.id)
        .unwrap_or_default();
    let likes_count = liked_recipe::Entity::find()
        .filter(liked_recipe::Column::RecipeId.eq(recipe.id))
        .count(db)
        .await?;

    Ok(RecipeDetail {
        id: recipe.id,
        main_image_url: recipe
            .main_image_url
            .map(|m| recipe_image_url(public_url, &m)),
        author_id: recipe.author_id,
        author: UserSummary::new(&author, public_url),
        images,
        tags,
        likes_count,
        title: recipe.title,
        text: recipe.text,
        ingredients: recipe.ingredients,
        created_at: recipe.created_at,
        updated_at: recipe.updated_at,
    })
}

/// Deduplicated tag ids, rejecting ids that name no tag.
async fn existing_tags<C: ConnectionTrait>(
    db: &C,
    mut ids: Vec<Uuid>,
) -> Result<Vec<Uuid>, AppError> {
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(ids);
    }
    let found = recipe_tag::Entity::find()
        .filter(recipe_tag::Column::Id.is_in(ids.clone()))
        .count(db)
        .await?;
    if found != ids.len() as u64 {
        return Err(AppError::Validation("tagsId contains an unknown tag".into()));
    }
    Ok(ids)
}

async fn add_gallery_image<C: ConnectionTrait>(
    db: &C,
    recipe_id: Uuid,
    file_name: &str,
) -> Result<(), DbErr> {
    recipe_image::ActiveModel {
        id: Set(Uuid::now_v7()),
        image_url: Set(file_name.to_string()),
        recipe_id: Set(recipe_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn link_tags<C: ConnectionTrait>(
    db: &C,
    recipe_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<(), DbErr> {
    for tag_id in tag_ids {
        recipe_tag_link::Entity::insert(recipe_tag_link::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(*tag_id),
            ..Default::default()
        })
        .exec_without_returning(db)
        .await?;
    }
    Ok(())
}
