//! Cascading deletes that remove dependent rows inside a caller-owned
//! transaction and register the files those rows referenced.
//!
//! Files are only registered here. The caller commits its transaction and
//! then calls [`DeferredDeletes::complete`]; if anything fails first, the
//! registered paths are dropped together with the rolled-back transaction.

use common::storage::{DeferredDeletes, UploadFolder, UploadStore};
use sea_orm::sea_query::Condition;
use sea_orm::*;
use tracing::debug;
use uuid::Uuid;

use crate::entity::{
    favorite_recipe, follows, liked_recipe, message, recipe, recipe_comment,
    recipe_comment_image, recipe_image, recipe_tag, recipe_tag_category, recipe_tag_link,
    recipe_view, user,
};

/// One logical delete operation: a connection (normally a transaction), the
/// upload store that resolves file names, and the operation's deferred set.
///
/// Every method returns `Ok(false)` without touching anything when the target
/// row does not exist.
pub struct Cascade<'a, C: ConnectionTrait> {
    db: &'a C,
    uploads: &'a UploadStore,
    deferred: &'a mut DeferredDeletes,
}

impl<'a, C: ConnectionTrait> Cascade<'a, C> {
    pub fn new(db: &'a C, uploads: &'a UploadStore, deferred: &'a mut DeferredDeletes) -> Self {
        Self {
            db,
            uploads,
            deferred,
        }
    }

    fn defer(&mut self, folder: UploadFolder, file_name: &str) {
        if file_name.is_empty() {
            return;
        }
        self.deferred.add(self.uploads.path_for(folder, file_name));
    }

    /// Comment images, then the comment.
    pub async fn delete_comment(&mut self, comment_id: Uuid) -> Result<bool, DbErr> {
        let Some(comment) = recipe_comment::Entity::find_by_id(comment_id)
            .one(self.db)
            .await?
        else {
            return Ok(false);
        };

        let images = recipe_comment_image::Entity::find()
            .filter(recipe_comment_image::Column::CommentId.eq(comment.id))
            .all(self.db)
            .await?;
        for image in &images {
            self.defer(UploadFolder::Recipes, &image.image_url);
        }
        recipe_comment_image::Entity::delete_many()
            .filter(recipe_comment_image::Column::CommentId.eq(comment.id))
            .exec(self.db)
            .await?;

        expect_deleted(
            recipe_comment::Entity::delete_by_id(comment.id)
                .exec(self.db)
                .await?,
            "recipe_comment",
            comment.id,
        )?;

        debug!(comment_id = %comment.id, images = images.len(), "Comment deleted");
        Ok(true)
    }

    /// Views, likes and favorites; main and gallery images; every comment;
    /// tag links; then the recipe.
    pub async fn delete_recipe(&mut self, recipe_id: Uuid) -> Result<bool, DbErr> {
        let Some(recipe) = recipe::Entity::find_by_id(recipe_id).one(self.db).await? else {
            return Ok(false);
        };

        recipe_view::Entity::delete_many()
            .filter(recipe_view::Column::RecipeId.eq(recipe.id))
            .exec(self.db)
            .await?;
        liked_recipe::Entity::delete_many()
            .filter(liked_recipe::Column::RecipeId.eq(recipe.id))
            .exec(self.db)
            .await?;
        favorite_recipe::Entity::delete_many()
            .filter(favorite_recipe::Column::RecipeId.eq(recipe.id))
            .exec(self.db)
            .await?;

        if let Some(main_image) = &recipe.main_image_url {
            self.defer(UploadFolder::Recipes, main_image);
        }
        let images = recipe_image::Entity::find()
            .filter(recipe_image::Column::RecipeId.eq(recipe.id))
            .all(self.db)
            .await?;
        for image in &images {
            self.defer(UploadFolder::Recipes, &image.image_url);
        }
        recipe_image::Entity::delete_many()
            .filter(recipe_image::Column::RecipeId.eq(recipe.id))
            .exec(self.db)
            .await?;

        let comment_ids: Vec<Uuid> = recipe_comment::Entity::find()
            .filter(recipe_comment::Column::RecipeId.eq(recipe.id))
            .select_only()
            .column(recipe_comment::Column::Id)
            .into_tuple()
            .all(self.db)
            .await?;
        for comment_id in &comment_ids {
            self.delete_comment(*comment_id).await?;
        }

        recipe_tag_link::Entity::delete_many()
            .filter(recipe_tag_link::Column::RecipeId.eq(recipe.id))
            .exec(self.db)
            .await?;

        expect_deleted(
            recipe::Entity::delete_by_id(recipe.id).exec(self.db).await?,
            "recipe",
            recipe.id,
        )?;

        debug!(
            recipe_id = %recipe.id,
            images = images.len(),
            comments = comment_ids.len(),
            "Recipe deleted"
        );
        Ok(true)
    }

    /// Detach the tag from every recipe carrying it, then delete the tag.
    /// Recipes and files are never touched.
    pub async fn delete_tag(&mut self, tag_id: Uuid) -> Result<bool, DbErr> {
        let Some(tag) = recipe_tag::Entity::find_by_id(tag_id).one(self.db).await? else {
            return Ok(false);
        };

        let recipe_ids: Vec<Uuid> = recipe_tag_link::Entity::find()
            .filter(recipe_tag_link::Column::TagId.eq(tag.id))
            .select_only()
            .column(recipe_tag_link::Column::RecipeId)
            .into_tuple()
            .all(self.db)
            .await?;
        for recipe_id in &recipe_ids {
            recipe_tag_link::Entity::delete_many()
                .filter(recipe_tag_link::Column::RecipeId.eq(*recipe_id))
                .filter(recipe_tag_link::Column::TagId.eq(tag.id))
                .exec(self.db)
                .await?;
        }

        expect_deleted(
            recipe_tag::Entity::delete_by_id(tag.id).exec(self.db).await?,
            "recipe_tag",
            tag.id,
        )?;

        debug!(tag_id = %tag.id, detached = recipe_ids.len(), "Tag deleted");
        Ok(true)
    }

    /// Every tag of the category, then the category.
    pub async fn delete_tag_category(&mut self, category_id: Uuid) -> Result<bool, DbErr> {
        let Some(category) = recipe_tag_category::Entity::find_by_id(category_id)
            .one(self.db)
            .await?
        else {
            return Ok(false);
        };

        let tag_ids: Vec<Uuid> = recipe_tag::Entity::find()
            .filter(recipe_tag::Column::TagCategoryId.eq(category.id))
            .select_only()
            .column(recipe_tag::Column::Id)
            .into_tuple()
            .all(self.db)
            .await?;
        for tag_id in &tag_ids {
            self.delete_tag(*tag_id).await?;
        }

        expect_deleted(
            recipe_tag_category::Entity::delete_by_id(category.id)
                .exec(self.db)
                .await?,
            "recipe_tag_category",
            category.id,
        )?;

        debug!(category_id = %category.id, tags = tag_ids.len(), "Tag category deleted");
        Ok(true)
    }

    /// Avatar, follow edges, the user's own views/likes/favorites, messages,
    /// authored recipes, remaining comments by the user, then the user.
    pub async fn delete_user(&mut self, user_id: Uuid) -> Result<bool, DbErr> {
        let Some(user) = user::Entity::find_by_id(user_id).one(self.db).await? else {
            return Ok(false);
        };

        if let Some(avatar) = &user.avatar_url {
            self.defer(UploadFolder::Avatars, avatar);
        }

        follows::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(follows::Column::FollowerId.eq(user.id))
                    .add(follows::Column::FollowingId.eq(user.id)),
            )
            .exec(self.db)
            .await?;
        recipe_view::Entity::delete_many()
            .filter(recipe_view::Column::UserId.eq(user.id))
            .exec(self.db)
            .await?;
        liked_recipe::Entity::delete_many()
            .filter(liked_recipe::Column::UserId.eq(user.id))
            .exec(self.db)
            .await?;
        favorite_recipe::Entity::delete_many()
            .filter(favorite_recipe::Column::UserId.eq(user.id))
            .exec(self.db)
            .await?;
        message::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(message::Column::SenderId.eq(user.id))
                    .add(message::Column::ReceiverId.eq(user.id)),
            )
            .exec(self.db)
            .await?;

        let recipe_ids: Vec<Uuid> = recipe::Entity::find()
            .filter(recipe::Column::AuthorId.eq(user.id))
            .select_only()
            .column(recipe::Column::Id)
            .into_tuple()
            .all(self.db)
            .await?;
        for recipe_id in &recipe_ids {
            self.delete_recipe(*recipe_id).await?;
        }

        // Comments left on other authors' recipes still reference the user.
        let comment_ids: Vec<Uuid> = recipe_comment::Entity::find()
            .filter(recipe_comment::Column::UserId.eq(user.id))
            .select_only()
            .column(recipe_comment::Column::Id)
            .into_tuple()
            .all(self.db)
            .await?;
        for comment_id in &comment_ids {
            self.delete_comment(*comment_id).await?;
        }

        expect_deleted(
            user::Entity::delete_by_id(user.id).exec(self.db).await?,
            "user",
            user.id,
        )?;

        debug!(
            user_id = %user.id,
            recipes = recipe_ids.len(),
            comments = comment_ids.len(),
            "User deleted"
        );
        Ok(true)
    }
}

/// A row found at the start of a chain must still be there at its end.
fn expect_deleted(result: DeleteResult, table: &str, id: Uuid) -> Result<(), DbErr> {
    if result.rows_affected == 0 {
        return Err(DbErr::RecordNotFound(format!(
            "{table} {id} disappeared during delete"
        )));
    }
    Ok(())
}
