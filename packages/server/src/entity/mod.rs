pub mod favorite_recipe;
pub mod follows;
pub mod liked_recipe;
pub mod message;
pub mod recipe;
pub mod recipe_comment;
pub mod recipe_comment_image;
pub mod recipe_image;
pub mod recipe_tag;
pub mod recipe_tag_category;
pub mod recipe_tag_link;
pub mod recipe_view;
pub mod user;
