use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::info;
use uuid::Uuid;

use crate::entity::{recipe_tag, recipe_tag_category};

/// Tag categories and their tags created on startup.
const DEFAULT_TAGS: &[(&str, &[&str])] = &[
    (
        "Type of Food",
        &[
            "Breakfast",
            "Lunch",
            "Dinner",
            "Snack",
            "Dessert",
            "Appetizer",
            "Side Dish",
        ],
    ),
    (
        "Dietary Preferences",
        &[
            "Vegetarian",
            "Vegan",
            "Gluten-Free",
            "Dairy-Free",
            "Low-Carb",
            "Paleo",
            "Keto",
        ],
    ),
    (
        "Cooking Methods",
        &["Baking", "Grilling", "Frying", "Steaming", "Boiling"],
    ),
    ("Occasion", &["Holiday", "Party", "Special Occasion"]),
];

/// Seed the default tag categories and tags. Existing names are left alone,
/// so running this on every start is safe.
pub async fn seed_tag_categories<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let mut categories_inserted = 0u64;
    let mut tags_inserted = 0u64;

    for &(category_name, tags) in DEFAULT_TAGS {
        let category = recipe_tag_category::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(category_name.to_string()),
            ..Default::default()
        };
        categories_inserted += recipe_tag_category::Entity::insert(category)
            .on_conflict(
                OnConflict::column(recipe_tag_category::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        let category_id = recipe_tag_category::Entity::find()
            .filter(recipe_tag_category::Column::Name.eq(category_name))
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("tag category {category_name}")))?
            .id;

        for &tag_name in tags {
            let tag = recipe_tag::ActiveModel {
                id: Set(Uuid::now_v7()),
                name: Set(tag_name.to_string()),
                tag_category_id: Set(category_id),
                ..Default::default()
            };
            tags_inserted += recipe_tag::Entity::insert(tag)
                .on_conflict(
                    OnConflict::column(recipe_tag::Column::Name)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(db)
                .await?;
        }
    }

    if categories_inserted > 0 || tags_inserted > 0 {
        info!(
            "Seeded {} tag categories and {} tags",
            categories_inserted, tags_inserted
        );
    }

    Ok(())
}
