use serde_json::json;

use crate::common::{FormPart, TestApp, routes};

#[tokio::test]
async fn default_categories_are_listed() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::TAGS, None).await;

    assert_eq!(res.status, 200);
    let categories = res.body.as_array().unwrap();
    assert_eq!(categories.len(), 4);
    let food = categories
        .iter()
        .find(|c| c["name"] == "Type of Food")
        .expect("seeded category missing");
    assert_eq!(food["tags"].as_array().unwrap().len(), 7);
}

mod categories {
    use super::*;

    #[tokio::test]
    async fn admin_manages_categories() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;

        let created = app
            .post(routes::TAG_CATEGORIES, &json!({"name": "Cuisine"}), Some(&admin))
            .await;
        assert_eq!(created.status, 201, "{}", created.text);
        let id = created.id();

        let renamed = app
            .put(&routes::tag_category(&id), &json!({"name": "World Cuisine"}), Some(&admin))
            .await;
        assert_eq!(renamed.status, 200);
        assert_eq!(renamed.body["name"], "World Cuisine");

        let deleted = app.delete(&routes::tag_category(&id), Some(&admin)).await;
        assert_eq!(deleted.status, 200);

        let again = app.delete(&routes::tag_category(&id), Some(&admin)).await;
        assert_eq!(again.status, 203);
    }

    #[tokio::test]
    async fn regular_users_cannot_create() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .post(routes::TAG_CATEGORIES, &json!({"name": "Cuisine"}), Some(&token))
            .await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn duplicate_and_blank_names_are_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;

        let dup = app
            .post(routes::TAG_CATEGORIES, &json!({"name": "Occasion"}), Some(&admin))
            .await;
        assert_eq!(dup.status, 409);

        let blank = app
            .post(routes::TAG_CATEGORIES, &json!({"name": "  "}), Some(&admin))
            .await;
        assert_eq!(blank.status, 400);
    }

    #[tokio::test]
    async fn deleting_a_category_untags_recipes() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let category = app
            .post(routes::TAG_CATEGORIES, &json!({"name": "Cuisine"}), Some(&admin))
            .await
            .id();
        let tag = app
            .post(&routes::tag_category(&category), &json!({"name": "Thai"}), Some(&admin))
            .await;
        assert_eq!(tag.status, 201, "{}", tag.text);
        let tags = format!("[\"{}\"]", tag.id());
        let recipe = app
            .create_recipe(&admin, "Pad Thai", &[FormPart::Text("tagsId", &tags)])
            .await;
        let recipe_id = recipe["id"].as_str().unwrap();

        let res = app.delete(&routes::tag_category(&category), Some(&admin)).await;
        assert_eq!(res.status, 200);

        let recipe = app.get(&routes::recipe(recipe_id), None).await;
        assert_eq!(recipe.status, 200);
        assert!(recipe.body["tags"].as_array().unwrap().is_empty());
    }
}

mod tags {
    use super::*;

    #[tokio::test]
    async fn admin_manages_tags() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let category = app
            .post(routes::TAG_CATEGORIES, &json!({"name": "Cuisine"}), Some(&admin))
            .await
            .id();
        let other = app
            .post(routes::TAG_CATEGORIES, &json!({"name": "Region"}), Some(&admin))
            .await
            .id();

        let created = app
            .post(&routes::tag_category(&category), &json!({"name": "Thai"}), Some(&admin))
            .await;
        assert_eq!(created.status, 201);
        assert_eq!(created.body["tagCategoryId"], category.as_str());
        let tag_id = created.id();

        let moved = app
            .put(&routes::tag(&other, &tag_id), &json!({"name": "Thailand"}), Some(&admin))
            .await;
        assert_eq!(moved.status, 200, "{}", moved.text);
        assert_eq!(moved.body["name"], "Thailand");
        assert_eq!(moved.body["tagCategoryId"], other.as_str());

        let deleted = app.delete(&routes::tag(&other, &tag_id), Some(&admin)).await;
        assert_eq!(deleted.status, 200);

        let again = app.delete(&routes::tag(&other, &tag_id), Some(&admin)).await;
        assert_eq!(again.status, 203);
    }

    #[tokio::test]
    async fn tag_in_missing_category_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;

        let res = app
            .post(
                &routes::tag_category(&uuid::Uuid::now_v7().to_string()),
                &json!({"name": "Thai"}),
                Some(&admin),
            )
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn duplicate_tag_name_conflicts() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let category = app
            .post(routes::TAG_CATEGORIES, &json!({"name": "Cuisine"}), Some(&admin))
            .await
            .id();

        let res = app
            .post(&routes::tag_category(&category), &json!({"name": "Vegan"}), Some(&admin))
            .await;
        assert_eq!(res.status, 409);
    }
}
