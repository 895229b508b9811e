use reqwest::Method;

use crate::common::{FormPart, TestApp, routes};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\ncomment image";

async fn post_comment(app: &TestApp, recipe_id: &str, text: &str, token: &str) -> String {
    let res = app
        .multipart(
            Method::POST,
            &routes::comments(recipe_id),
            &[FormPart::Text("text", text)],
            token,
        )
        .await;
    assert_eq!(res.status, 201, "post_comment failed: {}", res.text);
    res.id()
}

#[tokio::test]
async fn comment_with_images_is_created() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice").await;
    let recipe = app.create_recipe(&token, "Pancakes", &[]).await;
    let recipe_id = recipe["id"].as_str().unwrap();

    let res = app
        .multipart(
            Method::POST,
            &routes::comments(recipe_id),
            &[
                FormPart::Text("text", "Lovely"),
                FormPart::File("images", "plate.png", PNG),
            ],
            &token,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["text"], "Lovely");
    assert_eq!(res.body["user"]["name"], "alice");
    let url = res.body["images"][0]["imageUrl"].as_str().unwrap();
    assert!(app.file_for_url(url).exists());
}

#[tokio::test]
async fn empty_text_is_rejected_and_images_discarded() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice").await;
    let recipe = app.create_recipe(&token, "Pancakes", &[]).await;
    let recipe_id = recipe["id"].as_str().unwrap();

    let res = app
        .multipart(
            Method::POST,
            &routes::comments(recipe_id),
            &[FormPart::File("images", "plate.png", PNG)],
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert!(app.stored_files("recipes").is_empty());
}

#[tokio::test]
async fn commenting_on_missing_recipe_is_not_found() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice").await;

    let res = app
        .multipart(
            Method::POST,
            &routes::comments(&uuid::Uuid::now_v7().to_string()),
            &[
                FormPart::Text("text", "Hello"),
                FormPart::File("images", "plate.png", PNG),
            ],
            &token,
        )
        .await;

    assert_eq!(res.status, 404);
    assert!(app.stored_files("recipes").is_empty());
}

#[tokio::test]
async fn own_comments_are_listed_separately() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice").await;
    let bob = app.create_authenticated_user("bob").await;
    let recipe = app.create_recipe(&alice, "Pancakes", &[]).await;
    let recipe_id = recipe["id"].as_str().unwrap();

    post_comment(&app, recipe_id, "From alice", &alice).await;
    post_comment(&app, recipe_id, "From bob", &bob).await;

    let res = app.get(&routes::comments(recipe_id), Some(&alice)).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["comments"]["userComments"][0]["text"], "From alice");
    assert_eq!(res.body["comments"]["otherComments"][0]["text"], "From bob");
    assert_eq!(res.body["comments"]["otherComments"].as_array().unwrap().len(), 1);
    assert_eq!(res.body["meta"]["count"], 2);

    let anonymous = app.get(&routes::comments(recipe_id), None).await;
    assert!(anonymous.body["comments"]["userComments"].as_array().unwrap().is_empty());
    assert_eq!(anonymous.body["comments"]["otherComments"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn only_author_or_admin_can_delete() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice").await;
    let bob = app.create_authenticated_user("bob").await;
    let recipe = app.create_recipe(&alice, "Pancakes", &[]).await;
    let recipe_id = recipe["id"].as_str().unwrap();
    let comment_id = post_comment(&app, recipe_id, "Mine", &bob).await;

    let denied = app
        .delete(&routes::comment(recipe_id, &comment_id), Some(&alice))
        .await;
    assert_eq!(denied.status, 403);

    let ok = app
        .delete(&routes::comment(recipe_id, &comment_id), Some(&bob))
        .await;
    assert_eq!(ok.status, 200, "{}", ok.text);

    let gone = app
        .delete(&routes::comment(recipe_id, &comment_id), Some(&bob))
        .await;
    assert_eq!(gone.status, 404);

    let recipe = app.get(&routes::recipe(recipe_id), None).await;
    assert_eq!(recipe.status, 200);
}

#[tokio::test]
async fn comment_paging_tolerates_bad_and_huge_pages() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice").await;
    let bob = app.create_authenticated_user("bob").await;
    let recipe = app.create_recipe(&alice, "Pancakes", &[]).await;
    let recipe_id = recipe["id"].as_str().unwrap();
    post_comment(&app, recipe_id, "From bob", &bob).await;

    let lenient = format!("{}?comments-page=x&comments-limit=-1", routes::comments(recipe_id));
    let res = app.get(&lenient, None).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["comments"]["otherComments"].as_array().unwrap().len(), 1);

    let huge = format!("{}?comments-page={}", routes::comments(recipe_id), u64::MAX);
    let res = app.get(&huge, None).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert!(res.body["comments"]["otherComments"].as_array().unwrap().is_empty());
}
