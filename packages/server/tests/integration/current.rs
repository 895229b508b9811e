use reqwest::Method;
use serde_json::json;

use crate::common::{FormPart, TestApp, routes};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\navatar";

async fn current_id(app: &TestApp, token: &str) -> String {
    app.get(routes::CURRENT, Some(token)).await.id()
}

mod profile {
    use super::*;

    #[tokio::test]
    async fn new_avatar_replaces_old_file() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let first = app
            .multipart(
                Method::PUT,
                routes::CURRENT,
                &[
                    FormPart::Text("name", "Alice"),
                    FormPart::File("avatar", "me.png", PNG),
                ],
                &token,
            )
            .await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.body["name"], "Alice");
        let old_avatar = app.file_for_url(first.body["avatarUrl"].as_str().unwrap());
        assert!(old_avatar.exists());

        let second = app
            .multipart(
                Method::PUT,
                routes::CURRENT,
                &[FormPart::File("avatar", "me2.png", PNG)],
                &token,
            )
            .await;
        assert_eq!(second.status, 200);
        assert_eq!(second.body["name"], "Alice");
        assert!(!old_avatar.exists());
        assert_eq!(app.stored_files("current").len(), 1);
    }

    #[tokio::test]
    async fn two_avatars_are_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .multipart(
                Method::PUT,
                routes::CURRENT,
                &[
                    FormPart::File("avatar", "a.png", PNG),
                    FormPart::File("avatar", "b.png", PNG),
                ],
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(app.stored_files("current").is_empty());
    }

    #[tokio::test]
    async fn public_profile_counts_relationships() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let alice_id = current_id(&app, &alice).await;
        app.create_recipe(&alice, "Pancakes", &[]).await;

        let followed = app.post(&routes::following(&alice_id), &json!({}), Some(&bob)).await;
        assert_eq!(followed.status, 200, "{}", followed.text);

        let res = app.get(&routes::user(&alice_id), None).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["followersCount"], 1);
        assert_eq!(res.body["followingCount"], 0);
        assert_eq!(res.body["recipesCount"], 1);
        assert!(res.body.get("unreadMessages").is_none());

        let private = app
            .get(&format!("{}/private", routes::user(&alice_id)), Some(&bob))
            .await;
        assert_eq!(private.body["isFollowing"], true);
    }
}

mod following {
    use super::*;

    #[tokio::test]
    async fn cannot_follow_yourself() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;
        let id = current_id(&app, &token).await;

        let res = app.post(&routes::following(&id), &json!({}), Some(&token)).await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn follow_twice_then_unfollow() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let alice_id = current_id(&app, &alice).await;

        let first = app.post(&routes::following(&alice_id), &json!({}), Some(&bob)).await;
        assert_eq!(first.status, 200);
        let second = app.post(&routes::following(&alice_id), &json!({}), Some(&bob)).await;
        assert_eq!(second.status, 203);

        let list = app.get("/api/current/following", Some(&bob)).await;
        assert_eq!(list.body["data"][0]["following"]["name"], "alice");

        let removed = app.delete(&routes::following(&alice_id), Some(&bob)).await;
        assert_eq!(removed.status, 200);
        let again = app.delete(&routes::following(&alice_id), Some(&bob)).await;
        assert_eq!(again.status, 203);
    }
}

mod account_deletion {
    use super::*;

    #[tokio::test]
    async fn password_is_required() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app.delete(routes::CURRENT, Some(&token)).await;
        assert_eq!(res.status, 403);

        let wrong = app
            .delete_json(routes::CURRENT, &json!({"password": "nope"}), Some(&token))
            .await;
        assert_eq!(wrong.status, 401);
    }

    #[tokio::test]
    async fn removes_user_content_and_files() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let alice_id = current_id(&app, &alice).await;

        app.multipart(
            Method::PUT,
            routes::CURRENT,
            &[FormPart::File("avatar", "me.png", PNG)],
            &alice,
        )
        .await;
        let recipe = app
            .create_recipe(&alice, "Pancakes", &[FormPart::File("mainImage", "m.png", PNG)])
            .await;
        let bobs = app.create_recipe(&bob, "Waffles", &[]).await;
        let bobs_id = bobs["id"].as_str().unwrap();
        app.multipart(
            Method::POST,
            &routes::comments(bobs_id),
            &[
                FormPart::Text("text", "Nice"),
                FormPart::File("images", "c.png", PNG),
            ],
            &alice,
        )
        .await;
        app.post(&routes::liked(bobs_id), &json!({}), Some(&alice)).await;
        app.post(&routes::following(&alice_id), &json!({}), Some(&bob)).await;

        let res = app
            .delete_json(routes::CURRENT, &json!({"password": "securepass"}), Some(&alice))
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        assert!(app.stored_files("current").is_empty());
        assert!(app.stored_files("recipes").is_empty());

        let gone = app.get(&routes::user(&alice_id), None).await;
        assert_eq!(gone.status, 404);
        let recipe = app.get(&routes::recipe(recipe["id"].as_str().unwrap()), None).await;
        assert_eq!(recipe.status, 404);

        let waffles = app.get(&routes::recipe(bobs_id), None).await;
        assert_eq!(waffles.status, 200);
        assert_eq!(waffles.body["likesCount"], 0);
        let comments = app.get(&routes::comments(bobs_id), None).await;
        assert_eq!(comments.body["meta"]["count"], 0);
    }
}
