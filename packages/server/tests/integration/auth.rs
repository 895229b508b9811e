use serde_json::json;

use crate::common::{TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_can_register() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::REGISTER,
                &json!({"name": "alice", "email": "Alice@Example.com", "password": "pw"}),
                None,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["id"].is_string());
        assert_eq!(res.body["email"], "alice@example.com");
        assert_eq!(res.body["isAdmin"], false);
        assert!(res.body.get("password").is_none());
    }

    #[tokio::test]
    async fn cannot_register_the_same_email_twice() {
        let app = TestApp::spawn().await;
        let body = json!({"name": "alice", "email": "alice@example.com", "password": "pw"});

        let first = app.post(routes::REGISTER, &body, None).await;
        assert_eq!(first.status, 201, "First registration failed: {}", first.text);

        let res = app.post(routes::REGISTER, &body, None).await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post(routes::REGISTER, &json!({"name": "alice", "email": "a@b.c"}), None)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn login_returns_an_access_token() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app.get(routes::CURRENT, Some(&token)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "alice");
        assert_eq!(res.body["unreadMessages"], 0);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("alice").await;

        let res = app
            .post(
                routes::LOGIN,
                &json!({"email": "alice@example.com", "password": "nope"}),
                None,
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_email_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::LOGIN,
                &json!({"email": "ghost@example.com", "password": "pw"}),
                None,
            )
            .await;

        assert_eq!(res.status, 401);
    }
}

mod refresh_and_logout {
    use super::*;

    #[tokio::test]
    async fn refresh_without_cookie_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.post(routes::REFRESH, &json!({}), None).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn refresh_cookie_issues_a_new_access_token() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("alice").await;

        let res = app.post(routes::REFRESH, &json!({}), None).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let token = res.body["accessToken"].as_str().unwrap();
        let me = app.get(routes::CURRENT, Some(token)).await;
        assert_eq!(me.status, 200);
    }

    #[tokio::test]
    async fn logout_revokes_the_refresh_token() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("alice").await;

        let res = app.post(routes::LOGOUT, &json!({}), None).await;
        assert_eq!(res.status, 200);

        let again = app.post(routes::LOGOUT, &json!({}), None).await;
        assert_eq!(again.status, 204);

        let refresh = app.post(routes::REFRESH, &json!({}), None).await;
        assert_eq!(refresh.status, 401);
    }
}

mod authenticated_access {
    use super::*;

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::CURRENT, None).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::CURRENT, Some("not-a-jwt")).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}
