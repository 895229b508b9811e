use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use common::StorageConfig;
use common::storage::UploadStore;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use sea_orm::{ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde_json::{Value, json};
use tempfile::TempDir;

use server::config::{AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig};
use server::entity::user;
use server::state::AppState;

pub mod routes {
    pub const REGISTER: &str = "/api/auth/register";
    pub const LOGIN: &str = "/api/auth/login";
    pub const REFRESH: &str = "/api/auth/refresh";
    pub const LOGOUT: &str = "/api/auth/logout";
    pub const CURRENT: &str = "/api/current";
    pub const RECIPES: &str = "/api/recipes";
    pub const TAGS: &str = "/api/tags";
    pub const TAG_CATEGORIES: &str = "/api/tag-categories";

    pub fn recipe(id: &str) -> String {
        format!("/api/recipes/{id}")
    }

    pub fn comments(recipe_id: &str) -> String {
        format!("/api/recipes/{recipe_id}/comments")
    }

    pub fn comment(recipe_id: &str, comment_id: &str) -> String {
        format!("/api/recipes/{recipe_id}/comments/{comment_id}")
    }

    pub fn tag_category(id: &str) -> String {
        format!("/api/tag-categories/{id}")
    }

    pub fn tag(category_id: &str, tag_id: &str) -> String {
        format!("/api/tag-categories/{category_id}/tags/{tag_id}")
    }

    pub fn user(id: &str) -> String {
        format!("/api/users/{id}")
    }

    pub fn liked(recipe_id: &str) -> String {
        format!("/api/current/liked/recipes/{recipe_id}")
    }

    pub fn following(user_id: &str) -> String {
        format!("/api/current/following/{user_id}")
    }
}

/// A running test server backed by SQLite and a scratch upload directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub uploads: PathBuf,
    _dirs: (TempDir, TempDir),
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

/// One part of a multipart request.
#[derive(Clone, Copy)]
pub enum FormPart<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

impl TestApp {
    pub async fn spawn() -> Self {
        let db_dir = tempfile::tempdir().expect("Failed to create database dir");
        let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");

        let db_url = format!(
            "sqlite://{}?mode=rwc",
            db_dir.path().join("recipes.db").display()
        );
        let db = Database::connect(db_url.as_str())
            .await
            .expect("Failed to open test database");
        server::database::sync_schema(&db)
            .await
            .expect("Failed to create schema");
        server::seed::seed_tag_categories(&db)
            .await
            .expect("Failed to seed tags");

        let storage = StorageConfig {
            upload_dir: upload_dir.path().display().to_string(),
            public_url: "http://uploads.test".to_string(),
            max_file_size: 1024 * 1024,
        };
        let uploads = UploadStore::new(upload_dir.path().to_path_buf(), storage.max_file_size)
            .await
            .expect("Failed to prepare upload store");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig { url: db_url },
            auth: AuthConfig {
                access_secret: "test-access-secret".to_string(),
                refresh_secret: "test-refresh-secret".to_string(),
                access_ttl: 600,
                refresh_ttl: 3600,
                secure_cookie: false,
            },
            storage,
        };

        let state = AppState {
            db: db.clone(),
            config: Arc::new(app_config),
            uploads: Arc::new(uploads),
        };
        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::builder()
                .cookie_store(true)
                .build()
                .expect("Failed to build client"),
            db,
            uploads: upload_dir.path().to_path_buf(),
            _dirs: (db_dir, upload_dir),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let req = self.client.request(method, self.url(path));
        match token {
            Some(token) => req.header("Authorization", format!("Bearer {token}")),
            None => req,
        }
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        let res = self
            .request(reqwest::Method::GET, path, token)
            .send()
            .await
            .expect("Failed to send GET request");
        TestResponse::from_response(res).await
    }

    pub async fn post(&self, path: &str, body: &Value, token: Option<&str>) -> TestResponse {
        let res = self
            .request(reqwest::Method::POST, path, token)
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");
        TestResponse::from_response(res).await
    }

    pub async fn put(&self, path: &str, body: &Value, token: Option<&str>) -> TestResponse {
        let res = self
            .request(reqwest::Method::PUT, path, token)
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");
        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        let res = self
            .request(reqwest::Method::DELETE, path, token)
            .send()
            .await
            .expect("Failed to send DELETE request");
        TestResponse::from_response(res).await
    }

    pub async fn delete_json(&self, path: &str, body: &Value, token: Option<&str>) -> TestResponse {
        let res = self
            .request(reqwest::Method::DELETE, path, token)
            .json(body)
            .send()
            .await
            .expect("Failed to send DELETE request");
        TestResponse::from_response(res).await
    }

    pub async fn multipart(
        &self,
        method: reqwest::Method,
        path: &str,
        parts: &[FormPart<'_>],
        token: &str,
    ) -> TestResponse {
        let mut form = Form::new();
        for part in parts {
            form = match *part {
                FormPart::Text(name, value) => form.text(name.to_string(), value.to_string()),
                FormPart::File(name, file_name, bytes) => form.part(
                    name.to_string(),
                    Part::bytes(bytes.to_vec())
                        .file_name(file_name.to_string())
                        .mime_str("image/png")
                        .expect("Failed to set MIME type"),
                ),
            };
        }

        let res = self
            .request(method, path, Some(token))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");
        TestResponse::from_response(res).await
    }

    /// Register a user and log in, returning the access token.
    pub async fn create_authenticated_user(&self, name: &str) -> String {
        let body = json!({
            "name": name,
            "email": format!("{name}@example.com"),
            "password": "securepass",
        });

        let reg = self.post(routes::REGISTER, &body, None).await;
        assert_eq!(reg.status, 201, "Registration failed: {}", reg.text);

        self.login(name).await
    }

    pub async fn login(&self, name: &str) -> String {
        let res = self
            .post(
                routes::LOGIN,
                &json!({"email": format!("{name}@example.com"), "password": "securepass"}),
                None,
            )
            .await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);

        res.body["accessToken"]
            .as_str()
            .expect("Login response should contain an access token")
            .to_string()
    }

    /// Register a user, grant admin, then log in so the token carries the flag.
    pub async fn create_admin(&self, name: &str) -> String {
        self.create_authenticated_user(name).await;

        let db_user = user::Entity::find()
            .filter(user::Column::Email.eq(format!("{name}@example.com")))
            .one(&self.db)
            .await
            .expect("DB query failed")
            .expect("User not found after registration");

        let mut active: user::ActiveModel = db_user.into();
        active.is_admin = Set(true);
        user::Entity::update(active)
            .exec(&self.db)
            .await
            .expect("Failed to grant admin");

        self.login(name).await
    }

    /// Create a recipe through the API and return its response body.
    pub async fn create_recipe(&self, token: &str, title: &str, files: &[FormPart<'_>]) -> Value {
        let mut parts = vec![
            FormPart::Text("title", title),
            FormPart::Text("text", "Mix and bake."),
            FormPart::Text("ingredients", "flour, eggs"),
        ];
        parts.extend_from_slice(files);

        let res = self
            .multipart(reqwest::Method::POST, routes::RECIPES, &parts, token)
            .await;
        assert_eq!(res.status, 201, "create_recipe failed: {}", res.text);
        res.body
    }

    /// Names of the files currently stored in an upload folder.
    pub fn stored_files(&self, folder: &str) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.uploads.join(folder))
            .expect("Upload folder should exist")
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Location on disk of a file referenced by a public URL.
    pub fn file_for_url(&self, url: &str) -> PathBuf {
        let mut segments = url.rsplit('/');
        let name = segments.next().expect("URL should have a file name");
        let folder = segments.next().expect("URL should have a folder");
        self.uploads.join(folder).join(name)
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> String {
        self.body["id"]
            .as_str()
            .expect("response body should contain 'id'")
            .to_string()
    }
}
