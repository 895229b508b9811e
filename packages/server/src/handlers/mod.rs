pub mod auth;
pub mod comment;
pub mod current;
pub mod follow;
pub mod reaction;
pub mod recipe;
pub mod tag;
pub mod user;

use axum::extract::DefaultBodyLimit;

/// Body limit for multipart routes: ten gallery images plus a main image.
pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(128 * 1024 * 1024)
}
