pub mod auth;
pub mod comment;
pub mod recipe;
pub mod shared;
pub mod tag;
pub mod user;
