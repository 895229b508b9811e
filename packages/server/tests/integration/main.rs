mod common;

mod auth;
mod comments;
mod current;
mod tags;
