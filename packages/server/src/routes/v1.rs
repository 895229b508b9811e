use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/recipes", recipe_routes())
        .merge(tag_routes())
        .nest("/current", current_routes())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh))
        .route("/logout", post(handlers::auth::logout))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(handlers::user::get_user))
        .route("/{id}/recipes", get(handlers::user::list_user_recipes))
        .route("/{id}/followers", get(handlers::follow::list_user_followers))
        .route("/{id}/following", get(handlers::follow::list_user_following))
        .route("/{id}/private", get(handlers::user::get_private_info))
}

fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::recipe::list_recipes).post(handlers::recipe::create_recipe),
        )
        .route(
            "/{id}",
            get(handlers::recipe::get_recipe)
                .put(handlers::recipe::update_recipe)
                .delete(handlers::recipe::delete_recipe),
        )
        .route(
            "/{id}/comments",
            get(handlers::comment::list_comments).post(handlers::comment::create_comment),
        )
        .route(
            "/{id}/comments/{comment_id}",
            delete(handlers::comment::delete_comment),
        )
        .layer(handlers::upload_body_limit())
}

fn tag_routes() -> Router<AppState> {
    Router::new()
        .route("/tags", get(handlers::tag::list_tags))
        .route("/tag-categories", post(handlers::tag::create_category))
        .route(
            "/tag-categories/{category_id}",
            post(handlers::tag::create_tag)
                .put(handlers::tag::update_category)
                .delete(handlers::tag::delete_category),
        )
        .route(
            "/tag-categories/{category_id}/tags/{tag_id}",
            put(handlers::tag::update_tag).delete(handlers::tag::delete_tag),
        )
}

fn current_routes() -> Router<AppState> {
    let profile = Router::new()
        .route(
            "/",
            get(handlers::current::get_current)
                .put(handlers::current::update_current)
                .delete(handlers::current::delete_current),
        )
        .layer(handlers::upload_body_limit());

    profile
        .route("/recipes", get(handlers::current::list_current_recipes))
        .route("/liked/recipes", get(handlers::reaction::list_liked_recipes))
        .route(
            "/liked/recipes/{recipe_id}",
            get(handlers::reaction::is_liked).post(handlers::reaction::toggle_like),
        )
        .route(
            "/favorite/recipes",
            get(handlers::reaction::list_favorite_recipes),
        )
        .route(
            "/favorite/recipes/{recipe_id}",
            get(handlers::reaction::is_favorite).post(handlers::reaction::toggle_favorite),
        )
        .route(
            "/viewed/recipes/{recipe_id}",
            post(handlers::reaction::add_view),
        )
        .route("/followers", get(handlers::follow::list_current_followers))
        .route("/following", get(handlers::follow::list_current_following))
        .route(
            "/following/{following_id}",
            post(handlers::follow::follow).delete(handlers::follow::unfollow),
        )
}
