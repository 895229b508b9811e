mod v1;

use axum::Router;

use crate::state::AppState;

pub fn api_routes() -> Router<AppState> {
    v1::routes()
}
