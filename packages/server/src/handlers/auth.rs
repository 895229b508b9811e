use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::entity::user;
use crate::error::{AppError, conflict_on_unique};
use crate::extractors::json::AppJson;
use crate::models::auth::{LoginRequest, RegisterRequest, TokenResponse};
use crate::models::user::UserResponse;
use crate::state::AppState;
use crate::utils::{hash, jwt};

/// Name of the HttpOnly cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "jwt";

const EMAIL_TAKEN: &str = "This email is already registered";

fn refresh_cookie(token: String, auth: &AuthConfig) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token))
        .http_only(true)
        .secure(auth.secure_cookie)
        .same_site(if auth.secure_cookie {
            SameSite::None
        } else {
            SameSite::Lax
        })
        .path("/")
        .build()
}

fn expired_cookie() -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, "")).path("/").build()
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = payload.validate()?;

    let taken = user::Entity::find()
        .filter(user::Column::Email.eq(account.email.as_str()))
        .one(&state.db)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict(EMAIL_TAKEN.into()));
    }

    let hash = hash::hash_password(account.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let new_user = user::ActiveModel {
        id: Set(Uuid::now_v7()),
        name: Set(account.name.to_string()),
        email: Set(account.email.clone()),
        password: Set(hash),
        avatar_url: Set(None),
        is_admin: Set(false),
        refresh_token: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let user = new_user
        .insert(&state.db)
        .await
        .map_err(|e| conflict_on_unique(e, EMAIL_TAKEN))?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(UserResponse::new(user, &state.config.storage.public_url)),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    let (email, password) = payload.validate()?;

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let valid = hash::verify_password(password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !valid {
        return Err(AppError::InvalidCredentials);
    }

    let auth = &state.config.auth;
    let access_token = jwt::sign_access(user.id, user.is_admin, &auth.access_secret, auth.access_ttl)
        .map_err(|e| AppError::Internal(format!("Token signing error: {e}")))?;
    let refresh_token = jwt::sign_refresh(user.id, &auth.refresh_secret, auth.refresh_ttl)
        .map_err(|e| AppError::Internal(format!("Token signing error: {e}")))?;

    let user_id = user.id;
    let mut active: user::ActiveModel = user.into();
    active.refresh_token = Set(Some(refresh_token.clone()));
    active.update(&state.db).await?;

    tracing::info!(user_id = %user_id, "User logged in");
    Ok((
        jar.add(refresh_cookie(refresh_token, auth)),
        Json(TokenResponse { access_token }),
    ))
}

#[instrument(skip(state, jar))]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<TokenResponse>, AppError> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(AppError::TokenMissing)?;

    let user = user::Entity::find()
        .filter(user::Column::RefreshToken.eq(token.as_str()))
        .one(&state.db)
        .await?
        .ok_or(AppError::PermissionDenied)?;

    let auth = &state.config.auth;
    let claims =
        jwt::verify_refresh(&token, &auth.refresh_secret).map_err(|_| AppError::PermissionDenied)?;
    if claims.uid != user.id {
        return Err(AppError::PermissionDenied);
    }

    let access_token = jwt::sign_access(user.id, user.is_admin, &auth.access_secret, auth.access_ttl)
        .map_err(|e| AppError::Internal(format!("Token signing error: {e}")))?;
    Ok(Json(TokenResponse { access_token }))
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), AppError> {
    let Some(token) = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
    else {
        return Ok((jar, StatusCode::NO_CONTENT));
    };

    let user = user::Entity::find()
        .filter(user::Column::RefreshToken.eq(token.as_str()))
        .one(&state.db)
        .await?;
    let jar = jar.remove(expired_cookie());

    let Some(user) = user else {
        return Ok((jar, StatusCode::NO_CONTENT));
    };

    let mut active: user::ActiveModel = user.into();
    active.refresh_token = Set(None);
    active.update(&state.db).await?;

    Ok((jar, StatusCode::OK))
}
