use anyhow::Result;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims of a short-lived access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub uid: Uuid,   // User ID
    pub admin: bool, // Whether the user is an administrator
    pub exp: usize,  // Expiration timestamp
}

/// Claims of a refresh token. `jti` keeps tokens issued in the same second distinct.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub uid: Uuid,
    pub jti: Uuid,
    pub exp: usize,
}

fn expires_in(ttl_secs: i64) -> usize {
    (Utc::now().timestamp() + ttl_secs).max(0) as usize
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String> {
    let token = encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

fn verify<T: DeserializeOwned>(token: &str, secret: &str) -> Result<T> {
    let token_data = decode::<T>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Sign a new access token for a user.
pub fn sign_access(user_id: Uuid, is_admin: bool, secret: &str, ttl_secs: i64) -> Result<String> {
    sign(
        &AccessClaims {
            uid: user_id,
            admin: is_admin,
            exp: expires_in(ttl_secs),
        },
        secret,
    )
}

/// Verify and decode an access token.
pub fn verify_access(token: &str, secret: &str) -> Result<AccessClaims> {
    verify(token, secret)
}

/// Sign a new refresh token for a user.
pub fn sign_refresh(user_id: Uuid, secret: &str, ttl_secs: i64) -> Result<String> {
    sign(
        &RefreshClaims {
            uid: user_id,
            jti: Uuid::new_v4(),
            exp: expires_in(ttl_secs),
        },
        secret,
    )
}

/// Verify and decode a refresh token.
pub fn verify_refresh(token: &str, secret: &str) -> Result<RefreshClaims> {
    verify(token, secret)
}
