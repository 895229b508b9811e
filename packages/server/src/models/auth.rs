use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::shared::non_blank;

/// Request body for user registration. Every field is required.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub struct NewAccount<'a> {
    pub name: &'a str,
    pub email: String,
    pub password: &'a str,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<NewAccount<'_>, AppError> {
        match (
            non_blank(&self.name),
            non_blank(&self.email),
            self.password.as_deref().filter(|p| !p.is_empty()),
        ) {
            (Some(name), Some(email), Some(password)) => Ok(NewAccount {
                name,
                email: email.to_lowercase(),
                password,
            }),
            _ => Err(AppError::all_fields_required()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(String, &str), AppError> {
        match (
            non_blank(&self.email),
            self.password.as_deref().filter(|p| !p.is_empty()),
        ) {
            (Some(email), Some(password)) => Ok((email.to_lowercase(), password)),
            _ => Err(AppError::all_fields_required()),
        }
    }
}

/// Successful login or refresh response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}
