use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::*;
use crate::core::errors::{ApiError, StoreError};
use crate::core::helpers::{sanitize_text, validate_email};
use crate::models::AccountPatch;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<AccountPatch, ApiError> {
        let username = match self.username {
            Some(username) => {
                let username = sanitize_text(username.trim());
                if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&username.chars().count()) {
                    return Err(ApiError::BadRequest("Username must be 3-50 characters".to_string()));
                }
                Some(username)
            }
            None => None,
        };

        let email = match self.email {
            Some(email) => {
                let email = email.trim().to_string();
                if !validate_email(&email) {
                    return Err(ApiError::BadRequest("Email is invalid".to_string()));
                }
                Some(email)
            }
            None => None,
        };

        if let Some(password) = &self.password {
            if password.len() < MIN_PASSWORD_LENGTH {
                return Err(ApiError::BadRequest("Password is required".to_string()));
            }
        }

        let display_name = match self.display_name {
            Some(name) => {
                let name = sanitize_text(name.trim());
                if name.is_empty() || name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
                    return Err(ApiError::BadRequest("Display name must be 1-50 characters".to_string()));
                }
                Some(name)
            }
            None => None,
        };

        let bio = match self.bio {
            Some(bio) => {
                if bio.chars().count() > MAX_BIO_LENGTH {
                    return Err(ApiError::BadRequest("Bio too long (max 500 chars)".to_string()));
                }
                Some(sanitize_text(&bio))
            }
            None => None,
        };

        Ok(AccountPatch {
            username,
            email,
            password: self.password,
            display_name,
            bio,
            avatar: self.avatar,
            birth_date: self.birth_date,
        })
    }
}

// === HTTP Handlers ===

pub async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let users = state.accounts.get_all().await?;

    Ok(HttpResponse::Ok().json(users))
}

pub async fn get_user_details(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    match state.accounts.get_by_id(path.into_inner()).await {
        Ok(user) => Ok(HttpResponse::Ok().json(user)),
        Err(StoreError::NotFound(_)) => {
            Ok(HttpResponse::BadRequest().json(serde_json::json!({ "message": "User not found" })))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn update_profile(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    let patch = body.into_inner().validate()?;

    if patch.is_empty() {
        // Still report unknown ids.
        state.accounts.get_by_id(user_id).await?;
    } else {
        state.accounts.update(user_id, patch).await?;
        tracing::info!(%user_id, "profile updated");
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({})))
}

pub async fn delete_user(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    state.accounts.delete(user_id).await?;
    tracing::info!(%user_id, "user deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({})))
}
