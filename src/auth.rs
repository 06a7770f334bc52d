use std::sync::Arc;

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use chrono::NaiveDate;
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{MAX_USERNAME_LENGTH, MIN_PASSWORD_LENGTH, MIN_USERNAME_LENGTH};
use crate::core::errors::{ApiError, StoreError};
use crate::core::helpers::{gravatar_url, sanitize_text, validate_email};
use crate::models::NewAccount;
use crate::AppState;

/// The verified identity of the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
}

/// Turns a bearer token into a `Principal`.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Principal, ApiError>;
}

/// Claims carried by tokens from the external issuer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// HS256 verifier with a shared secret.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Principal, ApiError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected bearer token");
                ApiError::Unauthenticated
            })?
            .claims;

        let id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Unauthenticated)?;
        Ok(Principal { id })
    }
}

impl FromRequest for Principal {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let credentials = BearerAuth::extract(req);

        Box::pin(async move {
            let state = state.ok_or_else(|| ApiError::Internal("app state not configured".to_string()))?;
            let credentials = credentials.await.map_err(|_| ApiError::Unauthenticated)?;
            let principal = state.verifier.verify(credentials.token())?;

            // Tokens outlive deleted accounts.
            match state.accounts.get_by_id(principal.id).await {
                Ok(_) => Ok(principal),
                Err(StoreError::NotFound(_)) => Err(ApiError::Unauthenticated),
                Err(e) => Err(e.into()),
            }
        })
    }
}

// === Request schemas ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

impl RegisterRequest {
    pub fn validate(self, avatar_size: u32) -> Result<NewAccount, ApiError> {
        let username = sanitize_text(self.username.trim());
        if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&username.chars().count()) {
            return Err(ApiError::BadRequest("Username must be 3-50 characters".to_string()));
        }
        let email = self.email.trim().to_string();
        if !validate_email(&email) {
            return Err(ApiError::BadRequest("Email is invalid".to_string()));
        }
        if self.password.len() < MIN_PASSWORD_LENGTH {
            return Err(ApiError::BadRequest("Password is required".to_string()));
        }

        Ok(NewAccount {
            avatar: gravatar_url(&email, avatar_size),
            display_name: username.clone(),
            bio: String::new(),
            username,
            email,
            password: self.password,
            birth_date: self.birth_date,
        })
    }
}

// === HTTP Handlers ===

pub async fn login_user(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let LoginRequest { email, password } = body.into_inner();

    match state.accounts.authenticate(email.trim(), &password).await? {
        Some(account) => {
            tracing::info!(user_id = %account.id, "login succeeded");
            Ok(HttpResponse::Ok().json(account))
        }
        None => {
            tracing::info!("login rejected");
            Ok(HttpResponse::BadRequest()
                .json(serde_json::json!({ "message": "Email or Password is incorrect" })))
        }
    }
}

pub async fn register_user(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let new_account = body.into_inner().validate(state.config.avatar_size)?;
    let account = state.accounts.create(new_account).await?;
    tracing::info!(user_id = %account.id, username = %account.username, "registered");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "registered": true })))
}

/// Shared-secret verifier boxed for `AppState`.
pub fn jwt_verifier(secret: &str, issuer: Option<&str>) -> Arc<dyn TokenVerifier> {
    Arc::new(JwtVerifier::new(secret, issuer))
}
