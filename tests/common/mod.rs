#![allow(dead_code)]

use std::sync::Arc;

use actix_web::test::TestRequest;
use actix_web::{web, App};
use argon2::{Algorithm, Argon2, Params, Version};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use usergraph::auth::{jwt_verifier, Claims};
use usergraph::config::Config;
use usergraph::core::store::{AccountStore, MemoryStore};
use usergraph::AppState;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestContext {
    pub state: web::Data<AppState>,
}

impl TestContext {
    pub fn new() -> TestContext {
        let hasher = Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            Params::new(Params::MIN_M_COST, 1, 1, None).expect("valid argon2 params"),
        );
        let accounts: Arc<dyn AccountStore> = Arc::new(MemoryStore::with_hasher(hasher));
        let state = AppState::new(accounts, jwt_verifier(TEST_SECRET, None), Config::with_secret(TEST_SECRET));

        TestContext {
            state: web::Data::new(state),
        }
    }

    pub fn create_app(&self) -> actix_web::App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(self.state.clone())
            .configure(usergraph::routes::configure_routes)
            .default_service(web::route().to(usergraph::routes::not_found))
    }
}

/// Signs a token the way the external issuer would.
pub fn token_for(id: Uuid) -> String {
    signed_token(TEST_SECRET, &id.to_string(), 3600)
}

pub fn signed_token(secret: &str, sub: &str, exp_offset: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: sub.to_string(),
        exp: now + exp_offset,
        iat: now,
        iss: None,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .expect("Failed to sign token")
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub fn register_request(username: &str) -> TestRequest {
    TestRequest::post().uri("/auth/register").set_json(json!({
        "username": username,
        "email": format!("{}@x.com", username),
        "password": "p",
    }))
}

pub fn login_request(email: &str, password: &str) -> TestRequest {
    TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "email": email, "password": password }))
}
