use actix_web::{web, HttpResponse};

use crate::core::errors::ApiError;
use crate::{auth, follow, users};

/// Mounts every route plus the JSON/path extractor configs that turn shape
/// errors into `ApiError::BadRequest`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    );

    cfg.service(
        web::scope("/auth")
            .route("/login", web::post().to(auth::login_user))
            .route("/register", web::post().to(auth::register_user)),
    );

    cfg.service(
        web::scope("/users")
            .route("", web::get().to(users::list_users))
            .route("/", web::get().to(users::list_users))
            .route("/{id}", web::get().to(users::get_user_details))
            .route("/{id}", web::put().to(users::update_profile))
            .route("/{id}", web::delete().to(users::delete_user))
            .route("/{id}/follow", web::put().to(follow::handle_follow))
            .route("/{id}/unfollow", web::put().to(follow::handle_unfollow))
            .route("/{id}/followers", web::get().to(follow::get_followers_list))
            .route("/{id}/following", web::get().to(follow::get_followings_list)),
    );
}

/// Fallback for unmatched routes.
pub async fn not_found() -> Result<HttpResponse, ApiError> {
    Err(ApiError::NotFound("No route found".to_string()))
}
