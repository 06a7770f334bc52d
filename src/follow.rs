use std::sync::Arc;

use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::auth::Principal;
use crate::core::errors::ApiError;
use crate::core::store::AccountStore;
use crate::models::EdgeChange;
use crate::AppState;

/// Directed follow edges between accounts.
///
/// Both ends of an edge are written by a single `set_edge` call, which the
/// store applies in one critical section.
#[derive(Clone)]
pub struct FollowGraph {
    store: Arc<dyn AccountStore>,
}

impl FollowGraph {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        FollowGraph { store }
    }

    /// Makes `caller_id` follow `target_id`. Following twice is a no-op.
    pub async fn follow(&self, target_id: Uuid, caller_id: Uuid) -> Result<(), ApiError> {
        if target_id == caller_id {
            return Err(ApiError::InvalidOperation("cannot follow self".to_string()));
        }
        self.apply(target_id, caller_id, EdgeChange::Follow).await
    }

    /// Drops the edge if present.
    pub async fn unfollow(&self, target_id: Uuid, caller_id: Uuid) -> Result<(), ApiError> {
        if target_id == caller_id {
            self.store.get_by_id(target_id).await?;
            return Ok(());
        }
        self.apply(target_id, caller_id, EdgeChange::Unfollow).await
    }

    pub async fn get_followers(&self, id: Uuid) -> Result<Vec<Uuid>, ApiError> {
        let account = self.store.get_by_id(id).await?;
        Ok(account.followers.into_iter().collect())
    }

    pub async fn get_following(&self, id: Uuid) -> Result<Vec<Uuid>, ApiError> {
        let account = self.store.get_by_id(id).await?;
        Ok(account.following.into_iter().collect())
    }

    async fn apply(&self, target_id: Uuid, caller_id: Uuid, change: EdgeChange) -> Result<(), ApiError> {
        let changed = self.store.set_edge(caller_id, target_id, change).await?;
        tracing::debug!(%target_id, %caller_id, ?change, changed, "follow edge written");
        Ok(())
    }
}

// === HTTP Handlers ===

pub async fn handle_follow(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let target_id = path.into_inner();
    state.graph.follow(target_id, principal.id).await?;
    tracing::info!(caller = %principal.id, target = %target_id, "followed");

    Ok(HttpResponse::Ok().json(serde_json::json!({})))
}

pub async fn handle_unfollow(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let target_id = path.into_inner();
    state.graph.unfollow(target_id, principal.id).await?;
    tracing::info!(caller = %principal.id, target = %target_id, "unfollowed");

    Ok(HttpResponse::Ok().json(serde_json::json!({})))
}

pub async fn get_followers_list(
    state: web::Data<AppState>,
    _principal: Principal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let followers = state.graph.get_followers(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "followers": followers })))
}

pub async fn get_followings_list(
    state: web::Data<AppState>,
    _principal: Principal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let followed_users = state.graph.get_following(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "followedUsers": followed_users })))
}
