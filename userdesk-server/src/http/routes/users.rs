//! User listing

use std::sync::Arc;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use super::SUCCESS;
use crate::db::User;
use crate::http::{ApiError, AppState};
use crate::ops;

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub status: &'static str,
    pub count: usize,
    pub users: Vec<User>,
}

impl UsersResponse {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            status: SUCCESS,
            count: users.len(),
            users,
        }
    }
}

/// GET /users
async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<UsersResponse>, ApiError> {
    let users = ops::list_users(&state.config.db).await?;
    Ok(Json(UsersResponse::new(users)))
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/users", get(list_users))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_user_list_is_success() {
        let body = serde_json::to_value(UsersResponse::new(Vec::new())).unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["count"], 0);
        assert_eq!(body["users"], serde_json::json!([]));
    }
}
