//! User administration client methods

use super::{ApiClient, ApiRequest, ClientError};
use crate::types::{NewUser, PageRequest, Paginated, UserProfile, UserUpdate};

impl ApiClient {
    pub async fn list_users(&self, page: PageRequest) -> Result<Paginated<UserProfile>, ClientError> {
        let request = ApiRequest::get("/users").query_pairs(page.query());
        self.execute(request).await
    }

    pub async fn get_user(&self, id: &str) -> Result<UserProfile, ClientError> {
        self.execute(ApiRequest::get("/users").segment(id)).await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<UserProfile, ClientError> {
        self.execute(ApiRequest::post("/users").json(user)?).await
    }

    pub async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<UserProfile, ClientError> {
        self.execute(ApiRequest::patch("/users").segment(id).json(update)?)
            .await
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), ClientError> {
        self.execute_empty(ApiRequest::delete("/users").segment(id))
            .await
    }

    pub async fn add_favorite(&self, user_id: &str, track_id: &str) -> Result<(), ClientError> {
        self.execute_empty(favorite(ApiRequest::post("/users"), user_id, track_id))
            .await
    }

    pub async fn remove_favorite(&self, user_id: &str, track_id: &str) -> Result<(), ClientError> {
        self.execute_empty(favorite(ApiRequest::delete("/users"), user_id, track_id))
            .await
    }
}

/// `/users/{user_id}/favorites/{track_id}`
fn favorite(request: ApiRequest, user_id: &str, track_id: &str) -> ApiRequest {
    request.segment(user_id).segment("favorites").segment(track_id)
}
