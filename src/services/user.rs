use crate::{
    error::{AppError, Result},
    models::user::{UpsertUserRequest, User},
    services::Database,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

#[derive(Clone)]
pub struct UserService {
    db: Arc<Database>,
}

impl UserService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.db.get_by_id("user", user_id).await
    }

    /// Create or update a profile during onboarding. The id comes from
    /// the identity provider and is never minted here.
    pub async fn upsert_user(&self, user_id: &str, request: UpsertUserRequest) -> Result<User> {
        debug!("Upserting profile for user: {}", user_id);

        request.validate().map_err(|e| AppError::ValidatorError(e))?;

        // Usernames are unique across profiles
        if let Some(existing) = self
            .db
            .find_one::<User>("user", "username", &request.username)
            .await?
        {
            if existing.id != user_id {
                return Err(AppError::conflict("Username is already taken"));
            }
        }

        let user = match self.db.get_by_id::<User>("user", user_id).await? {
            Some(mut user) => {
                user.username = request.username;
                user.name = request.name;
                user.bio = request.bio;
                user.image_url = request.image_url;
                user.onboarded = true;
                user.updated_at = Utc::now();
                user
            }
            None => {
                let mut user = User::new(user_id.to_string(), request.username, request.name);
                user.bio = request.bio;
                user.image_url = request.image_url;
                user.onboarded = true;
                user
            }
        };

        let updated = self.db.upsert("user", user_id, user).await?;

        info!("Upserted profile for user: {}", user_id);
        Ok(updated)
    }
}
