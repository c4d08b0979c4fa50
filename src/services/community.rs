use crate::{
    error::{AppError, Result},
    models::community::{Community, UpsertCommunityRequest},
    services::Database,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

#[derive(Clone)]
pub struct CommunityService {
    db: Arc<Database>,
}

impl CommunityService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    pub async fn get_community(&self, community_id: &str) -> Result<Option<Community>> {
        self.db.get_by_id("community", community_id).await
    }

    pub async fn list_communities(&self, page: usize, limit: usize) -> Result<Vec<Community>> {
        debug!("Listing communities: page {} limit {}", page, limit);

        if limit == 0 {
            return Err(AppError::validation("Page size must be greater than zero"));
        }
        let page = page.max(1);
        let offset = (page - 1) * limit;

        let mut response = self
            .db
            .query_with_params(
                "SELECT *, meta::id(id) AS id FROM community \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
                json!({ "limit": limit, "offset": offset }),
            )
            .await?;
        Ok(response.take(0)?)
    }

    /// Mirror a community from the identity provider's organization
    /// data. The id is the provider's organization id.
    pub async fn upsert_community(
        &self,
        actor_id: &str,
        community_id: &str,
        request: UpsertCommunityRequest,
    ) -> Result<Community> {
        debug!("Upserting community: {}", community_id);

        request.validate().map_err(|e| AppError::ValidatorError(e))?;

        // Handles are unique across communities
        if let Some(existing) = self
            .db
            .find_one::<Community>("community", "username", &request.username)
            .await?
        {
            if existing.id != community_id {
                return Err(AppError::conflict("Community handle is already taken"));
            }
        }

        let community = match self.db.get_by_id::<Community>("community", community_id).await? {
            Some(mut community) => {
                community.username = request.username;
                community.name = request.name;
                community.bio = request.bio;
                community.image_url = request.image_url;
                community.updated_at = Utc::now();
                community
            }
            None => {
                let mut community = Community::new(
                    community_id.to_string(),
                    request.username,
                    request.name,
                    actor_id.to_string(),
                );
                community.bio = request.bio;
                community.image_url = request.image_url;
                community
            }
        };

        let updated = self.db.upsert("community", community_id, community).await?;

        info!("Upserted community: {}", community_id);
        Ok(updated)
    }
}
