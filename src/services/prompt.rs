use crate::{
    error::{AppError, Result},
    models::{
        community::Community,
        prompt::{
            AuthorInfo, CommunityInfo, CreateCommentRequest, CreatePromptRequest, Prompt,
            PromptFeed, PromptReply, PromptResponse,
        },
        user::User,
    },
    services::{Database, RevalidationService},
};
use chrono::Utc;
use serde_json::json;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;

/// The prompt tree store. `parent_id` is the single source of truth for
/// the reply tree; a prompt's replies are always derived by query. The
/// `prompts` back-indexes on users and communities are maintained here:
/// appended on create, pruned on cascading delete.
#[derive(Clone)]
pub struct PromptService {
    db: Arc<Database>,
    revalidation: RevalidationService,
}

impl PromptService {
    pub async fn new(db: Arc<Database>, revalidation: RevalidationService) -> Result<Self> {
        Ok(Self { db, revalidation })
    }

    /// Paginated feed of top-level prompts, newest first.
    pub async fn fetch_prompts(&self, page: usize, limit: usize) -> Result<PromptFeed> {
        debug!("Fetching prompt feed: page {} limit {}", page, limit);

        if limit == 0 {
            return Err(AppError::validation("Page size must be greater than zero"));
        }
        let page = page.max(1);
        let offset = (page - 1) * limit;

        let mut response = self
            .db
            .query_with_params(
                "SELECT *, meta::id(id) AS id FROM prompt \
                 WHERE parent_id IS NONE OR parent_id IS NULL \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
                json!({ "limit": limit, "offset": offset }),
            )
            .await?;
        let prompts: Vec<Prompt> = response.take(0)?;

        let mut count_response = self
            .db
            .query(
                "SELECT count() AS total FROM prompt \
                 WHERE parent_id IS NONE OR parent_id IS NULL GROUP ALL",
            )
            .await?;
        let total: Option<i64> = count_response.take((0, "total"))?;
        let total = total.unwrap_or(0) as usize;

        let returned = prompts.len();
        let prompts = self.resolve_prompts(prompts).await?;

        Ok(PromptFeed {
            prompts,
            total,
            page,
            per_page: limit,
            is_next: has_next_page(total, offset, returned),
        })
    }

    /// Top-level prompts authored by a user (the profile "Prompts" tab).
    pub async fn fetch_user_prompts(&self, user_id: &str) -> Result<Vec<PromptResponse>> {
        debug!("Fetching prompts for user: {}", user_id);

        let mut response = self
            .db
            .query_with_params(
                "SELECT *, meta::id(id) AS id FROM prompt \
                 WHERE author_id = $author AND (parent_id IS NONE OR parent_id IS NULL) \
                 ORDER BY created_at DESC",
                json!({ "author": user_id }),
            )
            .await?;
        let prompts: Vec<Prompt> = response.take(0)?;

        self.resolve_prompts(prompts).await
    }

    /// Top-level prompts posted to a community.
    pub async fn fetch_community_prompts(&self, community_id: &str) -> Result<Vec<PromptResponse>> {
        debug!("Fetching prompts for community: {}", community_id);

        let mut response = self
            .db
            .query_with_params(
                "SELECT *, meta::id(id) AS id FROM prompt \
                 WHERE community_id = $community AND (parent_id IS NONE OR parent_id IS NULL) \
                 ORDER BY created_at DESC",
                json!({ "community": community_id }),
            )
            .await?;
        let prompts: Vec<Prompt> = response.take(0)?;

        self.resolve_prompts(prompts).await
    }

    /// Create a new top-level prompt and index it on its owner(s).
    pub async fn create_prompt(
        &self,
        author_id: &str,
        request: CreatePromptRequest,
    ) -> Result<Prompt> {
        debug!("Creating prompt for user: {}", author_id);

        request.validate().map_err(|e| AppError::ValidatorError(e))?;

        let community = match request.community_id.as_deref() {
            Some(community_id) => {
                let community: Option<Community> =
                    self.db.get_by_id("community", community_id).await?;
                if community.is_none() {
                    // The identity provider can hand out an organization id
                    // that was never mirrored here; the prompt is still
                    // created, just without a community.
                    warn!(
                        "Community {} not found, creating prompt without community",
                        community_id
                    );
                }
                community
            }
            None => None,
        };

        let mut prompt = Prompt::new(request.text, author_id.to_string());
        prompt.code = request.code;
        prompt.image_url = request.image_url;
        prompt.community_id = community.as_ref().map(|c| c.id.clone());

        let prompt_id = prompt.id.clone();
        let created = self.db.create("prompt", &prompt_id, prompt).await?;

        // Append to the author's back-index. A missing profile is a no-op.
        self.db
            .execute(
                "UPDATE user SET prompts += $prompt, updated_at = $now \
                 WHERE meta::id(id) = $user",
                json!({ "user": author_id, "prompt": created.id, "now": Utc::now() }),
            )
            .await?;

        if let Some(community) = &community {
            self.db
                .execute(
                    "UPDATE community SET prompts += $prompt, updated_at = $now \
                     WHERE meta::id(id) = $community",
                    json!({ "community": community.id, "prompt": created.id, "now": Utc::now() }),
                )
                .await?;
        }

        if let Some(path) = request.path.as_deref() {
            self.revalidation.revalidate(path);
        }

        info!("Created prompt: {} by user: {}", created.id, author_id);
        Ok(created)
    }

    /// Detail view: the prompt with author, community, and replies two
    /// levels deep. Anything deeper is fetched by the caller recursing
    /// into a reply's own detail view.
    pub async fn fetch_prompt_by_id(&self, prompt_id: &str) -> Result<PromptResponse> {
        debug!("Fetching prompt by ID: {}", prompt_id);

        let prompt: Prompt = self
            .db
            .get_by_id("prompt", prompt_id)
            .await?
            .ok_or_else(|| AppError::not_found("Prompt"))?;

        let replies = self.children_of(&prompt.id).await?;
        let reply_ids: Vec<String> = replies.iter().map(|reply| reply.id.clone()).collect();
        let nested = self.children_of_many(&reply_ids).await?;

        let mut author_ids = BTreeSet::new();
        author_ids.insert(prompt.author_id.clone());
        for reply in replies.iter().chain(nested.iter()) {
            author_ids.insert(reply.author_id.clone());
        }
        let authors = self.load_authors(&author_ids).await?;

        let community = match prompt.community_id.as_deref() {
            Some(community_id) => self
                .db
                .get_by_id::<Community>("community", community_id)
                .await?
                .map(|community| CommunityInfo::from(&community)),
            None => None,
        };

        let mut nested_map: HashMap<String, Vec<Prompt>> = HashMap::new();
        for reply in nested {
            if let Some(parent_id) = reply.parent_id.clone() {
                nested_map.entry(parent_id).or_default().push(reply);
            }
        }

        let replies = replies
            .into_iter()
            .map(|reply| {
                let nested_replies = nested_map
                    .remove(&reply.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|nested_reply| PromptReply {
                        author: author_info(&authors, &nested_reply.author_id),
                        prompt: nested_reply,
                        replies: Vec::new(),
                    })
                    .collect();

                PromptReply {
                    author: author_info(&authors, &reply.author_id),
                    prompt: reply,
                    replies: nested_replies,
                }
            })
            .collect();

        let author = author_info(&authors, &prompt.author_id);

        Ok(PromptResponse {
            prompt,
            author,
            community,
            replies,
        })
    }

    /// Delete a prompt and every transitive reply, then prune the
    /// back-indexes of every referenced user and community.
    pub async fn delete_prompt(&self, prompt_id: &str, path: Option<&str>) -> Result<()> {
        debug!("Deleting prompt tree rooted at: {}", prompt_id);

        let target: Prompt = self
            .db
            .get_by_id("prompt", prompt_id)
            .await?
            .ok_or_else(|| AppError::not_found("Prompt"))?;

        // Walk the reply tree with an explicit work queue. Descendants
        // are discovered by parent_id equality, one query per node, so
        // arbitrarily deep reply chains cannot overflow the stack.
        let mut descendants: Vec<Prompt> = Vec::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        queue.push_back(target.id.clone());

        while let Some(current) = queue.pop_front() {
            let children = self.children_of(&current).await?;
            for child in children {
                queue.push_back(child.id.clone());
                descendants.push(child);
            }
        }

        let mut deleted_ids: Vec<String> = Vec::with_capacity(descendants.len() + 1);
        deleted_ids.push(target.id.clone());
        deleted_ids.extend(descendants.iter().map(|prompt| prompt.id.clone()));

        let (author_ids, community_ids) = collect_owner_ids(&target, &descendants);

        // Remove the whole subtree in one operation, then prune the
        // back-indexes. The steps are not atomic; a failure surfaces
        // immediately and nothing is rolled back.
        self.db
            .execute(
                "DELETE prompt WHERE meta::id(id) IN $ids",
                json!({ "ids": deleted_ids }),
            )
            .await?;

        if !author_ids.is_empty() {
            self.db
                .execute(
                    "UPDATE user SET prompts = array::complement(prompts, $ids), updated_at = $now \
                     WHERE meta::id(id) IN $owners",
                    json!({ "ids": deleted_ids, "owners": author_ids, "now": Utc::now() }),
                )
                .await?;
        }

        if !community_ids.is_empty() {
            self.db
                .execute(
                    "UPDATE community SET prompts = array::complement(prompts, $ids), updated_at = $now \
                     WHERE meta::id(id) IN $communities",
                    json!({ "ids": deleted_ids, "communities": community_ids, "now": Utc::now() }),
                )
                .await?;
        }

        if let Some(path) = path {
            self.revalidation.revalidate(path);
        }

        info!(
            "Deleted prompt {} and {} descendant(s)",
            target.id,
            descendants.len()
        );
        Ok(())
    }

    /// Reply to an existing prompt.
    pub async fn add_comment(
        &self,
        parent_id: &str,
        author_id: &str,
        request: CreateCommentRequest,
    ) -> Result<Prompt> {
        debug!("Adding comment to prompt: {}", parent_id);

        request.validate().map_err(|e| AppError::ValidatorError(e))?;

        let parent: Prompt = self
            .db
            .get_by_id("prompt", parent_id)
            .await?
            .ok_or_else(|| AppError::not_found("Prompt"))?;

        let mut comment = Prompt::new(request.text, author_id.to_string());
        comment.code = request.code;
        comment.parent_id = Some(parent.id.clone());

        let comment_id = comment.id.clone();
        let created = self.db.create("prompt", &comment_id, comment).await?;

        // The parent's replies are derived from parent_id, so the new
        // comment is visible without touching the parent record.

        if let Some(path) = request.path.as_deref() {
            self.revalidation.revalidate(path);
        }

        info!("Added comment {} to prompt {}", created.id, parent.id);
        Ok(created)
    }

    // Helper methods

    async fn children_of(&self, parent_id: &str) -> Result<Vec<Prompt>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT *, meta::id(id) AS id FROM prompt \
                 WHERE parent_id = $parent ORDER BY created_at ASC",
                json!({ "parent": parent_id }),
            )
            .await?;
        Ok(response.take(0)?)
    }

    async fn children_of_many(&self, parent_ids: &[String]) -> Result<Vec<Prompt>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut response = self
            .db
            .query_with_params(
                "SELECT *, meta::id(id) AS id FROM prompt \
                 WHERE parent_id IN $parents ORDER BY created_at ASC",
                json!({ "parents": parent_ids }),
            )
            .await?;
        Ok(response.take(0)?)
    }

    async fn load_authors(&self, ids: &BTreeSet<String>) -> Result<HashMap<String, AuthorInfo>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut response = self
            .db
            .query_with_params(
                "SELECT *, meta::id(id) AS id FROM user WHERE meta::id(id) IN $ids",
                json!({ "ids": ids }),
            )
            .await?;
        let users: Vec<User> = response.take(0)?;

        Ok(users
            .iter()
            .map(|user| (user.id.clone(), AuthorInfo::from(user)))
            .collect())
    }

    async fn load_communities(
        &self,
        ids: &BTreeSet<String>,
    ) -> Result<HashMap<String, CommunityInfo>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut response = self
            .db
            .query_with_params(
                "SELECT *, meta::id(id) AS id FROM community WHERE meta::id(id) IN $ids",
                json!({ "ids": ids }),
            )
            .await?;
        let communities: Vec<Community> = response.take(0)?;

        Ok(communities
            .iter()
            .map(|community| (community.id.clone(), CommunityInfo::from(community)))
            .collect())
    }

    /// Resolve feed items: author, community, and direct replies (each
    /// reply with its author). One batched query per entity kind.
    async fn resolve_prompts(&self, prompts: Vec<Prompt>) -> Result<Vec<PromptResponse>> {
        if prompts.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = prompts.iter().map(|prompt| prompt.id.clone()).collect();
        let children = self.children_of_many(&ids).await?;

        let mut author_ids = BTreeSet::new();
        let mut community_ids = BTreeSet::new();
        for prompt in prompts.iter().chain(children.iter()) {
            author_ids.insert(prompt.author_id.clone());
            if let Some(community_id) = &prompt.community_id {
                community_ids.insert(community_id.clone());
            }
        }

        let authors = self.load_authors(&author_ids).await?;
        let communities = self.load_communities(&community_ids).await?;

        let mut child_map: HashMap<String, Vec<Prompt>> = HashMap::new();
        for child in children {
            if let Some(parent_id) = child.parent_id.clone() {
                child_map.entry(parent_id).or_default().push(child);
            }
        }

        Ok(prompts
            .into_iter()
            .map(|prompt| {
                let replies = child_map
                    .remove(&prompt.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|child| PromptReply {
                        author: author_info(&authors, &child.author_id),
                        prompt: child,
                        replies: Vec::new(),
                    })
                    .collect();

                let author = author_info(&authors, &prompt.author_id);
                let community = prompt
                    .community_id
                    .as_deref()
                    .and_then(|community_id| communities.get(community_id).cloned());

                PromptResponse {
                    prompt,
                    author,
                    community,
                    replies,
                }
            })
            .collect())
    }
}

fn author_info(authors: &HashMap<String, AuthorInfo>, author_id: &str) -> AuthorInfo {
    authors
        .get(author_id)
        .cloned()
        .unwrap_or_else(|| AuthorInfo::unknown(author_id))
}

fn has_next_page(total: usize, offset: usize, returned: usize) -> bool {
    total > offset + returned
}

/// Distinct author and community ids referenced by a prompt tree.
fn collect_owner_ids(target: &Prompt, descendants: &[Prompt]) -> (Vec<String>, Vec<String>) {
    let mut authors = BTreeSet::new();
    let mut communities = BTreeSet::new();

    for prompt in std::iter::once(target).chain(descendants.iter()) {
        authors.insert(prompt.author_id.clone());
        if let Some(community_id) = &prompt.community_id {
            communities.insert(community_id.clone());
        }
    }

    (
        authors.into_iter().collect(),
        communities.into_iter().collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(id: &str, author: &str, community: Option<&str>) -> Prompt {
        let mut prompt = Prompt::new("A prompt worth sharing".to_string(), author.to_string());
        prompt.id = id.to_string();
        prompt.community_id = community.map(str::to_string);
        prompt
    }

    #[test]
    fn test_has_next_page() {
        // 12 top-level prompts, page size 5
        assert!(has_next_page(12, 0, 5)); // page 1
        assert!(has_next_page(12, 5, 5)); // page 2
        assert!(!has_next_page(12, 10, 2)); // page 3, short page
        assert!(!has_next_page(12, 15, 0)); // page 4, past the end
        assert!(!has_next_page(0, 0, 0)); // empty feed
    }

    #[test]
    fn test_collect_owner_ids_deduplicates() {
        let target = prompt("root", "user_a", Some("community_1"));
        let descendants = vec![
            prompt("child-1", "user_b", None),
            prompt("child-2", "user_a", Some("community_1")),
            prompt("grandchild-1", "user_b", Some("community_2")),
        ];

        let (authors, communities) = collect_owner_ids(&target, &descendants);

        assert_eq!(authors, vec!["user_a".to_string(), "user_b".to_string()]);
        assert_eq!(
            communities,
            vec!["community_1".to_string(), "community_2".to_string()]
        );
    }

    #[test]
    fn test_collect_owner_ids_skips_missing_communities() {
        let target = prompt("root", "user_a", None);
        let descendants = vec![prompt("child-1", "user_b", None)];

        let (authors, communities) = collect_owner_ids(&target, &descendants);

        assert_eq!(authors.len(), 2);
        assert!(communities.is_empty());
    }
}
