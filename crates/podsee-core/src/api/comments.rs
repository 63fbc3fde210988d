//! Supabase (PostgREST) client for centre discussions.
//!
//! Public reads and inserts go through the anon key. Moderation calls need
//! the service key, which bypasses row-level security and so also sees
//! hidden comments.

use std::collections::HashMap;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::{header, Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::ApiError;
use crate::centre_id::is_valid_centre_id;
use crate::content::{sanitize_text, validate_comment};
use crate::models::{Comment, NewComment};

/// Top-level comments fetched per page.
pub const COMMENTS_PAGE_SIZE: usize = 20;

/// Replies shown under a comment before "view more".
pub const REPLY_PREVIEW_SIZE: usize = 2;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Concurrent reply preview requests per page.
const REPLY_FETCH_CONCURRENCY: usize = 4;

const COMMENTS_TABLE: &str = "/rest/v1/comments";
const COMMENTS_RPC: &str = "/rest/v1/rpc/get_comments_with_reply_count";

#[derive(Error, Debug)]
pub enum CommentError {
    #[error("{0}")]
    Invalid(String),

    #[error("Parent comment not found")]
    ParentNotFound,

    #[error("Cannot reply to a reply. Only top-level comments can be replied to.")]
    ReplyToReply,

    #[error("Admin access requires the Supabase service key")]
    AdminUnavailable,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<reqwest::Error> for CommentError {
    fn from(e: reqwest::Error) -> Self {
        CommentError::Api(ApiError::NetworkError(e))
    }
}

#[derive(Serialize)]
struct CommentsPageParams<'a> {
    p_centre_id: &'a str,
    p_limit: usize,
    p_offset: usize,
}

#[derive(Deserialize)]
struct ParentRow {
    parent_comment_id: Option<String>,
}

#[derive(Serialize)]
struct HiddenPatch {
    hidden: bool,
}

/// Whether a page of top-level comments may have a successor.
pub fn has_more(page_len: usize, limit: usize) -> bool {
    limit > 0 && page_len == limit
}

/// Total from a PostgREST `Content-Range` header such as `0-1/5` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

/// Supabase comment client. Clone is cheap; the underlying client is shared.
#[derive(Clone)]
pub struct CommentClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_key: Option<String>,
}

impl CommentClient {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, CommentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            service_key: None,
        })
    }

    /// Enable moderation calls with the given service key.
    pub fn with_service_key(mut self, service_key: Option<String>) -> Self {
        self.service_key = service_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn has_admin_access(&self) -> bool {
        self.service_key.is_some()
    }

    fn request(&self, method: Method, path: &str, key: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", key)
            .header(header::AUTHORIZATION, format!("Bearer {}", key))
    }

    fn public(&self, method: Method, path: &str) -> RequestBuilder {
        self.request(method, path, &self.anon_key)
    }

    fn admin(&self, method: Method, path: &str) -> Result<RequestBuilder, CommentError> {
        let key = self
            .service_key
            .as_deref()
            .ok_or(CommentError::AdminUnavailable)?;
        Ok(self.request(method, path, key))
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, CommentError> {
        let response = request.send().await?;
        let response = ApiError::check(response).await?;
        Ok(response.json().await?)
    }

    /// One page of visible top-level comments for a centre, with reply counts.
    pub async fn fetch_comments(
        &self,
        centre_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Comment>, CommentError> {
        debug!(centre_id, limit, offset, "Fetching comments");
        let request = self.public(Method::POST, COMMENTS_RPC).json(&CommentsPageParams {
            p_centre_id: centre_id,
            p_limit: limit,
            p_offset: offset,
        });
        Self::send_json(request).await
    }

    /// Visible replies to a comment, oldest first.
    pub async fn fetch_replies(
        &self,
        parent_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Comment>, CommentError> {
        let parent_filter = format!("eq.{}", parent_id);
        let limit_param = limit.to_string();
        let offset_param = offset.to_string();
        let request = self.public(Method::GET, COMMENTS_TABLE).query(&[
            ("select", "*"),
            ("parent_comment_id", parent_filter.as_str()),
            ("hidden", "eq.false"),
            ("order", "created_at.asc"),
            ("limit", limit_param.as_str()),
            ("offset", offset_param.as_str()),
        ]);
        Self::send_json(request).await
    }

    /// First replies for every comment on a page that has any, keyed by
    /// parent id. A failed preview is logged and left out.
    pub async fn fetch_reply_previews(&self, parents: &[Comment]) -> HashMap<String, Vec<Comment>> {
        let ids: Vec<String> = parents
            .iter()
            .filter(|c| c.reply_count() > 0)
            .map(|c| c.comment_id.clone())
            .collect();

        stream::iter(ids)
            .map(|id| async move {
                let result = self.fetch_replies(&id, REPLY_PREVIEW_SIZE, 0).await;
                (id, result)
            })
            .buffer_unordered(REPLY_FETCH_CONCURRENCY)
            .filter_map(|(id, result)| async move {
                match result {
                    Ok(replies) => Some((id, replies)),
                    Err(e) => {
                        warn!(parent_id = id.as_str(), error = %e, "Failed to fetch replies");
                        None
                    }
                }
            })
            .collect()
            .await
    }

    /// Exact number of visible replies to a comment.
    pub async fn reply_count(&self, parent_id: &str) -> Result<u64, CommentError> {
        let parent_filter = format!("eq.{}", parent_id);
        let response = self
            .public(Method::HEAD, COMMENTS_TABLE)
            .header("Prefer", "count=exact")
            .query(&[
                ("select", "*"),
                ("parent_comment_id", parent_filter.as_str()),
                ("hidden", "eq.false"),
            ])
            .send()
            .await?;
        let response = ApiError::check(response).await?;

        let total = response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);

        match total {
            Some(n) => Ok(n),
            None => {
                warn!(parent_id, "Reply count response had no usable Content-Range");
                Ok(0)
            }
        }
    }

    /// Post a comment or a reply to a top-level comment.
    pub async fn create_comment(
        &self,
        centre_id: &str,
        username: &str,
        text: &str,
        parent_id: Option<&str>,
    ) -> Result<Comment, CommentError> {
        if !is_valid_centre_id(centre_id) {
            return Err(CommentError::Invalid("Invalid centre ID".to_string()));
        }
        let text = sanitize_text(text);
        let username = sanitize_text(username);

        let errors = validate_comment(&text, &username);
        if !errors.is_empty() {
            return Err(CommentError::Invalid(errors.join(". ")));
        }

        if let Some(parent_id) = parent_id {
            self.ensure_top_level(parent_id).await?;
        }

        let new_comment = NewComment {
            centre_id,
            username: &username,
            text: &text,
            parent_comment_id: parent_id,
            hidden: false,
        };

        let request = self
            .public(Method::POST, COMMENTS_TABLE)
            .header("Prefer", "return=representation")
            .json(&new_comment);
        let rows: Vec<Comment> = Self::send_json(request).await?;

        let created = rows.into_iter().next().ok_or_else(|| {
            ApiError::InvalidResponse("Insert returned no rows".to_string())
        })?;
        info!(centre_id, comment_id = %created.comment_id, reply = created.is_reply(), "Comment created");
        Ok(created)
    }

    async fn ensure_top_level(&self, parent_id: &str) -> Result<(), CommentError> {
        let id_filter = format!("eq.{}", parent_id);
        let request = self.public(Method::GET, COMMENTS_TABLE).query(&[
            ("select", "parent_comment_id"),
            ("comment_id", id_filter.as_str()),
        ]);

        let rows: Vec<ParentRow> = match Self::send_json(request).await {
            Ok(rows) => rows,
            Err(e) => {
                debug!(parent_id, error = %e, "Parent lookup failed");
                return Err(CommentError::ParentNotFound);
            }
        };

        match rows.into_iter().next() {
            None => Err(CommentError::ParentNotFound),
            Some(ParentRow { parent_comment_id: Some(_) }) => Err(CommentError::ReplyToReply),
            Some(_) => Ok(()),
        }
    }

    /// Every comment including hidden ones, newest first.
    pub async fn admin_fetch_all(&self) -> Result<Vec<Comment>, CommentError> {
        let request = self
            .admin(Method::GET, COMMENTS_TABLE)?
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        Self::send_json(request).await
    }

    /// Hide or unhide a comment, returning the updated row.
    pub async fn admin_set_hidden(
        &self,
        comment_id: &str,
        hidden: bool,
    ) -> Result<Comment, CommentError> {
        let id_filter = format!("eq.{}", comment_id);
        let request = self
            .admin(Method::PATCH, COMMENTS_TABLE)?
            .header("Prefer", "return=representation")
            .query(&[("comment_id", id_filter.as_str())])
            .json(&HiddenPatch { hidden });
        let rows: Vec<Comment> = Self::send_json(request).await?;

        let updated = rows
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound(format!("comment {}", comment_id)))?;
        info!(comment_id, hidden, "Comment visibility changed");
        Ok(updated)
    }

    pub async fn admin_delete(&self, comment_id: &str) -> Result<(), CommentError> {
        let id_filter = format!("eq.{}", comment_id);
        let response = self
            .admin(Method::DELETE, COMMENTS_TABLE)?
            .query(&[("comment_id", id_filter.as_str())])
            .send()
            .await?;
        ApiError::check(response).await?;
        info!(comment_id, "Comment deleted");
        Ok(())
    }
}
