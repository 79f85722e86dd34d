//! Reddit OAuth API client implementation

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use urlencoding::encode;

use crate::config::RedditConfig;
use crate::domain::entities::{
    truncate_chars, ItemType, ItemTypeFilter, ModerationAction, ModerationItem,
    NotificationMethod,
};
use crate::domain::ports::ContentPlatform;
use crate::error::PlatformError;

pub const AUTH_BASE_URL: &str = "https://www.reddit.com";
pub const API_BASE_URL: &str = "https://oauth.reddit.com";

/// Refresh tokens this long before Reddit says they expire
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;
/// Upper bound on a server-reported token lifetime
const MAX_TOKEN_LIFETIME_SECS: i64 = 7 * 24 * 3600;

/// Implementation of the content platform against Reddit
pub struct RedditClient {
    http: Client,
    credentials: RedditConfig,
    subreddit: String,
    queue_limit: u32,
    auth_base_url: String,
    api_base_url: String,
    token: RwLock<Option<CachedToken>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

impl RedditClient {
    pub fn new(
        credentials: RedditConfig,
        subreddit: impl Into<String>,
        queue_limit: u32,
    ) -> Result<Self, PlatformError> {
        let http = Client::builder()
            .user_agent(credentials.user_agent.clone())
            .build()?;
        Ok(Self {
            http,
            credentials,
            subreddit: subreddit.into(),
            queue_limit,
            auth_base_url: AUTH_BASE_URL.to_string(),
            api_base_url: API_BASE_URL.to_string(),
            token: RwLock::new(None),
        })
    }

    /// Point the client at different hosts (proxies, test servers)
    pub fn with_base_urls(mut self, auth_base_url: &str, api_base_url: &str) -> Self {
        self.auth_base_url = auth_base_url.trim_end_matches('/').to_string();
        self.api_base_url = api_base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn subreddit(&self) -> &str {
        &self.subreddit
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    /// Bearer token for API calls, fetched with the password grant and cached
    async fn access_token(&self) -> Result<String, PlatformError> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        let mut guard = self.token.write().await;
        if let Some(token) = guard.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        let response = self
            .http
            .post(format!("{}/api/v1/access_token", self.auth_base_url))
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[
                ("grant_type", "password"),
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
            ])
            .send()
            .await?;

        let body: TokenResponse = handle_response(response).await.map_err(|e| match e {
            PlatformError::Unauthorized => {
                PlatformError::Auth("invalid client id or secret".to_string())
            }
            other => other,
        })?;
        let token = body.into_token(Utc::now())?;

        tracing::info!(
            username = %self.credentials.username,
            expires_at = %token.expires_at,
            "Authenticated with Reddit"
        );
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, PlatformError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(self.api_url(path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;
        handle_response(response).await
    }

    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<(), PlatformError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .post(self.api_url(path))
            .bearer_auth(token)
            .form(form)
            .send()
            .await?;
        let body: serde_json::Value = handle_response(response).await?;
        check_api_errors(&body)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), PlatformError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .post(self.api_url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        let body: serde_json::Value = handle_response(response).await?;
        check_api_errors(&body)
    }
}

/// Map an HTTP response to its JSON body or a `PlatformError`
async fn handle_response<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, PlatformError> {
    let status = response.status();

    if status.is_success() {
        response
            .json()
            .await
            .map_err(|e| PlatformError::Deserialization(e.to_string()))
    } else if status.as_u16() == 401 {
        Err(PlatformError::Unauthorized)
    } else if status.as_u16() == 429 {
        Err(PlatformError::RateLimited)
    } else {
        let message = response.text().await.unwrap_or_default();
        Err(PlatformError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Reddit reports form errors inside a 200 body: `{"json": {"errors": [[code, msg, field]]}}`
fn check_api_errors(body: &serde_json::Value) -> Result<(), PlatformError> {
    let Some(errors) = body
        .pointer("/json/errors")
        .and_then(|e| e.as_array())
        .filter(|e| !e.is_empty())
    else {
        return Ok(());
    };

    let message = errors
        .iter()
        .map(|e| match e.as_array() {
            Some(parts) => parts
                .iter()
                .filter_map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(": "),
            None => e.to_string(),
        })
        .collect::<Vec<_>>()
        .join("; ");

    if message.starts_with("RATELIMIT") {
        return Err(PlatformError::RateLimited);
    }
    Err(PlatformError::Api {
        status: 200,
        message,
    })
}

/// Request/response types for the Reddit API
#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<String>,
}

impl TokenResponse {
    fn into_token(self, now: DateTime<Utc>) -> Result<CachedToken, PlatformError> {
        if let Some(error) = self.error {
            return Err(PlatformError::Auth(error));
        }
        let value = self
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PlatformError::Auth("no access token in response".to_string()))?;
        let lifetime = self
            .expires_in
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
            .clamp(0, MAX_TOKEN_LIFETIME_SECS);
        Ok(CachedToken {
            value,
            expires_at: now + Duration::seconds(lifetime),
        })
    }
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Deserialize)]
struct Thing {
    kind: String,
    data: ThingData,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ThingData {
    id: String,
    name: String,
    title: Option<String>,
    selftext: Option<String>,
    body: Option<String>,
    author: Option<String>,
    subreddit: String,
    url: Option<String>,
    domain: Option<String>,
    link_title: Option<String>,
}

impl Thing {
    /// Submissions (`t3`) and comments (`t1`); other kinds are not moderated here
    fn into_item(self) -> Option<ModerationItem> {
        let item_type = match self.kind.as_str() {
            "t3" => ItemType::Submission,
            "t1" => ItemType::Comment,
            _ => return None,
        };
        let data = self.data;
        let fullname = if data.name.is_empty() {
            format!("{}_{}", self.kind, data.id)
        } else {
            data.name
        };
        let body_text = match item_type {
            ItemType::Submission => data.selftext,
            ItemType::Comment => data.body,
        }
        .unwrap_or_default();

        Some(ModerationItem {
            id: data.id,
            fullname,
            item_type,
            title: data.title.filter(|_| item_type == ItemType::Submission),
            body_text,
            author: data.author.filter(|a| !a.is_empty() && a != "[deleted]"),
            subreddit: data.subreddit,
            url: data.url.filter(|u| !u.is_empty()),
            domain: data.domain.filter(|d| !d.is_empty()),
            link_title: data.link_title,
        })
    }
}

impl Listing {
    fn into_items(self) -> Vec<ModerationItem> {
        self.data
            .children
            .into_iter()
            .filter_map(Thing::into_item)
            .collect()
    }
}

#[derive(Serialize)]
struct RemovalMessageRequest<'a> {
    item_id: Vec<&'a str>,
    message: &'a str,
    title: &'a str,
    #[serde(rename = "type")]
    message_type: &'a str,
}

/// `only=` value for the modqueue listing
fn only_param(filter: ItemTypeFilter) -> Option<&'static str> {
    match filter {
        ItemTypeFilter::All => None,
        ItemTypeFilter::Submissions => Some("links"),
        ItemTypeFilter::Comments => Some("comments"),
    }
}

/// Fullnames to try for an id given with or without type prefix
fn candidate_fullnames(id: &str) -> String {
    let id = id.trim();
    if id.starts_with("t1_") || id.starts_with("t3_") {
        id.to_string()
    } else {
        format!("t3_{id},t1_{id}")
    }
}

/// Private message body: the rule response plus which content was removed
pub fn modmail_body(item: &ModerationItem, message: &str) -> String {
    let identifier = match item.item_type {
        ItemType::Submission => format!(
            "Your post titled: '{}' was removed.",
            item.title.as_deref().unwrap_or_default()
        ),
        ItemType::Comment => format!(
            "Your comment: '{}' was removed.",
            truncate_chars(&item.body_text, 100)
        ),
    };
    format!("{}\n\n{}", message, identifier)
}

pub fn modmail_subject(subreddit: &str) -> String {
    format!("Post Removal from r/{}", subreddit)
}

#[async_trait]
impl ContentPlatform for RedditClient {
    async fn fetch_queue(
        &self,
        filter: ItemTypeFilter,
    ) -> Result<Vec<ModerationItem>, PlatformError> {
        let mut query = vec![
            ("limit", self.queue_limit.to_string()),
            ("raw_json", "1".to_string()),
        ];
        if let Some(only) = only_param(filter) {
            query.push(("only", only.to_string()));
        }

        let path = format!("/r/{}/about/modqueue", encode(&self.subreddit));
        let listing: Listing = self.get(&path, &query).await?;
        let items: Vec<ModerationItem> = listing
            .into_items()
            .into_iter()
            .filter(|item| filter.matches(item.item_type))
            .collect();

        tracing::debug!(subreddit = %self.subreddit, count = items.len(), "Fetched modqueue");
        Ok(items)
    }

    async fn fetch_item(&self, id: &str) -> Result<Option<ModerationItem>, PlatformError> {
        let query = [("id", candidate_fullnames(id)), ("raw_json", "1".to_string())];
        let listing: Listing = self.get("/api/info", &query).await?;
        Ok(listing.into_items().into_iter().next())
    }

    async fn apply_action(
        &self,
        item: &ModerationItem,
        action: ModerationAction,
    ) -> Result<(), PlatformError> {
        match action {
            ModerationAction::Approve => {
                self.post_form("/api/approve", &[("id", item.fullname.as_str())])
                    .await?
            }
            ModerationAction::Remove => {
                self.post_form(
                    "/api/remove",
                    &[("id", item.fullname.as_str()), ("spam", "false")],
                )
                .await?
            }
            ModerationAction::NoAction => {
                return Err(PlatformError::UnsupportedAction {
                    item_id: item.id.clone(),
                    action: action.to_string(),
                })
            }
        }

        tracing::debug!(item_id = %item.id, action = %action, "Applied moderation action");
        Ok(())
    }

    async fn notify(
        &self,
        item: &ModerationItem,
        channel: NotificationMethod,
        message: &str,
    ) -> Result<(), PlatformError> {
        match (channel, item.item_type) {
            (NotificationMethod::Public, ItemType::Submission) => {
                let request = RemovalMessageRequest {
                    item_id: vec![item.fullname.as_str()],
                    message,
                    title: "Removal reason",
                    message_type: "public",
                };
                self.post_json("/api/v1/modactions/removal_link_message", &request)
                    .await?;
            }
            (NotificationMethod::Public, ItemType::Comment) => {
                self.post_form(
                    "/api/comment",
                    &[
                        ("api_type", "json"),
                        ("thing_id", item.fullname.as_str()),
                        ("text", message),
                    ],
                )
                .await?;
            }
            (NotificationMethod::Modmail, _) => {
                let author = item
                    .author
                    .as_deref()
                    .ok_or_else(|| PlatformError::MissingAuthor(item.id.clone()))?;
                let subject = modmail_subject(&self.subreddit);
                let body = modmail_body(item, message);
                self.post_form(
                    "/api/compose",
                    &[
                        ("api_type", "json"),
                        ("to", author),
                        ("subject", subject.as_str()),
                        ("text", body.as_str()),
                        ("from_sr", self.subreddit.as_str()),
                    ],
                )
                .await?;
            }
        }

        tracing::info!(item_id = %item.id, channel = %channel, "Sent removal notification");
        Ok(())
    }
}
