//! HTTP gateway: uniform outbound request execution with bearer attachment
//! and error normalization. Pages never see a raw transport error, only a
//! `ClientError`; the one side effect here is the unauthorized hook, fired
//! when an authenticated call comes back 401 so the session manager can tear
//! the dead session down.

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::SessionCell;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{
    Ack, Announcement, ChatMessage, Conversation, CreateAnnouncement, CreateCollege,
    CreateCollegeAdmin, CreateGroup, CreateListing, DirectoryPage, FeedPage, FriendProfile,
    Friendship, Group, GroupDetail, Listing, LoginResponse, PlatformStats, ProfileUpdate,
    RegisterRequest, SendMessage, User,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuthMode {
    /// Attach the bearer token; fail fast with an Auth error (no network
    /// call) when the session has none.
    Required,
    /// Public endpoint (login, register).
    None,
}

type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
    session: Arc<SessionCell>,
    on_unauthorized: Arc<RwLock<Option<UnauthorizedHook>>>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Arc<SessionCell>) -> Self {
        Self {
            base: config.api_base.clone(),
            http: reqwest::Client::new(),
            session,
            on_unauthorized: Arc::new(RwLock::new(None)),
        }
    }

    /// Installed once by the session manager; invoked on any 401 answer to a
    /// request that actually carried a token. A rejected login is a plain
    /// Auth error and does not trip this.
    pub fn set_unauthorized_hook(&self, hook: UnauthorizedHook) {
        *self.on_unauthorized.write() = Some(hook);
    }

    fn fire_unauthorized(&self) {
        let hook = self.on_unauthorized.read().clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Core request path: attach auth, send, normalize every failure mode
    /// into `ClientError`. No automatic retries.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        auth: AuthMode,
    ) -> ClientResult<Value> {
        let bearer = match auth {
            AuthMode::Required => match self.session.token() {
                Some(t) => Some(t),
                None => return Err(ClientError::auth("authentication token not found")),
            },
            AuthMode::None => None,
        };
        let url = self
            .base
            .join(path)
            .map_err(|e| ClientError::internal(format!("invalid path '{}': {}", path, e)))?;
        let mut req = self.http.request(method.clone(), url);
        if let Some(t) = &bearer {
            req = req.bearer_auth(t);
        }
        if let Some(b) = body {
            req = req.json(b);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| ClientError::network(format!("request failed: {}", e)))?;
        let status = resp.status();
        debug!("api: {} {} -> {}", method, path, status.as_u16());
        if status.is_success() {
            if status == reqwest::StatusCode::NO_CONTENT {
                return Ok(Value::Null);
            }
            return resp
                .json::<Value>()
                .await
                .map_err(|e| ClientError::internal(format!("malformed response body: {}", e)));
        }
        // Non-2xx: the server envelope is {"error": "..."} when present.
        let message = resp
            .json::<Value>()
            .await
            .ok()
            .and_then(|v| v.get("error").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or_else(|| format!("request failed with HTTP {}", status.as_u16()));
        let err = ClientError::from_status(status.as_u16(), message);
        if err.is_unauthorized() && bearer.is_some() {
            warn!("api: session invalidated by {} {}", method, path);
            self.fire_unauthorized();
        }
        Err(err)
    }

    fn decode<T: DeserializeOwned>(value: Value) -> ClientResult<T> {
        serde_json::from_value(value)
            .map_err(|e| ClientError::internal(format!("unexpected response shape: {}", e)))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        Self::decode(self.execute(Method::GET, path, None, AuthMode::Required).await?)
    }

    pub async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> ClientResult<T> {
        Self::decode(self.execute(Method::POST, path, Some(body), AuthMode::Required).await?)
    }

    pub async fn put_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> ClientResult<T> {
        Self::decode(self.execute(Method::PUT, path, Some(body), AuthMode::Required).await?)
    }

    pub async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        Self::decode(self.execute(Method::DELETE, path, None, AuthMode::Required).await?)
    }

    // --- Auth endpoints (public) ---

    pub async fn login_student(&self, student_id: &str, password: &str) -> ClientResult<LoginResponse> {
        let body = serde_json::json!({ "studentId": student_id, "password": password });
        Self::decode(self.execute(Method::POST, "/api/login", Some(&body), AuthMode::None).await?)
    }

    pub async fn login_admin(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        let body = serde_json::json!({ "email": email, "password": password });
        Self::decode(self.execute(Method::POST, "/api/admin/login", Some(&body), AuthMode::None).await?)
    }

    pub async fn register(&self, req: &RegisterRequest) -> ClientResult<Ack> {
        let body = serde_json::to_value(req)
            .map_err(|e| ClientError::internal(format!("register payload: {}", e)))?;
        Self::decode(self.execute(Method::POST, "/api/register", Some(&body), AuthMode::None).await?)
    }

    // --- Feed ---

    pub async fn feed(&self) -> ClientResult<FeedPage> {
        self.get_json("/api/feed").await
    }

    // --- Marketplace ---

    pub async fn listings(&self) -> ClientResult<Vec<Listing>> {
        self.get_json("/api/listings").await
    }

    pub async fn my_listings(&self) -> ClientResult<Vec<Listing>> {
        self.get_json("/api/listings/my").await
    }

    pub async fn listing(&self, id: u64) -> ClientResult<Listing> {
        self.get_json(&format!("/api/listings/{}", id)).await
    }

    pub async fn create_listing(&self, req: &CreateListing) -> ClientResult<Listing> {
        let body = serde_json::to_value(req)
            .map_err(|e| ClientError::internal(format!("listing payload: {}", e)))?;
        self.post_json("/api/listings", &body).await
    }

    pub async fn delete_listing(&self, id: u64) -> ClientResult<Ack> {
        self.delete_json(&format!("/api/listings/{}", id)).await
    }

    // Reservation lifecycle: reserve/cancel/mark-sold all answer
    // {message, listing} with the listing's new status.

    pub async fn reserve_listing(&self, id: u64) -> ClientResult<Listing> {
        self.listing_action(id, "reserve").await
    }

    pub async fn cancel_reservation(&self, id: u64) -> ClientResult<Listing> {
        self.listing_action(id, "cancel-reservation").await
    }

    pub async fn mark_listing_sold(&self, id: u64) -> ClientResult<Listing> {
        self.listing_action(id, "mark-sold").await
    }

    async fn listing_action(&self, id: u64, action: &str) -> ClientResult<Listing> {
        #[derive(Deserialize)]
        struct Envelope { listing: Listing }
        let path = format!("/api/listings/{}/{}", id, action);
        Ok(self.post_json::<Envelope>(&path, &Value::Object(Default::default())).await?.listing)
    }

    pub async fn my_reservations(&self) -> ClientResult<Vec<Listing>> {
        self.get_json("/api/listings/my-reservations").await
    }

    // --- Friends ---

    pub async fn friends(&self) -> ClientResult<Vec<Friendship>> {
        #[derive(Deserialize)]
        struct Envelope { #[serde(default)] friends: Vec<Friendship> }
        Ok(self.get_json::<Envelope>("/api/friends").await?.friends)
    }

    pub async fn pending_friend_requests(&self) -> ClientResult<Vec<Friendship>> {
        #[derive(Deserialize)]
        struct Envelope { #[serde(default)] requests: Vec<Friendship> }
        Ok(self.get_json::<Envelope>("/api/friends/requests/pending").await?.requests)
    }

    pub async fn friend_suggestions(&self) -> ClientResult<Vec<FriendProfile>> {
        #[derive(Deserialize)]
        struct Envelope { #[serde(default)] suggestions: Vec<FriendProfile> }
        Ok(self.get_json::<Envelope>("/api/friends/suggestions").await?.suggestions)
    }

    pub async fn send_friend_request(&self, friend_id: u64) -> ClientResult<Ack> {
        let body = serde_json::json!({ "friendId": friend_id });
        self.post_json("/api/friends/request", &body).await
    }

    pub async fn accept_friend_request(&self, friendship_id: u64) -> ClientResult<Ack> {
        self.post_json(&format!("/api/friends/accept/{}", friendship_id), &Value::Object(Default::default())).await
    }

    pub async fn reject_friend_request(&self, friendship_id: u64) -> ClientResult<Ack> {
        self.post_json(&format!("/api/friends/reject/{}", friendship_id), &Value::Object(Default::default())).await
    }

    pub async fn remove_friend(&self, friend_user_id: u64) -> ClientResult<Ack> {
        self.delete_json(&format!("/api/friends/{}", friend_user_id)).await
    }

    // --- Groups ---

    pub async fn my_groups(&self) -> ClientResult<Vec<Group>> {
        #[derive(Deserialize)]
        struct Envelope { #[serde(default)] groups: Vec<Group> }
        Ok(self.get_json::<Envelope>("/api/groups/my").await?.groups)
    }

    pub async fn public_groups(&self) -> ClientResult<Vec<Group>> {
        #[derive(Deserialize)]
        struct Envelope { #[serde(default)] groups: Vec<Group> }
        Ok(self.get_json::<Envelope>("/api/groups/public").await?.groups)
    }

    pub async fn group_detail(&self, id: u64) -> ClientResult<GroupDetail> {
        self.get_json(&format!("/api/groups/{}", id)).await
    }

    pub async fn join_group(&self, id: u64) -> ClientResult<Ack> {
        self.post_json(&format!("/api/groups/{}/join", id), &Value::Object(Default::default())).await
    }

    pub async fn leave_group(&self, id: u64) -> ClientResult<Ack> {
        self.post_json(&format!("/api/groups/{}/leave", id), &Value::Object(Default::default())).await
    }

    // --- Messaging ---

    pub async fn conversations(&self) -> ClientResult<Vec<Conversation>> {
        #[derive(Deserialize)]
        struct Envelope { #[serde(default)] conversations: Vec<Conversation> }
        Ok(self.get_json::<Envelope>("/api/conversations").await?.conversations)
    }

    pub async fn messages(&self, conversation_id: &str, limit: u32, offset: u32) -> ClientResult<Vec<ChatMessage>> {
        #[derive(Deserialize)]
        struct Envelope { #[serde(default)] messages: Vec<ChatMessage> }
        let path = format!("/api/conversations/{}/messages?limit={}&offset={}", conversation_id, limit, offset);
        Ok(self.get_json::<Envelope>(&path).await?.messages)
    }

    pub async fn send_message(&self, req: &SendMessage) -> ClientResult<ChatMessage> {
        #[derive(Deserialize)]
        struct Envelope { message: ChatMessage }
        let body = serde_json::to_value(req)
            .map_err(|e| ClientError::internal(format!("message payload: {}", e)))?;
        let path = format!("/api/conversations/{}/messages", req.conversation_id);
        Ok(self.post_json::<Envelope>(&path, &body).await?.message)
    }

    pub async fn delete_message(&self, id: u64) -> ClientResult<Ack> {
        self.delete_json(&format!("/api/messages/{}", id)).await
    }

    // --- Profiles & directory ---

    pub async fn my_profile(&self) -> ClientResult<User> {
        self.get_json("/api/profile/me").await
    }

    pub async fn profile(&self, user_id: u64) -> ClientResult<User> {
        self.get_json(&format!("/api/profile/{}", user_id)).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<User> {
        #[derive(Deserialize)]
        struct Envelope { profile: User }
        let body = serde_json::to_value(update)
            .map_err(|e| ClientError::internal(format!("profile payload: {}", e)))?;
        Ok(self.put_json::<Envelope>("/api/profile/me", &body).await?.profile)
    }

    pub async fn search_directory(&self, query: &str) -> ClientResult<DirectoryPage> {
        if query.trim().is_empty() {
            return Ok(DirectoryPage { total: 0, students: Vec::new() });
        }
        self.get_json(&format!("/api/directory?q={}", urlencoding::encode(query))).await
    }

    /// Distinct departments within the caller's college, for filter dropdowns.
    pub async fn departments(&self) -> ClientResult<Vec<String>> {
        #[derive(Deserialize)]
        struct Envelope { #[serde(default)] departments: Vec<String> }
        Ok(self.get_json::<Envelope>("/api/departments").await?.departments)
    }

    // --- College admin (server enforces the role) ---

    pub async fn college_students(&self) -> ClientResult<DirectoryPage> {
        self.get_json("/api/college-admin/students").await
    }

    pub async fn college_stats(&self) -> ClientResult<Value> {
        self.get_json("/api/college-admin/stats").await
    }

    pub async fn college_announcements(&self) -> ClientResult<Vec<Announcement>> {
        #[derive(Deserialize)]
        struct Envelope { #[serde(default)] announcements: Vec<Announcement> }
        Ok(self.get_json::<Envelope>("/api/college-admin/announcements").await?.announcements)
    }

    pub async fn create_announcement(&self, req: &CreateAnnouncement) -> ClientResult<Value> {
        let body = serde_json::to_value(req)
            .map_err(|e| ClientError::internal(format!("announcement payload: {}", e)))?;
        self.post_json("/api/college-admin/announcements", &body).await
    }

    pub async fn delete_announcement(&self, id: u64) -> ClientResult<Ack> {
        self.delete_json(&format!("/api/college-admin/announcements/{}", id)).await
    }

    pub async fn delete_college_listing(&self, id: u64) -> ClientResult<Ack> {
        self.delete_json(&format!("/api/college-admin/listings/{}", id)).await
    }

    pub async fn college_groups(&self) -> ClientResult<Vec<Group>> {
        #[derive(Deserialize)]
        struct Envelope { #[serde(default)] groups: Vec<Group> }
        Ok(self.get_json::<Envelope>("/api/college-admin/groups").await?.groups)
    }

    pub async fn create_group(&self, req: &CreateGroup) -> ClientResult<Group> {
        #[derive(Deserialize)]
        struct Envelope { group: Group }
        let body = serde_json::to_value(req)
            .map_err(|e| ClientError::internal(format!("group payload: {}", e)))?;
        Ok(self.post_json::<Envelope>("/api/college-admin/groups", &body).await?.group)
    }

    pub async fn delete_group(&self, id: u64) -> ClientResult<Ack> {
        self.delete_json(&format!("/api/college-admin/groups/{}", id)).await
    }

    // --- Platform admin ---

    pub async fn add_college(&self, req: &CreateCollege) -> ClientResult<Value> {
        let body = serde_json::to_value(req)
            .map_err(|e| ClientError::internal(format!("college payload: {}", e)))?;
        self.post_json("/api/platform-admin/colleges", &body).await
    }

    pub async fn create_college_admin(&self, req: &CreateCollegeAdmin) -> ClientResult<Ack> {
        let body = serde_json::to_value(req)
            .map_err(|e| ClientError::internal(format!("admin payload: {}", e)))?;
        self.post_json("/api/platform-admin/college-admins", &body).await
    }

    /// Platform totals; the per-college breakdown also serves as the college
    /// list for the management page.
    pub async fn platform_stats(&self) -> ClientResult<PlatformStats> {
        self.get_json("/api/platform-admin/stats").await
    }
}
