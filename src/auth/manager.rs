//! Session manager: the single writer of session state. Owns the gateway
//! client and the realtime channel so login/logout keep all three in step,
//! and installs the forced-logout hook the gateway fires on a dead token.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{Role, User, UserPatch};
use crate::realtime::EventChannel;
use crate::store::TokenStore;

use super::guard::{ADMIN_HOME_PATH, LOGIN_PATH, STUDENT_HOME_PATH};
use super::session::{AuthState, Session, SessionCell};

/// The two login payload shapes the server accepts.
#[derive(Debug, Clone)]
pub enum Credentials {
    Student { student_id: String, password: String },
    Admin { email: String, password: String },
}

/// Where the caller should navigate after a session transition. Navigation
/// itself is the embedding UI's job; this core only names the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    StudentHome,
    AdminHome,
    Login,
}

impl NavTarget {
    pub fn path(self) -> &'static str {
        match self {
            NavTarget::StudentHome => STUDENT_HOME_PATH,
            NavTarget::AdminHome => ADMIN_HOME_PATH,
            NavTarget::Login => LOGIN_PATH,
        }
    }

    fn for_role(role: Role) -> Self {
        if role.is_admin() { NavTarget::AdminHome } else { NavTarget::StudentHome }
    }
}

pub struct AuthManager {
    state: Arc<SessionCell>,
    store: Arc<TokenStore>,
    api: ApiClient,
    channel: Arc<EventChannel>,
}

impl AuthManager {
    pub fn new(config: ClientConfig, store: TokenStore) -> Self {
        let state = Arc::new(SessionCell::new());
        let store = Arc::new(store);
        let api = ApiClient::new(&config, state.clone());
        let channel = EventChannel::new(config);

        // A 401 on an authenticated call means the session died server-side:
        // tear everything down instead of letting pages hold a dead token.
        let hook_state = state.clone();
        let hook_store = store.clone();
        let hook_channel = channel.clone();
        api.set_unauthorized_hook(Arc::new(move || {
            warn!("auth: session invalidated server-side, forcing logout");
            hook_channel.close();
            hook_state.set_anonymous();
            hook_store.clear();
        }));

        Self { state, store, api, channel }
    }

    /// Read handle for guards and pages. Reads are always fresh snapshots;
    /// nothing outside this manager can mutate through it.
    pub fn session(&self) -> Arc<SessionCell> {
        self.state.clone()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn channel(&self) -> &Arc<EventChannel> {
        &self.channel
    }

    /// Startup restore from the token store. Runs once; resolves the
    /// `Restoring` state either way, and brings the realtime channel up on a
    /// hit. Corrupt or absent records are an anonymous start, never an error.
    pub async fn restore(&self) -> AuthState {
        match self.store.load() {
            Some(rec) => {
                info!("auth: restored session for user {} ({})", rec.user.id, rec.user.role);
                self.state.set_authenticated(Session { token: rec.token.clone(), user: rec.user });
                self.channel.open(&rec.token);
            }
            None => {
                self.state.set_anonymous();
            }
        }
        self.state.snapshot()
    }

    /// Authenticate against the server. On success the record is persisted
    /// before the state flips and before the caller can navigate; on failure
    /// the previous state is left untouched.
    pub async fn login(&self, credentials: Credentials) -> ClientResult<NavTarget> {
        let resp = match &credentials {
            Credentials::Student { student_id, password } => {
                if student_id.is_empty() || password.is_empty() {
                    return Err(ClientError::validation("student ID and password are required"));
                }
                self.api.login_student(student_id, password).await?
            }
            Credentials::Admin { email, password } => {
                if email.is_empty() || password.is_empty() {
                    return Err(ClientError::validation("email and password are required"));
                }
                self.api.login_admin(email, password).await?
            }
        };
        let role = resp.user.role;
        self.store.save(&resp.token, &resp.user);
        self.state.set_authenticated(Session { token: resp.token.clone(), user: resp.user });
        // open() supersedes any previous connection without dropping the
        // listeners pages already registered
        self.channel.open(&resp.token);
        info!("auth: login ok, role={}", role);
        Ok(NavTarget::for_role(role))
    }

    /// End the session: channel teardown first (no event may arrive on a
    /// logged-out client), then state, then the persisted record.
    pub fn logout(&self) -> NavTarget {
        self.channel.close();
        self.state.set_anonymous();
        self.store.clear();
        info!("auth: logged out");
        NavTarget::Login
    }

    /// Shallow-merge profile fields into the current session and re-persist.
    /// A `State` error when no session is active.
    pub fn update_user(&self, patch: &UserPatch) -> ClientResult<User> {
        let AuthState::Authenticated(mut session) = self.state.snapshot() else {
            return Err(ClientError::state("cannot update profile without an active session"));
        };
        patch.apply(&mut session.user);
        self.store.save(&session.token, &session.user);
        self.state.replace_user(session.user.clone());
        Ok(session.user)
    }

    /// Role-hierarchy check over the current session; false when anonymous.
    pub fn has_role(&self, required: Role) -> bool {
        self.state.role().map(|r| r.satisfies(required)).unwrap_or(false)
    }
}
