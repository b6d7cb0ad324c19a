//! Session and authorization core: who is logged in, role checks, session
//! transitions and the route-guard decision. Keep the public surface thin and
//! split implementation across sub-modules.

mod session;
mod manager;
mod guard;

pub use session::{AuthState, Session, SessionCell};
pub use manager::{AuthManager, Credentials, NavTarget};
pub use guard::{can_enter, RouteDecision, ADMIN_HOME_PATH, ADMIN_LOGIN_PATH, LOGIN_PATH, STUDENT_HOME_PATH};
