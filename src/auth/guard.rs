//! Route guard: a pure decision over the current session snapshot. The
//! embedding UI maps `RedirectTo` onto its router; nothing here navigates.

use crate::models::Role;

use super::session::AuthState;

pub const LOGIN_PATH: &str = "/login";
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";
pub const STUDENT_HOME_PATH: &str = "/dashboard";
pub const ADMIN_HOME_PATH: &str = "/admin/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    /// Still restoring; render a neutral loading state and re-evaluate on
    /// the next state change.
    Defer,
    RedirectTo(&'static str),
}

fn role_home(role: Role) -> &'static str {
    if role.is_admin() { ADMIN_HOME_PATH } else { STUDENT_HOME_PATH }
}

/// Decide whether the current session may enter a route. `required_role` of
/// `None` means any authenticated session is enough.
pub fn can_enter(state: &AuthState, required_role: Option<Role>) -> RouteDecision {
    match state {
        AuthState::Restoring => RouteDecision::Defer,
        AuthState::Anonymous => {
            // Admin areas have their own login screen.
            let login = match required_role {
                Some(r) if r.is_admin() => ADMIN_LOGIN_PATH,
                _ => LOGIN_PATH,
            };
            RouteDecision::RedirectTo(login)
        }
        AuthState::Authenticated(session) => match required_role {
            None => RouteDecision::Allow,
            Some(required) if session.user.role.satisfies(required) => RouteDecision::Allow,
            // Underprivileged but logged in: send them to their own home.
            Some(_) => RouteDecision::RedirectTo(role_home(session.user.role)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Session;
    use crate::models::User;

    fn authed(role: &str) -> AuthState {
        let user: User = serde_json::from_str(&format!(r#"{{"id":1,"role":"{}"}}"#, role)).unwrap();
        AuthState::Authenticated(Session { token: "t".into(), user })
    }

    #[test]
    fn restoring_defers() {
        assert_eq!(can_enter(&AuthState::Restoring, None), RouteDecision::Defer);
        assert_eq!(can_enter(&AuthState::Restoring, Some(Role::PlatformAdmin)), RouteDecision::Defer);
    }

    #[test]
    fn anonymous_redirects_to_the_matching_login() {
        assert_eq!(can_enter(&AuthState::Anonymous, None), RouteDecision::RedirectTo(LOGIN_PATH));
        assert_eq!(
            can_enter(&AuthState::Anonymous, Some(Role::Student)),
            RouteDecision::RedirectTo(LOGIN_PATH)
        );
        assert_eq!(
            can_enter(&AuthState::Anonymous, Some(Role::CollegeAdmin)),
            RouteDecision::RedirectTo(ADMIN_LOGIN_PATH)
        );
    }

    #[test]
    fn authenticated_passes_when_role_suffices() {
        assert_eq!(can_enter(&authed("student"), None), RouteDecision::Allow);
        assert_eq!(can_enter(&authed("student"), Some(Role::Student)), RouteDecision::Allow);
        assert_eq!(can_enter(&authed("platform_admin"), Some(Role::CollegeAdmin)), RouteDecision::Allow);
        assert_eq!(can_enter(&authed("college_admin"), Some(Role::CollegeAdmin)), RouteDecision::Allow);
    }

    #[test]
    fn underprivileged_session_goes_to_its_own_home() {
        assert_eq!(
            can_enter(&authed("student"), Some(Role::CollegeAdmin)),
            RouteDecision::RedirectTo(STUDENT_HOME_PATH)
        );
        assert_eq!(
            can_enter(&authed("college_admin"), Some(Role::PlatformAdmin)),
            RouteDecision::RedirectTo(ADMIN_HOME_PATH)
        );
        assert_eq!(
            can_enter(&authed("college_admin"), Some(Role::Student)),
            RouteDecision::RedirectTo(ADMIN_HOME_PATH)
        );
    }
}
