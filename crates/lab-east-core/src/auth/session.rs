//! Client-side session state and route gating.

use super::{is_well_formed_token, AuthError, AuthResponse, AuthResult};
use crate::models::{Role, User};
use crate::store::{keys, LocalStore, StorageBackend};

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const LAB_ONLY: &[Role] = &[Role::LabAdmin];

/// Navigable screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    AccessDenied,
    AdminDashboard,
    LabDashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::AccessDenied => "/access-denied",
            Route::AdminDashboard => "/admin-dashboard",
            Route::LabDashboard => "/lab-dashboard",
        }
    }

    /// Resolve a path. Unknown paths (including `/`) go to the login screen.
    pub fn from_path(path: &str) -> Self {
        match path {
            "/access-denied" => Route::AccessDenied,
            "/admin-dashboard" => Route::AdminDashboard,
            "/lab-dashboard" => Route::LabDashboard,
            _ => Route::Login,
        }
    }

    /// Roles allowed on this route; `None` for public routes.
    fn allowed_roles(&self) -> Option<&'static [Role]> {
        match self {
            Route::Login | Route::AccessDenied => None,
            Route::AdminDashboard => Some(ADMIN_ONLY),
            Route::LabDashboard => Some(LAB_ONLY),
        }
    }
}

impl Role {
    /// Dashboard shown after signing in.
    pub fn home_route(&self) -> Route {
        match self {
            Role::Admin => Route::AdminDashboard,
            Role::LabAdmin => Route::LabDashboard,
        }
    }
}

/// What to do when navigating to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    RedirectToLogin,
    AccessDenied,
}

/// Signed-in state of the workstation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    LoggedOut,
    LoggedIn { user: User, token: String },
}

impl Session {
    /// Rebuild the session from a stored token and user.
    ///
    /// A stored token without a readable user is discarded.
    pub fn restore<B: StorageBackend>(store: &mut LocalStore<B>) -> Self {
        let Some(token) = store.get::<String>(keys::TOKEN) else {
            return Session::LoggedOut;
        };

        match store.get::<User>(keys::CURRENT_USER) {
            Some(user) if is_well_formed_token(&token) => {
                tracing::debug!(user_id = user.id, "Restored session");
                Session::LoggedIn { user, token }
            }
            _ => {
                tracing::warn!("Discarding stored token without a valid user");
                store.remove(keys::TOKEN);
                store.remove(keys::CURRENT_USER);
                Session::LoggedOut
            }
        }
    }

    /// Enter the signed-in state and persist the token and user.
    pub fn sign_in<B: StorageBackend>(&mut self, response: AuthResponse, store: &mut LocalStore<B>) {
        store.set(keys::TOKEN, &response.token);
        store.set(keys::CURRENT_USER, &response.user);
        *self = Session::LoggedIn {
            user: response.user,
            token: response.token,
        };
    }

    /// Leave the signed-in state and clear user-scoped keys.
    pub fn sign_out<B: StorageBackend>(&mut self, store: &mut LocalStore<B>) {
        for key in [
            keys::TOKEN,
            keys::CURRENT_USER,
            keys::SELECTED_PATIENT,
            keys::SUBMITTED_TESTS,
        ] {
            store.remove(key);
        }
        if let Session::LoggedIn { user, .. } = self {
            tracing::info!(user_id = user.id, "User signed out");
        }
        *self = Session::LoggedOut;
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Session::LoggedIn { user, .. } => Some(user),
            Session::LoggedOut => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.user().map(|u| u.role)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::LoggedIn { .. })
    }

    /// Decide whether the current session may open `route`.
    pub fn route(&self, route: Route) -> RouteDecision {
        let Some(allowed) = route.allowed_roles() else {
            return RouteDecision::Allow;
        };
        match self.role() {
            None => RouteDecision::RedirectToLogin,
            Some(role) if allowed.contains(&role) => RouteDecision::Allow,
            Some(_) => RouteDecision::AccessDenied,
        }
    }

    /// The signed-in user, if their role is one of `roles`.
    pub fn require_role(&self, roles: &[Role]) -> AuthResult<&User> {
        let user = self.user().ok_or(AuthError::NotAuthenticated)?;
        if roles.contains(&user.role) {
            Ok(user)
        } else {
            Err(AuthError::AccessDenied { role: user.role })
        }
    }
}
