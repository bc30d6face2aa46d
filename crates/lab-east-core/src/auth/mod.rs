//! Mock authentication.
//!
//! Two fixed staff accounts and an unsigned bearer token. This gates the
//! dashboards for a single workstation; it is not a security boundary.

mod session;

pub use session::*;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{LatencyProfile, Operation};
use crate::models::{Role, User};

/// Prefix every issued token starts with.
pub const TOKEN_PREFIX: &str = "mock-jwt-token-";

/// Authentication errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Access denied: {role} cannot perform this action")]
    AccessDenied { role: Role },
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Successful login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

struct Account {
    user: User,
    password: &'static str,
}

/// Credential check against the built-in accounts.
pub struct AuthService {
    accounts: Vec<Account>,
    latency: LatencyProfile,
}

impl AuthService {
    pub fn new(latency: LatencyProfile) -> Self {
        let accounts = vec![
            Account {
                user: User {
                    id: 1,
                    username: "admin".into(),
                    name: "Admin User".into(),
                    role: Role::Admin,
                },
                password: "admin123",
            },
            Account {
                user: User {
                    id: 2,
                    username: "labadmin".into(),
                    name: "Lab Admin User".into(),
                    role: Role::LabAdmin,
                },
                password: "lab123",
            },
        ];
        Self { accounts, latency }
    }

    /// Check credentials and issue a token. Matching is exact.
    pub fn login(&self, username: &str, password: &str) -> AuthResult<AuthResponse> {
        self.latency.pause(Operation::Login);

        let account = self
            .accounts
            .iter()
            .find(|a| a.user.username == username && a.password == password)
            .ok_or_else(|| {
                tracing::warn!(username, "Rejected login");
                AuthError::InvalidCredentials
            })?;

        let user = account.user.clone();
        let token = issue_token(&user);
        tracing::info!(user_id = user.id, role = %user.role, "User signed in");
        Ok(AuthResponse { token, user })
    }

    /// Accept any token carrying the mock prefix.
    pub fn verify_token(&self, token: &str) -> AuthResult<()> {
        self.latency.pause(Operation::VerifyToken);
        if is_well_formed_token(token) {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

impl Default for AuthService {
    fn default() -> Self {
        Self::new(LatencyProfile::none())
    }
}

fn issue_token(user: &User) -> String {
    format!(
        "{}{}-{}-{}",
        TOKEN_PREFIX,
        user.id,
        user.role,
        Utc::now().timestamp_millis()
    )
}

pub(crate) fn is_well_formed_token(token: &str) -> bool {
    token.starts_with(TOKEN_PREFIX)
}
