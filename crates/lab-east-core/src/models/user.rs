//! Staff user models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Staff role, which decides the reachable dashboard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "lab-admin")]
    LabAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::LabAdmin => "lab-admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signed-in staff member, with the password already stripped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u32,
    pub username: String,
    /// Display name
    pub name: String,
    pub role: Role,
}
