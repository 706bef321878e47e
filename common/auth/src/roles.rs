use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// Roles the café backend issues. Anything else in a token is treated as an invalid session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::User, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => ROLE_USER,
            Role::Admin => ROLE_ADMIN,
        }
    }
}

impl FromStr for Role {
    type Err = AuthError;

    // Matching is exact: the backend emits lowercase role tags.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            ROLE_USER => Ok(Role::User),
            ROLE_ADMIN => Ok(Role::Admin),
            other => Err(AuthError::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
