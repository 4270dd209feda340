use std::fmt::{Display, Formatter};

use muster_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the built-in system role that gates administrator management.
///
/// The gate is a role-name check rather than an ordinary permission so that
/// role editing can never delegate the ability to create peer super-admins.
pub const SUPER_ADMIN_ROLE_NAME: &str = "super_admin";

/// Unique identifier for a role record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Maximum length of a role name.
pub const ROLE_NAME_MAX_LENGTH: usize = 64;

/// Normalizes and validates a role name.
///
/// Role names are stable keys: lowercase, trimmed, `a-z`, `0-9` and `_` only.
pub fn normalize_role_name(value: &str) -> AppResult<String> {
    let normalized = value.trim().to_lowercase();

    if normalized.is_empty() {
        return Err(AppError::Validation("role name must not be empty".to_owned()));
    }

    if normalized.len() > ROLE_NAME_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "role name must not exceed {ROLE_NAME_MAX_LENGTH} characters"
        )));
    }

    if !normalized
        .chars()
        .all(|character| character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_')
    {
        return Err(AppError::Validation(format!(
            "role name '{normalized}' may only contain lowercase letters, digits and underscores"
        )));
    }

    Ok(normalized)
}
