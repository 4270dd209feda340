use serde::{Deserialize, Serialize};

use crate::AdminUserId;

/// Caller identity resolved from the administrative channel credential.
///
/// Every mutating operation carries one of these so the engine can enforce
/// the self-deactivation invariant and attribute `assigned_by` audit data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    user_id: AdminUserId,
    display_name: String,
    email: Option<String>,
}

impl UserIdentity {
    /// Creates a caller identity from authenticated account data.
    #[must_use]
    pub fn new(
        user_id: AdminUserId,
        display_name: impl Into<String>,
        email: Option<String>,
    ) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            email,
        }
    }

    /// Returns the stable account identifier of the caller.
    #[must_use]
    pub fn user_id(&self) -> AdminUserId {
        self.user_id
    }

    /// Returns the display name for the current caller.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email, if the account carries one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}
