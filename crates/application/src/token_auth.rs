use std::sync::Arc;

use muster_core::{AppError, AppResult, UserIdentity};
use muster_domain::AccountState;

use crate::admin_ports::AdminDirectoryRepository;
use crate::credential;

/// Resolves administrative bearer credentials to caller identities.
///
/// Deactivated accounts stop authenticating immediately; the transport
/// never sees which of "unknown token" or "deactivated account" applied.
#[derive(Clone)]
pub struct TokenAuthenticator {
    directory: Arc<dyn AdminDirectoryRepository>,
}

impl TokenAuthenticator {
    /// Creates an authenticator from the directory repository.
    #[must_use]
    pub fn new(directory: Arc<dyn AdminDirectoryRepository>) -> Self {
        Self { directory }
    }

    /// Authenticates a raw bearer token.
    pub async fn authenticate(&self, raw_token: &str) -> AppResult<UserIdentity> {
        if raw_token.trim().is_empty() {
            return Err(AppError::Unauthorized(
                "missing administrative credential".to_owned(),
            ));
        }

        let api_token_hash = credential::hash_api_token(raw_token.trim());
        let record = self
            .directory
            .find_admin_by_token_hash(api_token_hash.as_str())
            .await?
            .filter(|record| record.state == AccountState::Active)
            .ok_or_else(|| AppError::Unauthorized("invalid administrative credential".to_owned()))?;

        Ok(UserIdentity::new(
            record.user_id,
            record.display_name,
            Some(record.email),
        ))
    }
}
