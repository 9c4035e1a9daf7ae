//! Persistence gateway: the document store the core reads and writes through.
//!
//! The core never assumes anything about the store beyond this trait. It is
//! object safe so the tracker can hold an `Arc<dyn PersistenceGateway>`
//! injected at startup.

use async_trait::async_trait;

use crate::error::PersistenceError;
use crate::profile::{ProfileUpdate, UserProfile};
use crate::session::{NewSession, Session};

pub use crate::storage::SqliteGateway;

/// How many sessions are fetched when loading history.
pub const DEFAULT_SESSION_QUERY_LIMIT: usize = 50;

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// `Ok(None)` when the user has no profile yet.
    async fn get_user_profile(&self, user_id: &str)
        -> Result<Option<UserProfile>, PersistenceError>;

    /// Create the profile unless one already exists.
    async fn create_user_profile(
        &self,
        user_id: &str,
        defaults: &UserProfile,
    ) -> Result<(), PersistenceError>;

    async fn update_user_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<(), PersistenceError>;

    /// Store a session and return its assigned id.
    async fn append_session(&self, session: &NewSession) -> Result<String, PersistenceError>;

    /// Newest sessions first, by start time.
    async fn query_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Session>, PersistenceError>;
}

/// Fetch the profile, creating it from `defaults` on first use.
pub async fn load_or_create_profile(
    gateway: &dyn PersistenceGateway,
    user_id: &str,
    defaults: &UserProfile,
) -> Result<UserProfile, PersistenceError> {
    if let Some(profile) = gateway.get_user_profile(user_id).await? {
        return Ok(profile);
    }
    tracing::info!(user_id, "creating user profile");
    gateway.create_user_profile(user_id, defaults).await?;
    Ok(defaults.clone())
}
