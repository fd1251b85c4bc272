use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

mod entries;
pub use entries::*;

mod feeds;
pub use feeds::*;

mod users;
pub use users::*;

mod sessions;
pub use sessions::*;

mod id;
pub use id::*;

mod pg;

#[cfg(test)]
pub mod memory;


pub type Data = Arc<dyn DataI>;

pub async fn new_data(database_url: &str) -> Result<Data> {
    pg::new_pg_data(database_url).await
}

#[async_trait]
pub trait DataI: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> Result<User, sqlx::Error>;

    async fn get_user_by_id(&self, user_id: &str) -> Result<Option<User>, sqlx::Error>;

    async fn create_feed(&self, user_id: &str, feed: &NewFeed) -> Result<String, sqlx::Error>;

    /// `Some` bumps the feed's parsing error count, `None` clears it.
    async fn set_feed_parsing_error(
        &self,
        feed_id: &str,
        error: Option<&str>,
    ) -> Result<(), sqlx::Error>;

    /// Entries whose url already exists in the feed are skipped.
    async fn insert_entries(
        &self,
        user_id: &str,
        feed_id: &str,
        entries: Vec<NewEntry>,
    ) -> Result<Vec<String>, anyhow::Error>;

    async fn get_entry(&self, query: &EntryQuery) -> Result<Option<Entry>, sqlx::Error>;

    async fn get_entries(&self, query: &EntryQuery) -> Result<Vec<Entry>, sqlx::Error>;

    async fn count_entries(&self, query: &EntryQuery) -> Result<i64, sqlx::Error>;

    async fn set_entries_status(
        &self,
        user_id: &str,
        entry_ids: &[String],
        status: EntryStatus,
    ) -> Result<(), sqlx::Error>;

    /// Returns the new starred flag, or `None` if the user has no such entry.
    async fn toggle_bookmark(
        &self,
        user_id: &str,
        entry_id: &str,
    ) -> Result<Option<bool>, sqlx::Error>;

    async fn get_entry_neighbors(
        &self,
        pagination: &EntryPagination,
    ) -> Result<EntryNeighbors, sqlx::Error>;

    async fn count_unread_entries(&self, user_id: &str) -> Result<i64, sqlx::Error>;

    async fn count_error_feeds(&self, user_id: &str) -> Result<i64, sqlx::Error>;

    async fn has_save_entry(&self, user_id: &str) -> Result<bool, sqlx::Error>;

    async fn set_integrations(
        &self,
        user_id: &str,
        integrations: &Integrations,
    ) -> Result<(), sqlx::Error>;

    async fn create_session(&self, user_id: Option<&str>) -> Result<Session, sqlx::Error>;

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, sqlx::Error>;

    async fn set_flash_message(
        &self,
        session_id: &str,
        kind: FlashKind,
        message: &str,
    ) -> Result<(), sqlx::Error>;

    /// Flash messages are shown once: reading them clears them.
    async fn take_flash_messages(&self, session_id: &str) -> Result<FlashMessages, sqlx::Error>;
}
