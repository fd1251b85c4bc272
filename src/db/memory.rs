//! In-memory `DataI` used by tests that should not need a running Postgres.
//!
//! Mirrors the semantics of the Postgres queries: case-insensitive substring
//! search on title and content, `(published_at, id)` ordering, removed
//! entries hidden from navigation.

use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::Utc;

use super::{
    Data, DataI, Entry, EntryFeed, EntryNeighbor, EntryNeighbors, EntryPagination, EntryQuery,
    EntryStatus, FlashKind, FlashMessages, Integrations, MAX_PARSING_ERRORS, NewEntry, NewFeed,
    NewUser, Session, SortDirection, User, create_id, create_token,
};

#[derive(Default)]
pub struct MemData {
    state: Mutex<MemState>,
}

#[derive(Default)]
struct MemState {
    users: HashMap<String, User>,
    feeds: HashMap<String, MemFeed>,
    entries: Vec<Entry>,
    integrations: HashMap<String, Integrations>,
    sessions: HashMap<String, MemSession>,
}

struct MemFeed {
    user_id: String,
    title: String,
    site_url: Option<String>,
    parsing_error_count: i32,
}

struct MemSession {
    session: Session,
    flash: FlashMessages,
}

pub fn new_mem_data() -> Data {
    Arc::new(MemData::default())
}

impl MemData {
    fn state(&self) -> std::sync::MutexGuard<'_, MemState> {
        self.state.lock().expect("memory data lock")
    }
}

fn matches_search(entry: &Entry, search_query: Option<&str>) -> bool {
    let Some(search_query) = search_query else {
        return true;
    };

    let needle = search_query.to_lowercase();
    entry.title.to_lowercase().contains(&needle) || entry.content.to_lowercase().contains(&needle)
}

fn matches_query(entry: &Entry, query: &EntryQuery) -> bool {
    entry.user_id == query.user_id
        && query.entry_id.as_ref().is_none_or(|id| &entry.id == id)
        && query.status.is_none_or(|status| entry.status == status)
        && query.without_status.is_none_or(|status| entry.status != status)
        && matches_search(entry, query.search_query.as_deref())
}

fn compare_entries(a: &Entry, b: &Entry, direction: SortDirection) -> Ordering {
    let ordering = a
        .published_at
        .cmp(&b.published_at)
        .then_with(|| a.id.cmp(&b.id));

    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

#[async_trait]
impl DataI for MemData {
    async fn create_user(&self, user: &NewUser) -> Result<User, sqlx::Error> {
        let user = User {
            id: create_id(),
            username: user.username.clone(),
            entry_direction: user.entry_direction,
            theme: user.theme.clone(),
            created_at: Utc::now(),
        };

        self.state().users.insert(user.id.clone(), user.clone());

        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(self.state().users.get(user_id).cloned())
    }

    async fn create_feed(&self, user_id: &str, feed: &NewFeed) -> Result<String, sqlx::Error> {
        let id = create_id();

        self.state().feeds.insert(
            id.clone(),
            MemFeed {
                user_id: user_id.to_owned(),
                title: feed.title.clone(),
                site_url: feed.site_url.clone(),
                parsing_error_count: 0,
            },
        );

        Ok(id)
    }

    async fn set_feed_parsing_error(
        &self,
        feed_id: &str,
        error: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        if let Some(feed) = self.state().feeds.get_mut(feed_id) {
            match error {
                Some(_) => feed.parsing_error_count += 1,
                None => feed.parsing_error_count = 0,
            }
        }

        Ok(())
    }

    async fn insert_entries(
        &self,
        user_id: &str,
        feed_id: &str,
        entries: Vec<NewEntry>,
    ) -> Result<Vec<String>, anyhow::Error> {
        let mut state = self.state();

        let feed = state
            .feeds
            .get(feed_id)
            .ok_or_else(|| anyhow::anyhow!("feed {feed_id} does not exist"))?;

        let entry_feed = EntryFeed {
            id: feed_id.to_owned(),
            title: feed.title.clone(),
            site_url: feed.site_url.clone(),
        };

        let mut ids = vec![];
        for entry in entries {
            let exists = state
                .entries
                .iter()
                .any(|e| e.feed_id == feed_id && e.url == entry.url);
            if exists {
                continue;
            }

            let id = create_id();
            state.entries.push(Entry {
                id: id.clone(),
                user_id: user_id.to_owned(),
                feed_id: feed_id.to_owned(),
                title: entry.title,
                url: entry.url,
                comments_url: entry.comments_url,
                author: entry.author,
                content: entry.content,
                status: EntryStatus::Unread,
                starred: false,
                published_at: entry.published_at,
                created_at: Utc::now(),
                changed_at: None,
                feed: entry_feed.clone(),
            });
            ids.push(id);
        }

        Ok(ids)
    }

    async fn get_entry(&self, query: &EntryQuery) -> Result<Option<Entry>, sqlx::Error> {
        Ok(self
            .state()
            .entries
            .iter()
            .find(|entry| matches_query(entry, query))
            .cloned())
    }

    async fn get_entries(&self, query: &EntryQuery) -> Result<Vec<Entry>, sqlx::Error> {
        let mut entries: Vec<Entry> = self
            .state()
            .entries
            .iter()
            .filter(|entry| matches_query(entry, query))
            .cloned()
            .collect();

        entries.sort_by(|a, b| compare_entries(a, b, query.direction));

        let offset = query.offset.unwrap_or(0).max(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |limit| limit.max(0) as usize);

        Ok(entries.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_entries(&self, query: &EntryQuery) -> Result<i64, sqlx::Error> {
        Ok(self
            .state()
            .entries
            .iter()
            .filter(|entry| matches_query(entry, query))
            .count() as i64)
    }

    async fn set_entries_status(
        &self,
        user_id: &str,
        entry_ids: &[String],
        status: EntryStatus,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now();

        for entry in self.state().entries.iter_mut() {
            if entry.user_id == user_id && entry_ids.contains(&entry.id) {
                entry.status = status;
                entry.changed_at = Some(now);
            }
        }

        Ok(())
    }

    async fn toggle_bookmark(
        &self,
        user_id: &str,
        entry_id: &str,
    ) -> Result<Option<bool>, sqlx::Error> {
        let mut state = self.state();

        let entry = state.entries.iter_mut().find(|entry| {
            entry.user_id == user_id && entry.id == entry_id && entry.status != EntryStatus::Removed
        });

        Ok(entry.map(|entry| {
            entry.starred = !entry.starred;
            entry.changed_at = Some(Utc::now());
            entry.starred
        }))
    }

    async fn get_entry_neighbors(
        &self,
        pagination: &EntryPagination,
    ) -> Result<EntryNeighbors, sqlx::Error> {
        let state = self.state();

        let mut entries: Vec<&Entry> = state
            .entries
            .iter()
            .filter(|entry| {
                entry.user_id == pagination.user_id
                    && entry.status != EntryStatus::Removed
                    && matches_search(entry, pagination.search_query.as_deref())
            })
            .collect();

        entries.sort_by(|a, b| compare_entries(a, b, pagination.direction));

        let Some(position) = entries
            .iter()
            .position(|entry| entry.id == pagination.entry_id)
        else {
            return Ok(EntryNeighbors::default());
        };

        let neighbor = |entry: &Entry| EntryNeighbor {
            id: entry.id.clone(),
            title: entry.title.clone(),
        };

        Ok(EntryNeighbors {
            prev: position
                .checked_sub(1)
                .and_then(|i| entries.get(i))
                .map(|entry| neighbor(entry)),
            next: entries.get(position + 1).map(|entry| neighbor(entry)),
        })
    }

    async fn count_unread_entries(&self, user_id: &str) -> Result<i64, sqlx::Error> {
        Ok(self
            .state()
            .entries
            .iter()
            .filter(|entry| entry.user_id == user_id && entry.status == EntryStatus::Unread)
            .count() as i64)
    }

    async fn count_error_feeds(&self, user_id: &str) -> Result<i64, sqlx::Error> {
        Ok(self
            .state()
            .feeds
            .values()
            .filter(|feed| {
                feed.user_id == user_id && feed.parsing_error_count >= MAX_PARSING_ERRORS
            })
            .count() as i64)
    }

    async fn has_save_entry(&self, user_id: &str) -> Result<bool, sqlx::Error> {
        Ok(self
            .state()
            .integrations
            .get(user_id)
            .is_some_and(Integrations::has_save_entry))
    }

    async fn set_integrations(
        &self,
        user_id: &str,
        integrations: &Integrations,
    ) -> Result<(), sqlx::Error> {
        self.state()
            .integrations
            .insert(user_id.to_owned(), integrations.clone());

        Ok(())
    }

    async fn create_session(&self, user_id: Option<&str>) -> Result<Session, sqlx::Error> {
        let session = Session {
            id: create_token(),
            user_id: user_id.map(str::to_owned),
            csrf_token: create_token(),
        };

        self.state().sessions.insert(
            session.id.clone(),
            MemSession {
                session: session.clone(),
                flash: FlashMessages::default(),
            },
        );

        Ok(session)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, sqlx::Error> {
        Ok(self
            .state()
            .sessions
            .get(session_id)
            .map(|s| s.session.clone()))
    }

    async fn set_flash_message(
        &self,
        session_id: &str,
        kind: FlashKind,
        message: &str,
    ) -> Result<(), sqlx::Error> {
        if let Some(session) = self.state().sessions.get_mut(session_id) {
            match kind {
                FlashKind::Info => session.flash.message = Some(message.to_owned()),
                FlashKind::Error => session.flash.error_message = Some(message.to_owned()),
            }
        }

        Ok(())
    }

    async fn take_flash_messages(&self, session_id: &str) -> Result<FlashMessages, sqlx::Error> {
        Ok(self
            .state()
            .sessions
            .get_mut(session_id)
            .map(|session| std::mem::take(&mut session.flash))
            .unwrap_or_default())
    }
}
