use chrono::{DateTime, Utc};

use crate::db::SortDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "entry_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Unread,
    Read,
    Removed,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Unread => "unread",
            EntryStatus::Read => "read",
            EntryStatus::Removed => "removed",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Entry {
    pub id: String,
    pub user_id: String,
    pub feed_id: String,
    pub title: String,
    pub url: String,
    pub comments_url: Option<String>,
    pub author: Option<String>,
    pub content: String,
    pub status: EntryStatus,
    pub starred: bool,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub changed_at: Option<DateTime<Utc>>,
    pub feed: EntryFeed,
}

impl Entry {
    pub fn is_unread(&self) -> bool {
        self.status == EntryStatus::Unread
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct EntryFeed {
    pub id: String,
    pub title: String,
    pub site_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEntry {
    pub title: String,
    pub url: String,
    pub comments_url: Option<String>,
    pub author: Option<String>,
    pub content: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct EntryNeighbor {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct EntryNeighbors {
    pub prev: Option<EntryNeighbor>,
    pub next: Option<EntryNeighbor>,
}

/// Conditions for selecting a user's entries.
///
/// Every condition is optional except the owner; an empty search query
/// matches everything.
#[derive(Debug, Clone)]
pub struct EntryQuery {
    pub user_id: String,
    pub entry_id: Option<String>,
    pub search_query: Option<String>,
    pub status: Option<EntryStatus>,
    pub without_status: Option<EntryStatus>,
    pub direction: SortDirection,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl EntryQuery {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_owned(),
            entry_id: None,
            search_query: None,
            status: None,
            without_status: None,
            direction: SortDirection::default(),
            limit: None,
            offset: None,
        }
    }

    pub fn with_search_query(mut self, query: &str) -> Self {
        self.search_query = normalize_search_query(query);
        self
    }

    pub fn with_entry_id(mut self, entry_id: &str) -> Self {
        self.entry_id = Some(entry_id.to_owned());
        self
    }

    pub fn with_status(mut self, status: EntryStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn without_status(mut self, status: EntryStatus) -> Self {
        self.without_status = Some(status);
        self
    }

    pub fn with_direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Locates the entries right before and after `entry_id` in the user's
/// visible entries, ordered by `(published_at, id)` in `direction`.
///
/// Removed entries never take part in navigation.
#[derive(Debug, Clone)]
pub struct EntryPagination {
    pub user_id: String,
    pub entry_id: String,
    pub direction: SortDirection,
    pub search_query: Option<String>,
}

impl EntryPagination {
    pub fn new(user_id: &str, entry_id: &str, direction: SortDirection) -> Self {
        Self {
            user_id: user_id.to_owned(),
            entry_id: entry_id.to_owned(),
            direction,
            search_query: None,
        }
    }

    pub fn with_search_query(mut self, query: &str) -> Self {
        self.search_query = normalize_search_query(query);
        self
    }
}

fn normalize_search_query(query: &str) -> Option<String> {
    let query = query.trim();
    if query.is_empty() {
        None
    } else {
        Some(query.to_owned())
    }
}
