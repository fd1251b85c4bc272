use chrono::{DateTime, Utc};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize,
)]
#[sqlx(type_name = "entry_direction", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub entry_direction: SortDirection,
    pub theme: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub entry_direction: SortDirection,
    pub theme: String,
}

/// Third-party services an entry can be saved to.
#[derive(Debug, Clone, Default)]
pub struct Integrations {
    pub pinboard_enabled: bool,
    pub instapaper_enabled: bool,
    pub wallabag_enabled: bool,
    pub pocket_enabled: bool,
}

impl Integrations {
    pub fn has_save_entry(&self) -> bool {
        self.pinboard_enabled
            || self.instapaper_enabled
            || self.wallabag_enabled
            || self.pocket_enabled
    }
}
