/// Feeds with at least this many consecutive parsing errors are reported as
/// failing in the navigation bar.
pub const MAX_PARSING_ERRORS: i32 = 3;

#[derive(Debug, Clone)]
pub struct NewFeed {
    pub title: String,
    pub feed_url: String,
    pub site_url: Option<String>,
}
