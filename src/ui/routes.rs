use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Everything but RFC 3986 unreserved characters.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub const SEARCH: &str = "/search";
pub const SEARCH_ENTRY: &str = "/search/entry/{entry_id}";
pub const UPDATE_ENTRIES_STATUS: &str = "/entry/status";
pub const TOGGLE_BOOKMARK: &str = "/entry/bookmark/{entry_id}";
pub const STATIC: &str = "/static";
pub const HEALTH: &str = "/health";

/// Named routes of the UI, resolved to paths under the configured base path.
#[derive(Debug, Clone, Copy)]
pub enum Route<'a> {
    Search,
    SearchEntry { entry_id: &'a str },
    UpdateEntriesStatus,
    ToggleBookmark { entry_id: &'a str },
    Static { file: &'a str },
}

impl Route<'_> {
    pub fn path(&self, base_path: &str) -> String {
        match self {
            Route::Search => format!("{base_path}{SEARCH}"),
            Route::SearchEntry { entry_id } => {
                format!("{base_path}/search/entry/{}", encode_segment(entry_id))
            }
            Route::UpdateEntriesStatus => format!("{base_path}{UPDATE_ENTRIES_STATUS}"),
            Route::ToggleBookmark { entry_id } => {
                format!("{base_path}/entry/bookmark/{}", encode_segment(entry_id))
            }
            Route::Static { file } => format!("{base_path}{STATIC}/{}", encode_segment(file)),
        }
    }
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, COMPONENT).to_string()
}

/// `?q=<query>` to keep navigation in search mode, or "" without a query.
pub fn search_query_string(search_query: &str) -> String {
    let search_query = search_query.trim();
    if search_query.is_empty() {
        return String::new();
    }

    format!("?q={}", utf8_percent_encode(search_query, COMPONENT))
}

pub fn search_page_url(base_path: &str, search_query: &str, offset: i64) -> String {
    let path = Route::Search.path(base_path);
    let query_string = search_query_string(search_query);

    match (query_string.is_empty(), offset) {
        (true, 0) => path,
        (true, offset) => format!("{path}?offset={offset}"),
        (false, 0) => format!("{path}{query_string}"),
        (false, offset) => format!("{path}{query_string}&offset={offset}"),
    }
}
