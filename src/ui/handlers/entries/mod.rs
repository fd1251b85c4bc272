mod show_search_entry;
pub use show_search_entry::show_search_entry;

mod update_entries_status;
pub use update_entries_status::update_entries_status;

mod toggle_bookmark;
pub use toggle_bookmark::toggle_bookmark;
