mod show_search_page;
pub use show_search_page::show_search_page;
