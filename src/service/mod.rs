pub mod api;
pub mod caching;
pub mod news;
