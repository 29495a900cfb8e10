pub mod concurrency;
pub mod config;
pub mod grades;
pub mod http;
pub mod store;
