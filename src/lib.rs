pub mod api;
pub mod filter;
pub mod models;
pub mod settings;
pub mod store;
pub mod validate;
