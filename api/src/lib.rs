pub mod auth;
pub mod cache;
pub mod config;
pub mod dto;
pub mod errors;
pub mod feed;
pub mod forms;
pub mod media;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod states;
pub mod store;

pub use config::Config;
pub use routes::router;
pub use states::AppState;
