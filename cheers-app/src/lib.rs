pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod port;

mod app_context;

pub use app_context::AppContext;
pub use config::AppConfig;
