pub mod access;
pub mod app;
pub mod auth;
pub mod characters;
pub mod config;
pub mod error;
pub mod http;
pub mod reviews;
pub mod sitcoms;
pub mod state;
pub mod store;
pub mod validate;

pub use app::build_app;
pub use error::AppError;
pub use state::AppState;
