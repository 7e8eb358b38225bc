pub mod auth;
pub mod catalog;
pub mod error;
pub mod handlers;
pub mod resource;
pub mod router;
pub mod types;

pub use router::{build_router, serve};
pub use types::AppState;
