pub mod academics;
pub mod auth;
pub mod core;
pub mod resources;
