//! Academic records service: administrative accounts plus REST access to
//! students, teachers, course units, enrolments and scores over SQLite.

pub mod config;
pub mod db;
pub mod http;

pub use config::Config;
