pub mod backend;
pub mod config;
pub mod draft;
pub mod error;
pub mod field;
pub mod optimistic;
pub mod profile;
pub mod render;
pub mod schema;
pub mod session;
pub mod switcher;
pub mod toast;
pub mod validation;
