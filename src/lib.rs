//! Library crate for kopipe-scan exposing reusable modules.
pub mod classify;
pub mod codes;
pub mod fetch;
pub mod hub;
pub mod scanner;
pub mod server;
pub mod types;
