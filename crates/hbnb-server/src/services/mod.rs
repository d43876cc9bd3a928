//! Business logic services

pub mod passwords;

pub use passwords::{hash_password, seal_password};
