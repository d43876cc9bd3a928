//! Ports implemented by the server's backends

pub mod storage;

pub use storage::Storage;
