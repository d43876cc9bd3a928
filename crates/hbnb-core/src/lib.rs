//! HBnB Core Library
//!
//! The storage port shared by every backend, the ordered object table it
//! returns, and the storage error type.

// Re-export pure types from hbnb-types
pub use hbnb_types::*;

pub mod error;
pub mod ports;
pub mod table;

pub use error::{Result, StorageError};
pub use ports::Storage;
pub use table::ObjectTable;
