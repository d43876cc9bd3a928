//! HBnB Types - Pure type definitions for the HBnB object model
//!
//! This crate contains the six entity kinds, their JSON representation and
//! the rules for building and updating them from client payloads. It has no
//! runtime or storage dependencies.

pub mod entity;
pub mod kind;
pub mod payload;
pub mod timestamp;

pub use entity::*;
pub use kind::EntityKind;
pub use payload::{FieldSpec, FieldType, PayloadError};
