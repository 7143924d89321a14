//! Infrastructure layer: concrete implementations of the domain interfaces.
//!
//! - `presence`: presence registry
//! - `repository`: message and user stores
//! - `dto`: conversion between domain entities and wire objects

pub mod dto;
pub mod presence;
pub mod repository;
