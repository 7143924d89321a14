//! Data Transfer Objects (DTOs).
//!
//! The wire objects themselves live in `hanashi_shared::protocol` so the
//! client decodes exactly what the server encodes; this module only holds the
//! conversions from domain entities.

pub mod conversion;
