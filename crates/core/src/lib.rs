//! Database-free domain logic for the folio persistence layer.
//!
//! - [`schema`] describes every persisted table: its writable columns, their
//!   kinds, the camelCase alias each column is also known by, and the
//!   fallback value used when a row carries neither name.
//! - [`normalize`] reconciles the two naming conventions in both directions.

pub mod error;
pub mod normalize;
pub mod schema;
pub mod types;
