//! Bulk CSV import pipeline for the OppHub opportunities directory.
//!
//! Flow: CSV text is decoded (`csv`), capped and validated per row
//! (`pipeline`, `validate`), and valid rows are upserted one at a time into
//! the document store (`persist`, `store`). Templates for the three entity
//! kinds come from `template`.

pub mod config;
pub mod csv;
pub mod model;
pub mod persist;
pub mod pipeline;
pub mod store;
pub mod template;
pub mod validate;
