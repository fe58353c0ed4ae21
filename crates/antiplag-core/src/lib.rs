//! # antiplag core
//!
//! Runtime-agnostic logic shared by the storage and analysis services:
//! data models, the error taxonomy, content hashing, text statistics, and
//! the persistence traits the engines are written against.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or HTTP
//! dependencies. Native backends live in the `antiplag` crate; the
//! [`store::memory`] backends here are used by tests.

pub mod error;
pub mod hash;
pub mod models;
pub mod outcome;
pub mod source;
pub mod stats;
pub mod store;

pub use error::{Error, Result};
pub use models::{AnalysisRecord, DocumentId, DocumentRecord, NewDocument, StoredFile, TextStats};
pub use outcome::Outcome;
