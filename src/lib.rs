//! # antiplag
//!
//! A text-document storage and analysis system with exact-duplicate
//! ("plagiarism") detection.
//!
//! Uploaded `.txt` files are stored content-addressed: identical bytes map
//! to one document id and one physical copy. The analysis side computes
//! paragraph, word, and character counts, looks up a byte-identical earlier
//! document, renders an optional word cloud, and caches the result per
//! document.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────────┐   ┌───────────────────┐
//! │ CLI / HTTP   │──▶│ StorageEngine  │──▶│ file_metadata     │
//! │ (antiplag)   │   │ hash + compare │   │ + upload dir      │
//! └──────┬───────┘   └───────▲────────┘   └───────────────────┘
//!        │                   │ in-process or RemoteStorage
//!        │           ┌───────┴────────┐   ┌───────────────────┐
//!        └──────────▶│ AnalysisEngine │──▶│ analysis_metadata │
//!                    │ stats + cloud  │   │ + wordcloud dir   │
//!                    └────────────────┘   └───────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! antiplag init
//! antiplag upload essay.txt
//! antiplag duplicate 1
//! antiplag analyze 1
//! antiplag serve all
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | SQLite catalog and analysis cache |
//! | [`blob`] | Filesystem blob store |
//! | [`storage`] | Content-addressed storage engine |
//! | [`remote`] | HTTP client for a remote storage service |
//! | [`wordcloud`] | Word-cloud renderers and artifact writer |
//! | [`analysis`] | Cached analysis pipeline |
//! | [`services`] | Engine wiring from config |
//! | [`server`] | Storage and analysis HTTP servers |
//! | [`stats`] | Catalog statistics |
//! | [`cli`] | CLI command implementations |

pub mod analysis;
pub mod blob;
pub mod cli;
pub mod config;
pub mod db;
pub mod migrate;
pub mod remote;
pub mod server;
pub mod services;
pub mod sqlite_store;
pub mod stats;
pub mod storage;
pub mod wordcloud;
