//! # IntelliBot Core
//!
//! The retrieval-augmented context pipeline behind IntelliBot: document
//! segmentation, per-query TF-IDF retrieval, context assembly, and the
//! conversation session that talks to a language model.
//!
//! This crate contains no tokio, HTTP, or filesystem I/O. The model call is
//! reached through the [`session::ChatModel`] trait, which the application
//! crate implements over HTTP.
//!
//! ## Pipeline
//!
//! ```text
//! query ──▶ chunk::ChunkingParams::split ──▶ search::retrieve ──▶ context::assemble
//!                                                                     │
//!                    session::Session::turn ◀─────────────────────────┘
//!                              │
//!                              ▼
//!                       ChatModel::complete
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Documents, chunks, and chat messages |
//! | [`chunk`] | Fixed-size overlapping segmenter |
//! | [`search`] | TF-IDF lexical index and top-K retriever |
//! | [`context`] | Augmented prompt assembly |
//! | [`session`] | Conversation history and the model boundary |
//! | [`error`] | Error taxonomy |

pub mod chunk;
pub mod context;
pub mod error;
pub mod models;
pub mod search;
pub mod session;

pub use error::{ChatError, ModelError};
