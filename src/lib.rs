//! # intellibot
//!
//! A document-grounded chat assistant. Load a PDF or text file, ask
//! questions, and the relevant passages are pulled in as context for a
//! hosted chat model.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Document   │──▶│  Segmenter   │──▶│ TF-IDF index │
//! │  PDF / txt  │   │  (chunks)    │   │  + retrieve  │
//! └─────────────┘   └──────────────┘   └──────┬───────┘
//!                                             │ top-K chunks
//!                                             ▼
//!                   ┌──────────────┐   ┌──────────────┐
//!                   │   Session    │◀──│   Context    │
//!                   │  + history   │   │  assembler   │
//!                   └──────┬───────┘   └──────────────┘
//!                          ▼
//!                   ┌──────────────┐
//!                   │ Chat model   │
//!                   │ (HTTP API)   │
//!                   └──────────────┘
//! ```
//!
//! The pipeline itself lives in `intellibot-core`; this crate adds the
//! configuration, document extraction, the HTTP model client, transcript
//! export and the CLI.
//!
//! ## Quick Start
//!
//! ```bash
//! export HF_TOKEN=hf_...
//! intellibot ask "What is the refund window?" --document policy.pdf
//! intellibot chat --document policy.pdf
//! intellibot retrieve policy.pdf "refund window" --top-k 5
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | Tracing subscriber setup |
//! | [`extract`] | PDF / plain-text extraction |
//! | [`llm`] | HTTP chat-completion client |
//! | [`export`] | TXT / PDF transcripts |
//! | [`chat`] | `ask` command and the chat REPL |
//! | [`inspect`] | `chunks` and `retrieve` commands |

pub mod chat;
pub mod config;
pub mod export;
pub mod extract;
pub mod inspect;
pub mod llm;
pub mod logging;
