//! Conversation session and the language-model boundary.
//!
//! A [`Session`] owns everything one conversation needs: the append-only
//! history, the optional chunk collection of the loaded document, and the
//! retrieval settings. Callers pass it by `&mut` into every turn; there is
//! no global state.
//!
//! # Turn
//!
//! ```text
//! user text ──▶ appended as the user message
//!                      │
//!                      ▼
//!   [system] + window(history) + [user: augmented] ──▶ ChatModel
//!                                                           │
//!              reply appended as assistant message ◀────────┘
//! ```
//!
//! The request carries the whole history, including the question just
//! recorded, followed by the augmented form of that question. The history
//! only ever records what the user typed and what the model answered.
//! Retrieved context lives in the outbound request alone.
//!
//! If the model call fails, the user message stays in the history and the
//! error reports `recorded: true`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::chunk::ChunkingParams;
use crate::context::assemble;
use crate::error::{ChatError, ModelError, Result};
use crate::models::{ChunkCollection, Document, Message};
use crate::search::retrieve;

/// System instruction sent at the head of every request.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
/// Number of chunks retrieved per question.
pub const DEFAULT_TOP_K: usize = 3;

/// A language model that turns a message list into one assistant reply.
///
/// Implementations own transport concerns: timeouts, retries and backoff
/// belong here, never in the session.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, for logs.
    fn name(&self) -> &str;

    /// Send the ordered messages and return the assistant's reply text.
    async fn complete(&self, messages: &[Message]) -> std::result::Result<String, ModelError>;
}

/// How much history is sent with each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryWindow {
    /// The complete conversation.
    #[default]
    All,
    /// Only the most recent `n` messages.
    Last(usize),
}

impl HistoryWindow {
    pub fn apply<'a>(&self, history: &'a [Message]) -> &'a [Message] {
        match self {
            HistoryWindow::All => history,
            HistoryWindow::Last(n) => &history[history.len().saturating_sub(*n)..],
        }
    }
}

/// Settings fixed for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub system_prompt: String,
    pub chunking: ChunkingParams,
    pub top_k: usize,
    /// Retrieved chunks scoring below this are dropped from the context.
    pub min_score: f64,
    pub window: HistoryWindow,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            chunking: ChunkingParams::default(),
            top_k: DEFAULT_TOP_K,
            min_score: 0.0,
            window: HistoryWindow::All,
        }
    }
}

/// One conversation with at most one loaded document.
#[derive(Debug, Clone)]
pub struct Session {
    options: SessionOptions,
    history: Vec<Message>,
    document: Option<Arc<ChunkCollection>>,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            history: Vec::new(),
            document: None,
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Start a new conversation that keeps the loaded document.
    pub fn restart(&self) -> Self {
        Self {
            options: self.options.clone(),
            history: Vec::new(),
            document: self.document.clone(),
        }
    }

    /// Segment `document` and make it the live chunk collection.
    ///
    /// Any previously loaded collection is dropped wholesale.
    pub fn load_document(&mut self, document: &Document) -> Arc<ChunkCollection> {
        let collection = Arc::new(self.options.chunking.collect(document));
        tracing::info!(
            document = %collection.document_name,
            hash = %collection.short_hash(),
            chunks = collection.len(),
            replaced = self.document.is_some(),
            "document loaded"
        );
        self.document = Some(Arc::clone(&collection));
        collection
    }

    /// Forget the loaded document, returning it if there was one.
    pub fn unload_document(&mut self) -> Option<Arc<ChunkCollection>> {
        self.document.take()
    }

    pub fn document(&self) -> Option<&ChunkCollection> {
        self.document.as_deref()
    }

    /// The live collection as a shareable snapshot.
    ///
    /// A retrieval that holds the snapshot is unaffected by a later reload.
    pub fn snapshot(&self) -> Option<Arc<ChunkCollection>> {
        self.document.clone()
    }

    pub fn append(&mut self, message: Message) {
        self.history.push(message);
    }

    /// The conversation so far, oldest first.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Retrieve context for `query` and build the text sent to the model.
    ///
    /// Without a loaded document, or when nothing clears `min_score`, this
    /// is `query` itself.
    pub fn augment(&self, query: &str) -> String {
        let Some(snapshot) = self.snapshot() else {
            return query.to_string();
        };

        let retrieval: Vec<_> = retrieve(query, &snapshot.chunks, self.options.top_k)
            .into_iter()
            .filter(|s| s.score >= self.options.min_score)
            .collect();
        assemble(query, &retrieval)
    }

    /// Run one exchange with the model.
    ///
    /// Records `user_text` in the history, sends `augmented_text` in its
    /// place, and records the reply. Returns the reply text.
    pub async fn turn<M>(&mut self, model: &M, user_text: &str, augmented_text: &str) -> Result<String>
    where
        M: ChatModel + ?Sized,
    {
        self.history.push(Message::user(user_text));
        let request = self.build_request(augmented_text);

        tracing::debug!(
            model = model.name(),
            messages = request.len(),
            augmented = augmented_text != user_text,
            "sending turn"
        );

        match model.complete(&request).await {
            Ok(reply) => {
                self.history.push(Message::assistant(reply.clone()));
                Ok(reply)
            }
            Err(source) => {
                tracing::warn!(model = model.name(), error = %source, "model call failed; user message kept");
                Err(ChatError::Endpoint {
                    recorded: true,
                    source,
                })
            }
        }
    }

    /// Retrieve, assemble, and run a turn for `query`.
    pub async fn ask<M>(&mut self, model: &M, query: &str) -> Result<String>
    where
        M: ChatModel + ?Sized,
    {
        let augmented = self.augment(query);
        self.turn(model, query, &augmented).await
    }

    fn build_request(&self, augmented_text: &str) -> Vec<Message> {
        let history = self.options.window.apply(&self.history);
        let mut request = Vec::with_capacity(history.len() + 2);
        request.push(Message::system(self.options.system_prompt.clone()));
        request.extend_from_slice(history);
        request.push(Message::user(augmented_text));
        request
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}
