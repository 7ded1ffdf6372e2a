//! Core data models for the retrieval pipeline and the conversation.
//!
//! A [`Document`] is segmented into a [`ChunkCollection`]; the conversation
//! is a sequence of [`Message`]s. All of these are immutable once built.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Plain text extracted from one ingested file.
#[derive(Debug, Clone)]
pub struct Document {
    /// Random UUID assigned at load time.
    pub id: String,
    /// Display name, usually the file name.
    pub name: String,
    /// Extracted text.
    pub text: String,
    /// SHA-256 of `text`, hex encoded.
    pub hash: String,
}

impl Document {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let hash = format!("{:x}", hasher.finalize());

        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            text,
            hash,
        }
    }

    /// Length in characters, the unit chunk sizes are measured in.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A contiguous segment of a document used as a retrieval unit.
///
/// `start..end` are character offsets into the document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Chunk {
    /// Build a chunk with explicit offsets derived from its text length.
    ///
    /// Useful for callers that already hold segmented text and only need
    /// a sequence index for tie-breaking.
    pub fn from_text(index: usize, start: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let end = start + text.chars().count();
        Self {
            index,
            start,
            end,
            text,
        }
    }

    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// The ordered chunks of the currently loaded document.
#[derive(Debug, Clone)]
pub struct ChunkCollection {
    pub document_id: String,
    pub document_name: String,
    /// Fingerprint of the source document, see [`Document::hash`].
    pub hash: String,
    pub chunks: Vec<Chunk>,
}

impl ChunkCollection {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// First twelve hex digits of the document hash, for display.
    pub fn short_hash(&self) -> &str {
        &self.hash[..self.hash.len().min(12)]
    }
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Capitalized label used in transcripts (`"User"`, `"Assistant"`).
    pub fn label(&self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single role-tagged chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
