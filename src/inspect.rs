//! Offline inspection commands: `chunks` and `retrieve`.
//!
//! Neither touches the model endpoint. Both print a human listing by
//! default, or JSON with `--json` for scripting.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use intellibot_core::context::assemble;
use intellibot_core::models::Chunk;
use intellibot_core::search::{retrieve, ScoredChunk};

use crate::config::Config;
use crate::extract;

#[derive(Serialize)]
struct ChunksOutput<'a> {
    document: &'a str,
    hash: &'a str,
    chunk_size: usize,
    overlap: usize,
    chunks: &'a [Chunk],
}

#[derive(Serialize)]
struct RetrieveOutput<'a> {
    document: &'a str,
    query: &'a str,
    results: &'a [ScoredChunk<'a>],
    prompt: &'a str,
}

/// Print the segmentation of the document at `path`.
pub fn run_chunks(config: &Config, path: &Path, json: bool) -> Result<()> {
    let params = config.chunking_params()?;
    let document = extract::load_document(path)?;
    let collection = params.collect(&document);

    if json {
        let output = ChunksOutput {
            document: &collection.document_name,
            hash: &collection.hash,
            chunk_size: params.chunk_size(),
            overlap: params.overlap(),
            chunks: &collection.chunks,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} ({} chars, sha256 {}): {} chunks of {} with overlap {}",
        collection.document_name,
        document.char_len(),
        collection.short_hash(),
        collection.len(),
        params.chunk_size(),
        params.overlap()
    );
    println!();
    for chunk in &collection.chunks {
        println!("[chunk {}] chars {}..{}", chunk.index, chunk.start, chunk.end);
        println!("{}", chunk.text);
        println!();
    }
    Ok(())
}

/// Rank the chunks of `path` against `query` and show the assembled prompt.
pub fn run_retrieve(
    config: &Config,
    path: &Path,
    query: &str,
    top_k: Option<usize>,
    json: bool,
) -> Result<()> {
    let params = config.chunking_params()?;
    let k = config.top_k(top_k)?;
    let document = extract::load_document(path)?;
    let collection = params.collect(&document);

    let results: Vec<ScoredChunk<'_>> = retrieve(query, &collection.chunks, k)
        .into_iter()
        .filter(|s| s.score >= config.retrieval.min_score)
        .collect();
    let prompt = assemble(query, &results);

    if json {
        let output = RetrieveOutput {
            document: &collection.document_name,
            query,
            results: &results,
            prompt: &prompt,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
    }
    for (rank, scored) in results.iter().enumerate() {
        println!(
            "{}. [{:.4}] chunk {}",
            rank + 1,
            scored.score,
            scored.chunk.index
        );
        println!(
            "    excerpt: \"{}\"",
            scored.chunk.text.replace('\n', " ").trim()
        );
        println!();
    }

    println!("--- Prompt ---");
    println!("{}", prompt);
    Ok(())
}
