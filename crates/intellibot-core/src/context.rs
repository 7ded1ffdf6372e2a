//! Augmented prompt assembly.

use crate::search::ScoredChunk;

/// Separator placed between retrieved chunks.
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Build the text sent to the model for one question.
///
/// With no retrieved chunks the query is returned verbatim. Otherwise the
/// chunks are joined in retrieval order (best first):
///
/// ```text
/// Context:
/// <chunk 1>
///
/// <chunk 2>
///
/// Question: <query>
/// ```
pub fn assemble(query: &str, retrieval: &[ScoredChunk<'_>]) -> String {
    if retrieval.is_empty() {
        return query.to_string();
    }

    let context = retrieval
        .iter()
        .map(|s| s.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CHUNK_SEPARATOR);

    format!("Context:\n{}\n\nQuestion: {}", context, query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;
    use crate::search::retrieve;

    #[test]
    fn test_empty_retrieval_passes_query_through() {
        assert_eq!(assemble("hello", &[]), "hello");
    }

    #[test]
    fn test_single_chunk_shape() {
        let chunks = vec![
            Chunk::from_text(0, 0, "AAAA BBBB"),
            Chunk::from_text(1, 5, "BBBB CCCC"),
            Chunk::from_text(2, 10, "CCCC DDDD"),
        ];
        let retrieval = retrieve("DDDD", &chunks, 1);
        assert_eq!(
            assemble("DDDD", &retrieval),
            "Context:\nCCCC DDDD\n\nQuestion: DDDD"
        );
    }

    #[test]
    fn test_chunks_joined_in_retrieval_order() {
        let a = Chunk::from_text(0, 0, "first");
        let b = Chunk::from_text(1, 5, "second");
        let retrieval = vec![
            ScoredChunk {
                chunk: &b,
                score: 0.9,
            },
            ScoredChunk {
                chunk: &a,
                score: 0.4,
            },
        ];
        assert_eq!(
            assemble("why?", &retrieval),
            "Context:\nsecond\n\nfirst\n\nQuestion: why?"
        );
    }
}
