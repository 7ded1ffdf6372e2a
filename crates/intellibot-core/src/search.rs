//! Lexical retrieval over the loaded document's chunks.
//!
//! A [`LexicalIndex`] is a TF-IDF vector space fitted over the chunk texts
//! plus the query, rebuilt for every query. Nothing is cached between
//! queries.
//!
//! # Weighting
//!
//! 1. Tokenize: lowercase, keep maximal runs of word characters
//!    (alphanumeric or `_`) that are at least two characters long.
//! 2. TF is the raw term count within one text.
//! 3. IDF is smoothed: `ln((1 + n) / (1 + df)) + 1`, where `n` counts the
//!    chunks plus the query pseudo-document.
//! 4. Vectors are L2-normalized, so cosine similarity is a dot product.
//!
//! # Ranking
//!
//! [`retrieve`] sorts by descending similarity, breaking ties by the lower
//! chunk index, then keeps the first `k`.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::Chunk;

/// Sparse vector: `(term id, weight)` pairs sorted by term id.
pub type SparseVector = Vec<(usize, f64)>;

/// A chunk paired with its similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a Chunk,
    /// Cosine similarity in `[0.0, 1.0]`.
    pub score: f64,
}

/// Ranked retrieval output, highest score first, at most `k` entries.
pub type RetrievalResult<'a> = Vec<ScoredChunk<'a>>;

/// Split text into lowercase terms of two or more word characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    lower
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().nth(1).is_some())
        .map(str::to_string)
        .collect()
}

/// TF-IDF vector space fitted over a set of texts.
#[derive(Debug, Clone)]
pub struct LexicalIndex {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    vectors: Vec<SparseVector>,
}

impl LexicalIndex {
    /// Fit the vocabulary and IDF weights over `texts` and vectorize each one.
    ///
    /// Vectors are returned in input order by [`vector`](Self::vector).
    pub fn fit<'a, I>(texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let tokenized: Vec<Vec<String>> = texts.into_iter().map(tokenize).collect();
        let n = tokenized.len();

        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut df: Vec<usize> = Vec::new();

        for tokens in &tokenized {
            let mut seen: Vec<usize> = Vec::new();
            for token in tokens {
                let next_id = vocabulary.len();
                let id = *vocabulary.entry(token.clone()).or_insert(next_id);
                if id == df.len() {
                    df.push(0);
                }
                if !seen.contains(&id) {
                    seen.push(id);
                    df[id] += 1;
                }
            }
        }

        let idf: Vec<f64> = df
            .iter()
            .map(|&d| ((1.0 + n as f64) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        let mut index = Self {
            vocabulary,
            idf,
            vectors: Vec::with_capacity(n),
        };
        let vectors = tokenized.iter().map(|tokens| index.weigh(tokens)).collect();
        index.vectors = vectors;
        index
    }

    /// Number of distinct terms in the fitted vocabulary.
    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// The normalized vector of the `i`-th fitted text.
    pub fn vector(&self, i: usize) -> Option<&SparseVector> {
        self.vectors.get(i)
    }

    fn weigh(&self, tokens: &[String]) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokens {
            if let Some(&id) = self.vocabulary.get(token) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }

        let mut vector: SparseVector = counts
            .into_iter()
            .map(|(id, tf)| (id, tf * self.idf[id]))
            .collect();
        vector.sort_by_key(|(id, _)| *id);

        let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in vector.iter_mut() {
                *w /= norm;
            }
        }
        vector
    }
}

/// Cosine similarity between two sparse vectors, clamped to `[0.0, 1.0]`.
///
/// Returns `0.0` if either vector has no terms.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }

    let mag_a = a.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    let mag_b = b.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if mag_a < f64::EPSILON || mag_b < f64::EPSILON {
        0.0
    } else {
        (dot / (mag_a * mag_b)).clamp(0.0, 1.0)
    }
}

/// Rank `chunks` by similarity to `query` and return the top `k`.
///
/// The query is fitted as an extra pseudo-document so its vocabulary is
/// represented. An empty chunk slice yields an empty result; a `k` larger
/// than the number of chunks returns all of them, ranked.
pub fn retrieve<'a>(query: &str, chunks: &'a [Chunk], k: usize) -> RetrievalResult<'a> {
    if chunks.is_empty() || k == 0 {
        return Vec::new();
    }

    let index = LexicalIndex::fit(
        chunks
            .iter()
            .map(|c| c.text.as_str())
            .chain(std::iter::once(query)),
    );
    let empty = SparseVector::new();
    let query_vec = index.vector(chunks.len()).unwrap_or(&empty);

    let mut scored: Vec<ScoredChunk<'a>> = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| ScoredChunk {
            chunk,
            score: index
                .vector(i)
                .map(|v| cosine_similarity(query_vec, v))
                .unwrap_or(0.0),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.chunk.index.cmp(&b.chunk.index))
    });
    scored.truncate(k);

    tracing::debug!(
        chunks = chunks.len(),
        vocabulary = index.vocabulary_len(),
        returned = scored.len(),
        top_score = scored.first().map(|s| s.score).unwrap_or(0.0),
        "lexical retrieval"
    );

    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks_of(texts: &[&str]) -> Vec<Chunk> {
        let mut start = 0;
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let c = Chunk::from_text(i, start, *t);
                start = c.end;
                c
            })
            .collect()
    }

    #[test]
    fn test_tokenize_drops_single_chars_and_punctuation() {
        assert_eq!(
            tokenize("A quick, QUICK fox_1 -- I am x!"),
            vec!["quick", "quick", "fox_1", "am"]
        );
    }

    #[test]
    fn test_tokenize_unicode() {
        assert_eq!(tokenize("Größe über"), vec!["größe", "über"]);
    }

    #[test]
    fn test_smoothed_idf() {
        // "alpha" appears in both texts, "beta" in one: n = 2.
        let index = LexicalIndex::fit(["alpha beta", "alpha"]);
        let v = index.vector(1).unwrap();
        assert_eq!(v.len(), 1);
        assert!((v[0].1 - 1.0).abs() < 1e-12);

        let v0 = index.vector(0).unwrap();
        let idf_alpha: f64 = 1.0;
        let idf_beta = (3.0f64 / 2.0).ln() + 1.0;
        let norm = (idf_alpha * idf_alpha + idf_beta * idf_beta).sqrt();
        assert!((v0[0].1 - idf_alpha / norm).abs() < 1e-12);
        assert!((v0[1].1 - idf_beta / norm).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_bounds() {
        let index = LexicalIndex::fit(["red green", "red green", "blue"]);
        let a = index.vector(0).unwrap();
        let b = index.vector(1).unwrap();
        let c = index.vector(2).unwrap();
        assert!((cosine_similarity(a, b) - 1.0).abs() < 1e-9);
        assert_eq!(cosine_similarity(a, c), 0.0);
        assert_eq!(cosine_similarity(a, &SparseVector::new()), 0.0);
    }

    #[test]
    fn test_retrieve_empty_chunks() {
        let result = retrieve("anything", &[], 3);
        assert!(result.is_empty());
    }

    #[test]
    fn test_retrieve_picks_only_matching_chunk() {
        let chunks = chunks_of(&["AAAA BBBB", "BBBB CCCC", "CCCC DDDD"]);
        let result = retrieve("DDDD", &chunks, 1);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].chunk.text, "CCCC DDDD");
        assert!(result[0].score > 0.0);
    }

    #[test]
    fn test_k_larger_than_collection_returns_all() {
        let chunks = chunks_of(&["one two", "three four"]);
        let result = retrieve("two", &chunks, 10);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].chunk.index, 0);
    }

    #[test]
    fn test_identical_vocabulary_scores_max() {
        let chunks = chunks_of(&[
            "rust borrow checker",
            "garbage collector pauses",
            "borrow checker rust",
            "checker",
        ]);
        let result = retrieve("rust borrow checker", &chunks, 4);
        let max = result.iter().map(|s| s.score).fold(0.0, f64::max);
        for s in result.iter().filter(|s| s.chunk.index == 0 || s.chunk.index == 2) {
            assert!((s.score - max).abs() < 1e-12);
            assert!((s.score - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_no_overlap_scores_zero() {
        let chunks = chunks_of(&["apples oranges", "pears plums"]);
        let result = retrieve("apples", &chunks, 2);
        assert_eq!(result[1].chunk.text, "pears plums");
        assert_eq!(result[1].score, 0.0);
    }

    #[test]
    fn test_sorted_with_index_tie_break() {
        let chunks = chunks_of(&[
            "nothing here",
            "deploy service",
            "other stuff",
            "deploy service",
            "deploy",
        ]);
        let result = retrieve("deploy service", &chunks, 5);
        for pair in result.windows(2) {
            assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                assert!(pair[0].chunk.index < pair[1].chunk.index);
            }
        }
        let order: Vec<usize> = result.iter().map(|s| s.chunk.index).collect();
        assert_eq!(order[..2], [1, 3]);
        assert_eq!(order[3..], [0, 2]);
    }

    #[test]
    fn test_query_without_terms_keeps_chunk_order() {
        let chunks = chunks_of(&["first chunk", "second chunk", "third chunk"]);
        let result = retrieve("?", &chunks, 2);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].chunk.index, 0);
        assert_eq!(result[1].chunk.index, 1);
        assert!(result.iter().all(|s| s.score == 0.0));
    }
}
