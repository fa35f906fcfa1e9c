//! Okapi BM25 over an in-memory corpus.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use mentor_config::RetrievalSettings;
use serde::Serialize;
use tracing::debug;

use crate::tokenize::tokenize;
use crate::{Document, RetrievalError};

/// BM25 tuning constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Length normalization, 0 (none) to 1 (full).
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

impl From<&RetrievalSettings> for Bm25Params {
    fn from(settings: &RetrievalSettings) -> Self {
        Self { k1: settings.k1, b: settings.b }
    }
}

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f64,
}

/// Hits ordered by score, highest first.
pub type RetrievalResult = Vec<ScoredDocument>;

#[derive(Debug)]
struct IndexedDocument {
    document: Document,
    term_freqs: HashMap<String, u32>,
    length: usize,
}

/// Read-only BM25 index.
#[derive(Debug)]
pub struct Bm25Index {
    docs: Vec<IndexedDocument>,
    /// Token -> number of documents containing it
    doc_freqs: HashMap<String, usize>,
    avg_doc_length: f64,
    params: Bm25Params,
}

impl Bm25Index {
    /// Indexes the corpus. Title and text are both searchable.
    pub fn build(corpus: Vec<Document>, params: Bm25Params) -> Result<Self, RetrievalError> {
        let mut seen = HashSet::new();
        let mut docs = Vec::with_capacity(corpus.len());
        let mut doc_freqs: HashMap<String, usize> = HashMap::new();

        for document in corpus {
            if !seen.insert(document.id.clone()) {
                return Err(RetrievalError::DuplicateDocument(document.id));
            }

            let tokens = tokenize(&format!("{} {}", document.title, document.text));
            let mut term_freqs: HashMap<String, u32> = HashMap::new();
            for token in &tokens {
                *term_freqs.entry(token.clone()).or_insert(0) += 1;
            }
            for token in term_freqs.keys() {
                *doc_freqs.entry(token.clone()).or_insert(0) += 1;
            }

            docs.push(IndexedDocument {
                document,
                term_freqs,
                length: tokens.len(),
            });
        }

        let total: usize = docs.iter().map(|d| d.length).sum();
        let avg_doc_length = if docs.is_empty() { 0.0 } else { total as f64 / docs.len() as f64 };

        debug!("Indexed {} documents, {} distinct terms", docs.len(), doc_freqs.len());

        Ok(Self { docs, doc_freqs, avg_doc_length, params })
    }

    /// Returns the top `min(k, len)` documents for `text`.
    ///
    /// A query without any terms yields nothing. Otherwise every document
    /// is ranked, including those scoring zero; ties keep corpus order.
    pub fn query(&self, text: &str, k: usize) -> RetrievalResult {
        let query_tokens = tokenize(text);
        if query_tokens.is_empty() || k == 0 {
            return Vec::new();
        }

        let idfs: Vec<(&str, f64)> = query_tokens
            .iter()
            .map(|t| (t.as_str(), self.idf(t)))
            .collect();

        let mut scored: Vec<(usize, f64)> = self
            .docs
            .iter()
            .enumerate()
            .map(|(i, doc)| (i, self.score(doc, &idfs)))
            .collect();

        // Stable sort keeps corpus order among equal scores.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, score)| ScoredDocument {
                document: self.docs[i].document.clone(),
                score,
            })
            .collect()
    }

    fn idf(&self, token: &str) -> f64 {
        let n = self.doc_freqs.get(token).copied().unwrap_or(0) as f64;
        let total = self.docs.len() as f64;
        (1.0 + (total - n + 0.5) / (n + 0.5)).ln()
    }

    fn score(&self, doc: &IndexedDocument, idfs: &[(&str, f64)]) -> f64 {
        let Bm25Params { k1, b } = self.params;
        let norm = 1.0 - b + b * (doc.length as f64 / self.avg_doc_length.max(1.0));

        idfs.iter()
            .map(|(token, idf)| {
                let tf = doc.term_freqs.get(*token).copied().unwrap_or(0) as f64;
                idf * (tf * (k1 + 1.0)) / (tf + k1 * norm)
            })
            .sum()
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.docs.iter().map(|d| &d.document)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo_corpus;

    fn demo_index() -> Bm25Index {
        Bm25Index::build(demo_corpus(), Bm25Params::default()).unwrap()
    }

    #[test]
    fn results_are_bounded_and_sorted() {
        let index = demo_index();
        let hits = index.query("BM25 向量检索", 3);
        assert_eq!(hits.len(), 3);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(hits[0].document.title, "检索实现");
    }

    #[test]
    fn small_corpus_returns_everything() {
        let corpus = vec![
            Document::new("a", "Memory 模块", "ConversationBufferMemory 保存对话"),
            Document::new("b", "Tool 模块", "Tool 让模型调用外部函数"),
        ];
        let index = Bm25Index::build(corpus, Bm25Params::default()).unwrap();
        let hits = index.query("tool 模块", 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.id, "b");
    }

    #[test]
    fn empty_query_returns_nothing() {
        let index = demo_index();
        assert!(index.query("", 4).is_empty());
        assert!(index.query("？？ ,", 4).is_empty());
    }

    #[test]
    fn zero_scores_keep_corpus_order() {
        let index = demo_index();
        let hits = index.query("zzzz", 8);
        assert_eq!(hits.len(), 8);
        assert!(hits.iter().all(|h| h.score == 0.0));
        let ids: Vec<&str> = hits.iter().map(|h| h.document.id.as_str()).collect();
        let corpus_ids: Vec<String> = demo_corpus().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, corpus_ids);
    }

    #[test]
    fn repeated_queries_are_identical() {
        let index = demo_index();
        let first = index.query("LangGraph 检索 生成", 4);
        for _ in 0..10 {
            assert_eq!(index.query("LangGraph 检索 生成", 4), first);
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let corpus = vec![Document::new("x", "a", "b"), Document::new("x", "c", "d")];
        let err = Bm25Index::build(corpus, Bm25Params::default()).unwrap_err();
        assert!(matches!(err, RetrievalError::DuplicateDocument(ref id) if id == "x"));
    }

    #[test]
    fn empty_corpus_is_allowed() {
        let index = Bm25Index::build(Vec::new(), Bm25Params::default()).unwrap();
        assert!(index.is_empty());
        assert!(index.query("anything", 4).is_empty());
    }

    #[test]
    fn params_follow_settings() {
        let settings = RetrievalSettings { k1: 1.2, b: 0.5, ..RetrievalSettings::default() };
        assert_eq!(Bm25Params::from(&settings), Bm25Params { k1: 1.2, b: 0.5 });
    }
}
