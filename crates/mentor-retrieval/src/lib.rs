//! Lexical retrieval for mentor.
//!
//! A [`Bm25Index`] is built once from a static corpus and is read-only
//! afterwards, so it can be shared across sessions behind an `Arc`.
//!
//! ```rust,ignore
//! let index = Bm25Index::build(demo_corpus(), Bm25Params::default())?;
//! for hit in index.query("BM25 检索", 4) {
//!     println!("{:.3} {}", hit.score, hit.document.title);
//! }
//! ```

mod corpus;
mod index;
mod tokenize;

pub use corpus::demo_corpus;
pub use index::{Bm25Index, Bm25Params, RetrievalResult, ScoredDocument};
pub use tokenize::tokenize;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A corpus entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            text: text.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Duplicate document id: {0}")]
    DuplicateDocument(String),
}
