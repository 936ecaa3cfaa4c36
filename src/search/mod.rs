//! Evidence retrieval.
//!
//! A search provider turns a query string into an ordered list of short
//! text snippets. It owns no ranking logic; the resolution engine treats
//! the list as an unordered bag of evidence.

pub mod duckduckgo;

pub use duckduckgo::DuckDuckGoProvider;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single unit of retrieved evidence text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snippet {
    /// Title of the search result
    pub title: String,
    /// URL of the search result
    pub url: String,
    /// Descriptive body text; the evidence compared against answers
    pub description: String,
}

/// Errors from the evidence backend.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The search request failed or the provider answered with an error
    #[error("Search request failed: HTTP {status}: {message}")]
    Http {
        /// HTTP status code (0 when the request never completed)
        status: u16,
        message: String,
    },

    /// The search request timed out
    #[error("Search request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The provider's response could not be parsed
    #[error("Unparseable search response: {0}")]
    Unparseable(String),
}

/// Capability: query string and page count in, ordered snippets out.
///
/// Any provider exposing "string query → list of short text snippets"
/// satisfies this contract. The caller passes a negation-stripped query;
/// the provider performs no text transformation of its own.
pub trait SearchProvider {
    fn search(&self, query: &str, pages: u32) -> Result<Vec<Snippet>, RetrievalError>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}
