//! # scitree-query
//!
//! Retrieval over the loaded corpus:
//! - [`RetrievalEngine`]: embed, score, filter, rank
//! - [`FilterChain`]: opt-in citation, date and keyword stages
//! - [`TemporalIntentAnalyzer`]: year filter and recency weight from a query
//! - [`RetrievedContext`]: prompt-ready context assembly

pub mod context;
pub mod engine;
pub mod filters;
pub mod intent;

pub use context::RetrievedContext;
pub use engine::{rank, RetrievalEngine, RetrieveOptions};
pub use filters::{
    CitationFilter, DateFilter, FilterChain, FilterContext, KeywordFilter, RelevanceFilter,
};
pub use intent::{is_temporal_query, TemporalIntent, TemporalIntentAnalyzer};
pub use scitree_index::QueryResult;
