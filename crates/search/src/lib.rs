//! Fuzzy file and folder name search over the roots a caller may read.
//!
//! A name qualifies when every query token reaches the similarity threshold against it
//! (best of full and partial InDel ratio); its score is the mean over the tokens.

mod engine;
mod error;
mod fuzzy;

pub use engine::{search_roots, HitKind, SearchEngine, SearchHit};
pub use error::{Result, SearchError};
pub use fuzzy::{match_score, partial_ratio, query_tokens, ratio, NameMatcher, MATCH_THRESHOLD};
